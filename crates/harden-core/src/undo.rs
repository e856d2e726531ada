//! Replay an audit log to restore the startup modes it recorded.
//!
//! Each record's `before` mode becomes a directive applied through the same
//! orchestrator path as a forward run. Records replay oldest first and
//! independently, so when a service appears several times the last record
//! decides its final mode. Runtime status is not restored.

use crate::error::{HardenError, Result};
use crate::orchestrator::{Orchestrator, RunReport, Skipped};
use crate::record::{self, ChangeRecord};
use crate::types::ServiceDirective;
use serde::Serialize;
use std::path::Path;

/// A row of the log that could not be parsed.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: String,
}

/// Parsed contents of an audit log, in file order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UndoLog {
    pub records: Vec<ChangeRecord>,
    pub rejected: Vec<RejectedRow>,
}

/// Read and parse the log at `path`. Header and blank lines are skipped;
/// unparseable rows are collected in `rejected`.
pub fn read_log(path: &Path) -> Result<UndoLog> {
    if !path.exists() {
        return Err(HardenError::UndoLogNotFound(path.to_path_buf()));
    }
    let data = std::fs::read_to_string(path)?;
    let mut log = UndoLog::default();

    for (idx, line) in data.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() || record::is_header(line) {
            continue;
        }
        match ChangeRecord::parse_line(line, line_no) {
            Ok(r) => log.records.push(r),
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "ignoring unreadable log row");
                log.rejected.push(RejectedRow {
                    line: line_no,
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(log)
}

/// Restore every service in the log at `path` to its recorded `before` mode.
///
/// A missing log fails with `UndoLogNotFound` before any service is touched.
pub fn undo(path: &Path, orchestrator: &Orchestrator<'_>) -> Result<RunReport> {
    let log = read_log(path)?;
    tracing::info!(path = %path.display(), "replaying undo log");
    replay(&log, orchestrator)
}

/// Replay an already parsed log. Rejected rows are carried into the report's
/// skipped list.
pub fn replay(log: &UndoLog, orchestrator: &Orchestrator<'_>) -> Result<RunReport> {
    tracing::debug!(
        records = log.records.len(),
        rejected = log.rejected.len(),
        "replaying records"
    );

    let mut report = RunReport::default();
    report.skipped.extend(log.rejected.iter().map(|r| Skipped {
        line: Some(r.line),
        service_id: None,
        reason: r.reason.clone(),
    }));

    for r in &log.records {
        let Some(mode) = r.before else {
            tracing::warn!(service = %r.service_id, "no recorded startup mode to restore");
            report.skipped.push(Skipped {
                line: None,
                service_id: Some(r.service_id.clone()),
                reason: "startup mode before change was not recorded".to_string(),
            });
            continue;
        };
        let directive = ServiceDirective::new(r.service_id.clone(), mode);
        report.outcomes.push(orchestrator.apply_one(&directive)?);
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryHost;
    use crate::mutator::Mutator;
    use crate::orchestrator::OutcomeStatus;
    use crate::record::{ChangeRecorder, HEADER};
    use crate::types::{RuntimeStatus, StartupMode};
    use tempfile::TempDir;

    #[test]
    fn forward_then_undo_restores_startup_mode() {
        let host =
            InMemoryHost::new().with_service("Spooler", RuntimeStatus::Running, StartupMode::Automatic);
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("forward.log");

        let forward = Orchestrator::new(
            Mutator::new(&host, &host),
            Some(ChangeRecorder::new(&log_path)),
        );
        forward
            .apply_one(&ServiceDirective::new("Spooler", StartupMode::Disabled))
            .unwrap();
        assert_eq!(host.state("Spooler").unwrap().startup_mode, StartupMode::Disabled);

        let reverse = Orchestrator::new(Mutator::new(&host, &host), None);
        let report = undo(&log_path, &reverse).unwrap();
        assert_eq!(report.count(OutcomeStatus::Changed), 1);
        let state = host.state("Spooler").unwrap();
        assert_eq!(state.startup_mode, StartupMode::Automatic);
        // Runtime status is not restored.
        assert_eq!(state.status, RuntimeStatus::Stopped);
    }

    #[test]
    fn service_name_with_comma_survives_round_trip() {
        let host = InMemoryHost::new().with_service(
            "Acme,Agent",
            RuntimeStatus::Running,
            StartupMode::Automatic,
        );
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("forward.log");

        let forward = Orchestrator::new(
            Mutator::new(&host, &host),
            Some(ChangeRecorder::new(&log_path)),
        );
        forward
            .apply_one(&ServiceDirective::new("Acme,Agent", StartupMode::Disabled))
            .unwrap();

        let reverse = Orchestrator::new(Mutator::new(&host, &host), None);
        let report = undo(&log_path, &reverse).unwrap();
        assert!(report.skipped.is_empty(), "{:?}", report.skipped);
        assert_eq!(report.count(OutcomeStatus::Changed), 1);
        assert_eq!(
            host.state("Acme,Agent").unwrap().startup_mode,
            StartupMode::Automatic
        );
    }

    #[test]
    fn header_with_byte_order_mark_is_not_a_rejected_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bom.log");
        std::fs::write(
            &path,
            format!("\u{feff}{HEADER}\r\n2024-01-01T00:00:00Z,Spooler,Automatic,Disabled,2\r\n"),
        )
        .unwrap();
        let log = read_log(&path).unwrap();
        assert!(log.rejected.is_empty(), "{:?}", log.rejected);
        assert_eq!(log.records.len(), 1);
    }

    #[test]
    fn replay_uses_the_parsed_log() {
        let host =
            InMemoryHost::new().with_service("A", RuntimeStatus::Stopped, StartupMode::Disabled);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forward.log");
        std::fs::write(&path, "2024-01-01T00:00:00Z,A,Manual,Disabled,2\nbroken\n").unwrap();

        let log = read_log(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let orch = Orchestrator::new(Mutator::new(&host, &host), None);
        let report = replay(&log, &orch).unwrap();
        assert_eq!(report.count(OutcomeStatus::Changed), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, Some(2));
        assert_eq!(host.state("A").unwrap().startup_mode, StartupMode::Manual);
    }

    #[test]
    fn last_record_for_a_service_wins() {
        let host =
            InMemoryHost::new().with_service("lfsvc", RuntimeStatus::Stopped, StartupMode::Automatic);
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("repeat.log");
        std::fs::write(
            &log_path,
            format!(
                "{HEADER}\n\
                 2024-01-01T00:00:00Z,lfsvc,Manual,Disabled,2\n\
                 2024-02-01T00:00:00Z,lfsvc,Disabled,Disabled,2\n"
            ),
        )
        .unwrap();

        let orch = Orchestrator::new(Mutator::new(&host, &host), None);
        let report = undo(&log_path, &orch).unwrap();
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(host.state("lfsvc").unwrap().startup_mode, StartupMode::Disabled);
    }

    #[test]
    fn missing_log_touches_nothing() {
        let host =
            InMemoryHost::new().with_service("Spooler", RuntimeStatus::Running, StartupMode::Automatic);
        let dir = TempDir::new().unwrap();
        let orch = Orchestrator::new(Mutator::new(&host, &host), None);

        let err = undo(&dir.path().join("missing.log"), &orch).unwrap_err();
        assert!(matches!(err, HardenError::UndoLogNotFound(_)));
        assert_eq!(host.stop_calls(), 0);
        assert_eq!(host.mode_writes(), 0);
        assert_eq!(host.state("Spooler").unwrap().status, RuntimeStatus::Running);
    }

    #[test]
    fn bad_rows_and_unknown_modes_are_skipped() {
        let host = InMemoryHost::new()
            .with_service("A", RuntimeStatus::Stopped, StartupMode::Disabled)
            .with_service("B", RuntimeStatus::Stopped, StartupMode::Disabled);
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("mixed.log");
        std::fs::write(
            &log_path,
            format!(
                "{HEADER}\n\
                 2024-01-01T00:00:00Z,A,Sometimes,Disabled,2\n\
                 2024-01-01T00:00:01Z,Ghost,Unknown,Unknown,2\n\
                 \n\
                 2024-01-01T00:00:02Z,B,Manual,Disabled,2\n"
            ),
        )
        .unwrap();

        let orch = Orchestrator::new(Mutator::new(&host, &host), None);
        let report = undo(&log_path, &orch).unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].line, Some(2));
        assert_eq!(host.state("A").unwrap().startup_mode, StartupMode::Disabled);
        assert_eq!(host.state("B").unwrap().startup_mode, StartupMode::Manual);
    }

    #[test]
    fn undo_can_log_its_own_changes() {
        let host =
            InMemoryHost::new().with_service("A", RuntimeStatus::Stopped, StartupMode::Disabled);
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("forward.log");
        std::fs::write(
            &log_path,
            "2024-01-01T00:00:00Z,A,Automatic,Disabled,2\n",
        )
        .unwrap();
        let undo_log = dir.path().join("undo.log");
        let orch = Orchestrator::new(
            Mutator::new(&host, &host),
            Some(ChangeRecorder::new(&undo_log)),
        );

        undo(&log_path, &orch).unwrap();
        let parsed = read_log(&undo_log).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].before, Some(StartupMode::Disabled));
        assert_eq!(parsed.records[0].after, Some(StartupMode::Automatic));
    }

    #[test]
    fn read_log_accepts_legacy_logs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.log");
        std::fs::write(
            &path,
            "\"DateString\",\"ServiceName\",\"StartTypeBeforeChange\",\"StartTypeAfterChange\"\r\n\
             \"2023-11-02T08:15:30\",\"bthserv\",\"Manual\",\"Disabled\"\r\n",
        )
        .unwrap();
        let log = read_log(&path).unwrap();
        assert_eq!(log.records.len(), 1);
        assert!(log.rejected.is_empty());
    }
}
