//! Sequential application of a directive list.
//!
//! Every directive is probed, mutated, probed again and (when a recorder is
//! configured) recorded. Per-service failures are folded into the outcome and
//! the run moves on to the next directive. Only audit log I/O stops a run.

use crate::config::Config;
use crate::error::{HardenError, Result};
use crate::mutator::{Mechanism, Mutator};
use crate::record::{ChangeRecord, ChangeRecorder};
use crate::types::{RoleFlags, ServiceDirective, ServiceState};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Changed,
    Unchanged,
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Changed => "changed",
            OutcomeStatus::Unchanged => "unchanged",
            OutcomeStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectiveOutcome {
    pub directive: ServiceDirective,
    pub status: OutcomeStatus,
    pub before: Option<ServiceState>,
    pub after: Option<ServiceState>,
    pub stop_attempted: bool,
    pub mechanism: Option<Mechanism>,
    /// Absorbed errors, rendered for display.
    pub errors: Vec<String>,
}

impl DirectiveOutcome {
    fn not_found(directive: &ServiceDirective, err: &HardenError) -> Self {
        Self {
            directive: directive.clone(),
            status: OutcomeStatus::Failed,
            before: None,
            after: None,
            stop_attempted: false,
            mechanism: None,
            errors: vec![err.to_string()],
        }
    }

    pub fn to_record(&self) -> ChangeRecord {
        ChangeRecord::new(
            self.directive.service_id.clone(),
            self.before.as_ref().map(|s| s.startup_mode),
            self.after.as_ref().map(|s| s.startup_mode),
        )
    }
}

/// A log row or directive that was never applied.
#[derive(Debug, Clone, Serialize)]
pub struct Skipped {
    pub line: Option<usize>,
    pub service_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<DirectiveOutcome>,
    pub skipped: Vec<Skipped>,
}

impl RunReport {
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// "3 changed, 40 unchanged, 1 failed, 0 skipped"
    pub fn summary(&self) -> String {
        format!(
            "{} changed, {} unchanged, {} failed, {} skipped",
            self.count(OutcomeStatus::Changed),
            self.count(OutcomeStatus::Unchanged),
            self.count(OutcomeStatus::Failed),
            self.skipped.len()
        )
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<'a> {
    mutator: Mutator<'a>,
    recorder: Option<ChangeRecorder>,
}

impl<'a> Orchestrator<'a> {
    /// `recorder` is `None` when logging is disabled.
    pub fn new(mutator: Mutator<'a>, recorder: Option<ChangeRecorder>) -> Self {
        Self { mutator, recorder }
    }

    pub fn recorder(&self) -> Option<&ChangeRecorder> {
        self.recorder.as_ref()
    }

    /// Resolve the directives for `flags` under `config` and apply them.
    pub fn run(&self, flags: RoleFlags, config: &Config) -> Result<RunReport> {
        let directives = config.directives_for(flags);
        tracing::info!(roles = ?flags.roles(), count = directives.len(), "applying service policy");
        self.apply_all(&directives)
    }

    pub fn apply_all(&self, directives: &[ServiceDirective]) -> Result<RunReport> {
        let mut report = RunReport::default();
        for directive in directives {
            report.outcomes.push(self.apply_one(directive)?);
        }
        Ok(report)
    }

    /// Apply and record a single directive. Errors only on audit log I/O.
    pub fn apply_one(&self, directive: &ServiceDirective) -> Result<DirectiveOutcome> {
        let outcome = match self.mutator.apply(directive) {
            Ok(t) => {
                let mut errors = Vec::new();
                if let Some(e) = &t.stop_error {
                    errors.push(e.to_string());
                }
                let status = if let Some(e) = &t.mode_error {
                    errors.push(e.to_string());
                    OutcomeStatus::Failed
                } else if t.after.is_none() {
                    OutcomeStatus::Failed
                } else if t.changed() {
                    OutcomeStatus::Changed
                } else {
                    OutcomeStatus::Unchanged
                };
                DirectiveOutcome {
                    directive: directive.clone(),
                    status,
                    stop_attempted: t.stop_attempted,
                    mechanism: t.mechanism,
                    before: Some(t.before),
                    after: t.after,
                    errors,
                }
            }
            Err(e) => {
                tracing::warn!(service = %directive.service_id, error = %e, "skipping service");
                DirectiveOutcome::not_found(directive, &e)
            }
        };

        tracing::debug!(
            service = %directive.service_id,
            target = %directive.target,
            status = outcome.status.as_str(),
            "directive applied"
        );

        if let Some(recorder) = &self.recorder {
            recorder.record(&outcome.to_record())?;
        }
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
