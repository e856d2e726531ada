use super::{load_config, open_host, LogArgs};
use crate::output::print_report;
use anyhow::Context;
use harden_core::{mutator::Mutator, orchestrator::Orchestrator, undo};
use std::path::Path;

pub fn run(config_path: &Path, undo_log: &Path, log: &LogArgs, json: bool) -> anyhow::Result<()> {
    // Fail on a missing log before touching the service manager.
    let parsed = undo::read_log(undo_log)?;
    if parsed.records.is_empty() {
        tracing::warn!(path = %undo_log.display(), "undo log has no records");
    }

    let config = load_config(config_path)?;
    let (controller, store) = open_host()?;
    let orchestrator = Orchestrator::new(Mutator::new(&controller, &store), log.recorder(&config));

    let report = undo::replay(&parsed, &orchestrator)
        .with_context(|| format!("undo from {} failed", undo_log.display()))?;

    print_report(&report, json)?;
    if let (Some(recorder), false) = (orchestrator.recorder(), json) {
        println!("Audit log: {}", recorder.path().display());
    }
    Ok(())
}
