use super::{load_config, open_host, LogArgs, RoleArgs};
use crate::output::print_report;
use harden_core::{mutator::Mutator, orchestrator::Orchestrator};
use std::path::Path;

pub fn run(config_path: &Path, roles: &RoleArgs, log: &LogArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (controller, store) = open_host()?;

    let orchestrator = Orchestrator::new(Mutator::new(&controller, &store), log.recorder(&config));
    let report = orchestrator.run(roles.flags(), &config)?;

    print_report(&report, json)?;
    if let (Some(recorder), false) = (orchestrator.recorder(), json) {
        println!("Audit log: {}", recorder.path().display());
    }
    Ok(())
}
