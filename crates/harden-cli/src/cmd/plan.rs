use super::{load_config, RoleArgs};
use crate::output::{print_json, print_table};
use anyhow::Context;
use harden_core::{plan, windows::ScController};
use std::path::Path;

pub fn run(config_path: &Path, roles: &RoleArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let controller = ScController::locate().context("cannot reach the service manager")?;
    let planned = plan::plan(&controller, &config.directives_for(roles.flags()));

    if json {
        return print_json(&planned);
    }

    let rows: Vec<Vec<String>> = planned
        .iter()
        .map(|p| {
            let (status, mode) = match &p.current {
                Some(s) => (s.status.to_string(), s.startup_mode.to_string()),
                None => ("-".to_string(), "-".to_string()),
            };
            let action = match (&p.error, p.would_stop, p.would_change) {
                (Some(e), _, _) => format!("skip: {e}"),
                (None, true, true) => "stop, reconfigure".to_string(),
                (None, false, true) => "reconfigure".to_string(),
                (None, true, false) => "stop".to_string(),
                (None, false, false) => "none".to_string(),
            };
            vec![
                p.directive.service_id.clone(),
                status,
                mode,
                p.directive.target.to_string(),
                action,
            ]
        })
        .collect();
    print_table(&["SERVICE", "STATUS", "CURRENT", "TARGET", "ACTION"], rows);

    let changes = planned.iter().filter(|p| p.would_change).count();
    println!("\n{changes} of {} services would be reconfigured", planned.len());
    Ok(())
}
