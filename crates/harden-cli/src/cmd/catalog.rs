use super::{load_config, RoleArgs};
use crate::output::{print_json, print_table};
use std::path::Path;

pub fn run(config_path: &Path, roles: &RoleArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let directives = config.directives_for(roles.flags());

    if json {
        return print_json(&directives);
    }

    let rows: Vec<Vec<String>> = directives
        .iter()
        .map(|d| vec![d.service_id.clone(), d.target.to_string()])
        .collect();
    print_table(&["SERVICE", "TARGET"], rows);
    println!("\n{} directives", directives.len());
    Ok(())
}
