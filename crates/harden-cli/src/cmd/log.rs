use crate::output::{print_json, print_table};
use clap::Subcommand;
use harden_core::{record::UNKNOWN_MODE, types::StartupMode, undo};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum LogSubcommand {
    /// Print the records of an audit log, as `harden undo` would read them
    Show { path: PathBuf },
}

pub fn run(subcmd: LogSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        LogSubcommand::Show { path } => show(&path, json),
    }
}

fn show(path: &std::path::Path, json: bool) -> anyhow::Result<()> {
    let log = undo::read_log(path)?;

    if json {
        return print_json(&log);
    }

    let mode = |m: Option<StartupMode>| m.map(|m| m.to_string()).unwrap_or_else(|| UNKNOWN_MODE.to_string());
    let rows: Vec<Vec<String>> = log
        .records
        .iter()
        .map(|r| {
            vec![
                r.timestamp.to_rfc3339(),
                r.service_id.clone(),
                mode(r.before),
                mode(r.after),
                r.schema_version.to_string(),
            ]
        })
        .collect();
    print_table(&["TIMESTAMP", "SERVICE", "BEFORE", "AFTER", "SCHEMA"], rows);

    if !log.rejected.is_empty() {
        println!("\nUnreadable rows:");
        for r in &log.rejected {
            println!("  line {} — {}", r.line, r.reason);
        }
    }
    Ok(())
}
