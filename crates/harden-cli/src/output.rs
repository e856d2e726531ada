use harden_core::orchestrator::{DirectiveOutcome, RunReport};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    // Calculate column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").trim_end());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

fn outcome_row(o: &DirectiveOutcome) -> Vec<String> {
    let mode = |s: &Option<harden_core::types::ServiceState>| {
        s.as_ref()
            .map(|s| s.startup_mode.to_string())
            .unwrap_or_else(|| harden_core::record::UNKNOWN_MODE.to_string())
    };
    vec![
        o.directive.service_id.clone(),
        o.directive.target.to_string(),
        mode(&o.before),
        mode(&o.after),
        o.status.as_str().to_string(),
        o.errors.join("; "),
    ]
}

/// Render a run report as a table plus summary, or as JSON.
pub fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(report);
    }

    if report.outcomes.is_empty() {
        println!("No services processed.");
    } else {
        let rows = report.outcomes.iter().map(outcome_row).collect();
        print_table(&["SERVICE", "TARGET", "BEFORE", "AFTER", "STATUS", "NOTE"], rows);
    }

    if !report.skipped.is_empty() {
        println!("\nSkipped:");
        for s in &report.skipped {
            let location = match (&s.line, &s.service_id) {
                (Some(line), _) => format!("line {line}"),
                (None, Some(id)) => id.clone(),
                (None, None) => "-".to_string(),
            };
            println!("  {location} — {}", s.reason);
        }
    }

    println!("\n{}", report.summary());
    Ok(())
}
