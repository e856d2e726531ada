use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "harden.yaml";
pub const LOG_SUFFIX: &str = "ServiceHardening";

/// Host name used in default log file names.
///
/// `COMPUTERNAME` on Windows, `HOSTNAME` elsewhere, `localhost` otherwise.
pub fn hostname() -> String {
    ["COMPUTERNAME", "HOSTNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// `<host>_ServiceHardening_<YYYY-MM-DD>.log`
pub fn default_log_file_name(host: &str, date: NaiveDate) -> String {
    format!("{host}_{LOG_SUFFIX}_{}.log", date.format("%Y-%m-%d"))
}

pub fn default_log_path(log_dir: Option<&Path>, host: &str, date: NaiveDate) -> PathBuf {
    let name = default_log_file_name(host, date);
    match log_dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}
