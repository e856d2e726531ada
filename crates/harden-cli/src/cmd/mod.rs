pub mod apply;
pub mod catalog;
pub mod config;
pub mod log;
pub mod plan;
pub mod undo;

use anyhow::Context;
use clap::Args;
use harden_core::{
    config::Config,
    paths,
    record::ChangeRecorder,
    types::RoleFlags,
    windows::{RegistryStore, ScController},
};
use std::path::{Path, PathBuf};

/// Role switches. At least one is required.
#[derive(Args, Debug)]
#[group(required = true, multiple = true)]
pub struct RoleArgs {
    /// Apply the member server policy
    #[arg(long)]
    pub member_server: bool,

    /// Apply the domain controller policy
    #[arg(long)]
    pub domain_controller: bool,

    /// Apply the print server policy
    #[arg(long)]
    pub print_server: bool,
}

impl RoleArgs {
    pub fn flags(&self) -> RoleFlags {
        RoleFlags {
            member_server: self.member_server,
            domain_controller: self.domain_controller,
            print_server: self.print_server,
        }
    }
}

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Record every change to an audit log usable with `harden undo`
    #[arg(long)]
    pub log: bool,

    /// Audit log path (implies --log; default: <host>_ServiceHardening_<date>.log)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl LogArgs {
    /// The recorder to use, or `None` when logging is off.
    pub fn recorder(&self, config: &Config) -> Option<ChangeRecorder> {
        if !self.log && self.log_file.is_none() {
            return None;
        }
        let path = self.log_file.clone().unwrap_or_else(|| {
            paths::default_log_path(
                config.log_dir.as_deref(),
                &paths::hostname(),
                chrono::Local::now().date_naive(),
            )
        });
        Some(ChangeRecorder::new(path))
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = Config::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    for w in config.validate() {
        tracing::warn!(level = ?w.level, "{}", w.message);
    }
    Ok(config)
}

/// Locate `sc.exe` and `reg.exe`.
pub fn open_host() -> anyhow::Result<(ScController, RegistryStore)> {
    let controller = ScController::locate().context("cannot reach the service manager")?;
    let store = RegistryStore::locate().context("cannot reach the registry")?;
    Ok((controller, store))
}
