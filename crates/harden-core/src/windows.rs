//! Windows backends driven through `sc.exe` and `reg.exe`.
//!
//! `ScController` covers the service manager. `RegistryStore` writes the
//! `Start` value under the service's key for modes `sc` is not used for.

use crate::error::{HardenError, Result};
use crate::host::{ConfigStore, ServiceController};
use crate::types::{RuntimeStatus, StartupMode};
use regex::Regex;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::OnceLock;

/// Win32 `ERROR_SERVICE_DOES_NOT_EXIST`.
const ERROR_SERVICE_DOES_NOT_EXIST: i32 = 1060;

pub const SERVICES_KEY: &str = r"HKLM\SYSTEM\CurrentControlSet\Services";

pub fn service_key(service_id: &str) -> String {
    format!(r"{SERVICES_KEY}\{service_id}")
}

fn locate(tool: &str) -> Result<PathBuf> {
    which::which(tool).map_err(|_| HardenError::ToolNotFound(tool.to_string()))
}

fn first_line(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no output")
        .to_string()
}

// ---------------------------------------------------------------------------
// sc.exe output parsing
// ---------------------------------------------------------------------------

static STATE_RE: OnceLock<Regex> = OnceLock::new();
static START_TYPE_RE: OnceLock<Regex> = OnceLock::new();

fn state_re() -> &'static Regex {
    STATE_RE.get_or_init(|| Regex::new(r"(?m)^\s*STATE\s*:\s*(\d+)").unwrap())
}

fn start_type_re() -> &'static Regex {
    START_TYPE_RE.get_or_init(|| Regex::new(r"(?m)^\s*START_TYPE\s*:\s*(\d+)").unwrap())
}

/// Map the `STATE` line of `sc query` to a runtime status.
pub fn parse_state(output: &str) -> Result<RuntimeStatus> {
    let code = state_re()
        .captures(output)
        .and_then(|c| c[1].parse::<u32>().ok())
        .ok_or_else(|| HardenError::CommandFailed {
            command: "sc query".to_string(),
            message: "no STATE line in output".to_string(),
        })?;
    Ok(match code {
        1 => RuntimeStatus::Stopped,
        4 => RuntimeStatus::Running,
        _ => RuntimeStatus::Other,
    })
}

/// Map the `START_TYPE` line of `sc qc` to a startup mode.
pub fn parse_start_type(output: &str) -> Result<StartupMode> {
    let caps = start_type_re()
        .captures(output)
        .ok_or_else(|| HardenError::CommandFailed {
            command: "sc qc".to_string(),
            message: "no START_TYPE line in output".to_string(),
        })?;
    caps[1].parse()
}

// ---------------------------------------------------------------------------
// ScController
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScController {
    program: PathBuf,
}

impl ScController {
    pub fn locate() -> Result<Self> {
        Ok(Self {
            program: locate("sc.exe")?,
        })
    }

    fn run(&self, service_id: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.program).args(args).output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }
        if output.status.code() == Some(ERROR_SERVICE_DOES_NOT_EXIST)
            || stdout.contains("FAILED 1060")
        {
            return Err(HardenError::ServiceNotFound(service_id.to_string()));
        }
        Err(HardenError::CommandFailed {
            command: format!("sc {}", args.join(" ")),
            message: first_line(&output),
        })
    }

    fn sc_start_token(mode: StartupMode) -> Option<&'static str> {
        match mode {
            StartupMode::Automatic => Some("auto"),
            StartupMode::Manual => Some("demand"),
            StartupMode::Disabled => Some("disabled"),
            StartupMode::Boot | StartupMode::System => None,
        }
    }
}

impl ServiceController for ScController {
    fn status(&self, service_id: &str) -> Result<RuntimeStatus> {
        parse_state(&self.run(service_id, &["query", service_id])?)
    }

    fn startup_mode(&self, service_id: &str) -> Result<StartupMode> {
        parse_start_type(&self.run(service_id, &["qc", service_id])?)
    }

    fn stop(&self, service_id: &str) -> Result<()> {
        self.run(service_id, &["stop", service_id])
            .map(|_| ())
            .map_err(|e| match e {
                e @ HardenError::ServiceNotFound(_) => e,
                other => HardenError::StopFailed {
                    service: service_id.to_string(),
                    reason: other.to_string(),
                },
            })
    }

    fn supports(&self, mode: StartupMode) -> bool {
        Self::sc_start_token(mode).is_some()
    }

    fn set_startup_mode(&self, service_id: &str, mode: StartupMode) -> Result<()> {
        let token = Self::sc_start_token(mode)
            .ok_or_else(|| HardenError::InvalidModeString(mode.to_string()))?;
        self.run(service_id, &["config", service_id, "start=", token])
            .map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// RegistryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RegistryStore {
    program: PathBuf,
}

impl RegistryStore {
    pub fn locate() -> Result<Self> {
        Ok(Self {
            program: locate("reg.exe")?,
        })
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Ok(Command::new(&self.program).args(args).output()?)
    }
}

impl ConfigStore for RegistryStore {
    fn write_start_value(&self, service_id: &str, value: u32) -> Result<()> {
        let key = service_key(service_id);

        // `reg add` would create the key, so refuse ids without one.
        let query = self.run(&["query", &key, "/v", "Start"])?;
        if !query.status.success() {
            return Err(HardenError::ServiceNotFound(service_id.to_string()));
        }

        let data = value.to_string();
        let output = self.run(&[
            "add", &key, "/v", "Start", "/t", "REG_DWORD", "/d", &data, "/f",
        ])?;
        if !output.status.success() {
            return Err(HardenError::CommandFailed {
                command: format!("reg add {key} /v Start"),
                message: first_line(&output),
            });
        }
        tracing::debug!(service = service_id, value, "wrote Start value");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
