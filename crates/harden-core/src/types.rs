use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// StartupMode
// ---------------------------------------------------------------------------

/// Persisted startup configuration of a service.
///
/// The discriminants are the values stored in the service's `Start` registry
/// value and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StartupMode {
    Boot = 0,
    System = 1,
    Automatic = 2,
    Manual = 3,
    Disabled = 4,
}

impl StartupMode {
    pub fn all() -> &'static [StartupMode] {
        &[
            StartupMode::Boot,
            StartupMode::System,
            StartupMode::Automatic,
            StartupMode::Manual,
            StartupMode::Disabled,
        ]
    }

    /// Numeric encoding used by the persisted service configuration store.
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<StartupMode> {
        StartupMode::all().get(code as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StartupMode::Boot => "Boot",
            StartupMode::System => "System",
            StartupMode::Automatic => "Automatic",
            StartupMode::Manual => "Manual",
            StartupMode::Disabled => "Disabled",
        }
    }
}

impl fmt::Display for StartupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StartupMode {
    type Err = crate::error::HardenError;

    /// Accepts the canonical names (any case), the numeric encoding, and the
    /// `START_TYPE` tokens printed by `sc.exe qc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if let Some(mode) = token.parse::<u32>().ok().and_then(StartupMode::from_code) {
            return Ok(mode);
        }
        match token.to_ascii_lowercase().as_str() {
            "boot" | "boot_start" => Ok(StartupMode::Boot),
            "system" | "system_start" => Ok(StartupMode::System),
            "automatic" | "auto" | "auto_start" => Ok(StartupMode::Automatic),
            "manual" | "demand" | "demand_start" => Ok(StartupMode::Manual),
            "disabled" => Ok(StartupMode::Disabled),
            _ => Err(crate::error::HardenError::InvalidModeString(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RuntimeStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeStatus {
    Running,
    Stopped,
    /// Start/stop pending, paused, or anything else the service manager reports.
    Other,
}

impl RuntimeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeStatus::Running => "running",
            RuntimeStatus::Stopped => "stopped",
            RuntimeStatus::Other => "other",
        }
    }
}

impl fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ServiceState / ServiceDirective
// ---------------------------------------------------------------------------

/// Snapshot of a service as reported by the service manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceState {
    pub service_id: String,
    pub status: RuntimeStatus,
    pub startup_mode: StartupMode,
}

/// One (service, target startup mode) policy assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDirective {
    pub service_id: String,
    pub target: StartupMode,
}

impl ServiceDirective {
    pub fn new(service_id: impl Into<String>, target: StartupMode) -> Self {
        Self {
            service_id: service_id.into(),
            target,
        }
    }
}

// ---------------------------------------------------------------------------
// Role / RoleFlags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    MemberServer,
    DomainController,
    PrintServer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::MemberServer => "member_server",
            Role::DomainController => "domain_controller",
            Role::PrintServer => "print_server",
        }
    }

    pub fn flags(self) -> RoleFlags {
        let mut flags = RoleFlags::default();
        flags.set(self);
        flags
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role switches an operator passed. Any combination may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFlags {
    pub member_server: bool,
    pub domain_controller: bool,
    pub print_server: bool,
}

impl RoleFlags {
    pub fn set(&mut self, role: Role) {
        match role {
            Role::MemberServer => self.member_server = true,
            Role::DomainController => self.domain_controller = true,
            Role::PrintServer => self.print_server = true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.member_server || self.domain_controller || self.print_server)
    }

    pub fn roles(&self) -> Vec<Role> {
        let mut roles = Vec::new();
        if self.member_server {
            roles.push(Role::MemberServer);
        }
        if self.domain_controller {
            roles.push(Role::DomainController);
        }
        if self.print_server {
            roles.push(Role::PrintServer);
        }
        roles
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
