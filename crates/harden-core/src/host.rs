//! Capabilities the engine needs from the operating system.
//!
//! The probe and mutator only talk to these traits, so the same code path runs
//! against the Windows service manager (`crate::windows`) and against the
//! in-memory host (`crate::memory`).

use crate::error::Result;
use crate::types::{RuntimeStatus, StartupMode};

/// High-level service manager: query, stop and reconfigure services.
pub trait ServiceController {
    /// Current runtime status. Unknown ids fail with `ServiceNotFound`.
    fn status(&self, service_id: &str) -> Result<RuntimeStatus>;

    /// Current startup mode. Unknown ids fail with `ServiceNotFound`.
    fn startup_mode(&self, service_id: &str) -> Result<StartupMode>;

    /// Ask the service to stop. Returns once the request is accepted or refused.
    fn stop(&self, service_id: &str) -> Result<()>;

    /// Whether `set_startup_mode` can express `mode` at all.
    fn supports(&self, mode: StartupMode) -> bool;

    fn set_startup_mode(&self, service_id: &str, mode: StartupMode) -> Result<()>;
}

/// Persisted per-service configuration (the `Start` value under the service key).
pub trait ConfigStore {
    fn write_start_value(&self, service_id: &str, value: u32) -> Result<()>;
}
