//! Drive one service to a target startup mode.
//!
//! A call to [`Mutator::apply`] makes exactly one stop attempt (only when the
//! service is running) and at most one mode change. Nothing is retried.

use crate::error::{HardenError, Result};
use crate::host::{ConfigStore, ServiceController};
use crate::probe;
use crate::types::{RuntimeStatus, ServiceDirective, ServiceState, StartupMode};
use serde::Serialize;

/// Which mechanism persisted a startup mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    ServiceManager,
    ConfigStore,
}

/// Result of applying one directive. Stop and mode-change failures are kept
/// here rather than returned, so the caller can record them and move on.
#[derive(Debug)]
pub struct Transition {
    pub before: ServiceState,
    /// `None` when the service could not be re-read after mutation.
    pub after: Option<ServiceState>,
    pub stop_attempted: bool,
    pub stop_error: Option<HardenError>,
    /// `None` when no mode change was needed or every mechanism failed.
    pub mechanism: Option<Mechanism>,
    pub mode_error: Option<HardenError>,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.after
            .as_ref()
            .is_some_and(|after| after.startup_mode != self.before.startup_mode)
    }
}

pub struct Mutator<'a> {
    controller: &'a dyn ServiceController,
    store: &'a dyn ConfigStore,
}

impl<'a> Mutator<'a> {
    pub fn new(controller: &'a dyn ServiceController, store: &'a dyn ConfigStore) -> Self {
        Self { controller, store }
    }

    /// Apply `directive`. Fails only when the service cannot be read up front.
    pub fn apply(&self, directive: &ServiceDirective) -> Result<Transition> {
        let id = directive.service_id.as_str();
        let before = probe::read(self.controller, id)?;

        let stop_attempted = before.status == RuntimeStatus::Running;
        let stop_error = if stop_attempted {
            self.stop(id).err()
        } else {
            None
        };

        let (mechanism, mode_error) = if before.startup_mode == directive.target {
            tracing::debug!(service = id, mode = %directive.target, "startup mode already conforms");
            (None, None)
        } else {
            match self.set_startup_mode(id, directive.target) {
                Ok(mechanism) => (Some(mechanism), None),
                Err(e) => {
                    tracing::warn!(service = id, error = %e, "startup mode not changed");
                    (None, Some(e))
                }
            }
        };

        let after = match probe::read(self.controller, id) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(service = id, error = %e, "could not re-read service after change");
                None
            }
        };

        Ok(Transition {
            before,
            after,
            stop_attempted,
            stop_error,
            mechanism,
            mode_error,
        })
    }

    /// Best-effort stop. Failures are logged at debug level and returned.
    pub fn stop(&self, service_id: &str) -> Result<()> {
        match self.controller.stop(service_id) {
            Ok(()) => {
                tracing::debug!(service = service_id, "stop requested");
                Ok(())
            }
            Err(e) => {
                tracing::debug!(service = service_id, error = %e, "stop failed, continuing");
                Err(match e {
                    e @ HardenError::StopFailed { .. } => e,
                    other => HardenError::StopFailed {
                        service: service_id.to_string(),
                        reason: other.to_string(),
                    },
                })
            }
        }
    }

    /// Persist `mode`, preferring the service manager and falling back to the
    /// configuration store when the service manager cannot express the mode or
    /// refuses the change.
    pub fn set_startup_mode(&self, service_id: &str, mode: StartupMode) -> Result<Mechanism> {
        let mut reasons = Vec::new();

        if self.controller.supports(mode) {
            match self.controller.set_startup_mode(service_id, mode) {
                Ok(()) => return Ok(Mechanism::ServiceManager),
                Err(e) => {
                    tracing::debug!(service = service_id, error = %e, "service manager refused mode change, trying config store");
                    reasons.push(e.to_string());
                }
            }
        }

        match self.store.write_start_value(service_id, mode.code()) {
            Ok(()) => Ok(Mechanism::ConfigStore),
            Err(e) => {
                reasons.push(e.to_string());
                Err(HardenError::ModeWriteFailed {
                    service: service_id.to_string(),
                    mode: mode.to_string(),
                    reason: reasons.join("; "),
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryHost;

    fn directive(id: &str, target: StartupMode) -> ServiceDirective {
        ServiceDirective::new(id, target)
    }

    #[test]
    fn stops_running_service_and_disables_it() {
        let host =
            InMemoryHost::new().with_service("Spooler", RuntimeStatus::Running, StartupMode::Automatic);
        let mutator = Mutator::new(&host, &host);

        let t = mutator.apply(&directive("Spooler", StartupMode::Disabled)).unwrap();
        assert!(t.stop_attempted);
        assert!(t.stop_error.is_none());
        assert_eq!(t.mechanism, Some(Mechanism::ServiceManager));
        assert_eq!(t.before.startup_mode, StartupMode::Automatic);
        let after = t.after.as_ref().unwrap();
        assert_eq!(after.startup_mode, StartupMode::Disabled);
        assert_eq!(after.status, RuntimeStatus::Stopped);
        assert!(t.changed());
    }

    #[test]
    fn conforming_service_is_not_rewritten() {
        let host =
            InMemoryHost::new().with_service("upnphost", RuntimeStatus::Stopped, StartupMode::Disabled);
        let mutator = Mutator::new(&host, &host);

        let t = mutator.apply(&directive("upnphost", StartupMode::Disabled)).unwrap();
        assert_eq!(t.before, t.after.clone().unwrap());
        assert!(!t.stop_attempted);
        assert_eq!(t.mechanism, None);
        assert_eq!(host.stop_calls(), 0);
        assert_eq!(host.mode_writes(), 0);
    }

    #[test]
    fn reapplying_is_idempotent() {
        let host =
            InMemoryHost::new().with_service("SSDPSRV", RuntimeStatus::Running, StartupMode::Manual);
        let mutator = Mutator::new(&host, &host);
        let d = directive("SSDPSRV", StartupMode::Disabled);

        mutator.apply(&d).unwrap();
        let writes = host.mode_writes();
        let second = mutator.apply(&d).unwrap();
        assert_eq!(second.before, second.after.clone().unwrap());
        assert_eq!(host.mode_writes(), writes);
    }

    #[test]
    fn refused_stop_does_not_block_mode_change() {
        let host =
            InMemoryHost::new().with_service("WpnService", RuntimeStatus::Running, StartupMode::Automatic);
        host.refuse_stop("WpnService");
        let mutator = Mutator::new(&host, &host);

        let t = mutator.apply(&directive("WpnService", StartupMode::Disabled)).unwrap();
        assert!(matches!(t.stop_error, Some(HardenError::StopFailed { .. })));
        assert_eq!(host.stop_calls(), 1);
        assert_eq!(t.after.unwrap().startup_mode, StartupMode::Disabled);
    }

    #[test]
    fn boot_and_system_go_straight_to_config_store() {
        let host =
            InMemoryHost::new().with_service("acpi", RuntimeStatus::Running, StartupMode::Manual);
        let mutator = Mutator::new(&host, &host);

        let t = mutator.apply(&directive("acpi", StartupMode::Boot)).unwrap();
        assert_eq!(t.mechanism, Some(Mechanism::ConfigStore));
        assert_eq!(host.controller_writes(), 0);
        assert_eq!(host.store_writes(), 1);
        assert_eq!(t.after.unwrap().startup_mode, StartupMode::Boot);
    }

    #[test]
    fn controller_failure_falls_back_to_store() {
        let host =
            InMemoryHost::new().with_service("lfsvc", RuntimeStatus::Stopped, StartupMode::Manual);
        host.fail_controller("lfsvc");
        let mutator = Mutator::new(&host, &host);

        let t = mutator.apply(&directive("lfsvc", StartupMode::Disabled)).unwrap();
        assert_eq!(t.mechanism, Some(Mechanism::ConfigStore));
        assert_eq!(t.after.unwrap().startup_mode, StartupMode::Disabled);
    }

    #[test]
    fn both_mechanisms_failing_is_mode_write_failed() {
        let host =
            InMemoryHost::new().with_service("lfsvc", RuntimeStatus::Stopped, StartupMode::Manual);
        host.fail_controller("lfsvc");
        host.fail_store("lfsvc");
        let mutator = Mutator::new(&host, &host);

        let t = mutator.apply(&directive("lfsvc", StartupMode::Disabled)).unwrap();
        assert!(matches!(t.mode_error, Some(HardenError::ModeWriteFailed { .. })));
        assert_eq!(t.mechanism, None);
        assert_eq!(t.after.unwrap().startup_mode, StartupMode::Manual);
        assert_eq!(host.controller_writes(), 1);
        assert_eq!(host.store_writes(), 1);
    }

    #[test]
    fn missing_service_fails_apply() {
        let host = InMemoryHost::new();
        let mutator = Mutator::new(&host, &host);
        let err = mutator.apply(&directive("Ghost", StartupMode::Disabled)).unwrap_err();
        assert!(matches!(err, HardenError::ServiceNotFound(_)));
        assert_eq!(host.stop_calls(), 0);
    }
}
