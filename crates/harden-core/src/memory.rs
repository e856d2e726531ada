//! In-memory service host implementing both OS capabilities.
//!
//! Useful for exercising the engine without touching a real service manager.
//! Failures can be injected per service, and every mutating call is counted.

use crate::error::{HardenError, Result};
use crate::host::{ConfigStore, ServiceController};
use crate::types::{RuntimeStatus, ServiceState, StartupMode};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
struct Inner {
    services: BTreeMap<String, (RuntimeStatus, StartupMode)>,
    refuse_stop: BTreeSet<String>,
    controller_failures: BTreeSet<String>,
    store_failures: BTreeSet<String>,
    stop_calls: usize,
    controller_writes: usize,
    store_writes: usize,
}

#[derive(Debug, Default)]
pub struct InMemoryHost {
    inner: RefCell<Inner>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper for registering a service.
    pub fn with_service(self, id: &str, status: RuntimeStatus, mode: StartupMode) -> Self {
        self.insert(id, status, mode);
        self
    }

    pub fn insert(&self, id: &str, status: RuntimeStatus, mode: StartupMode) {
        self.inner
            .borrow_mut()
            .services
            .insert(id.to_string(), (status, mode));
    }

    /// Make `stop` fail for this service.
    pub fn refuse_stop(&self, id: &str) {
        self.inner.borrow_mut().refuse_stop.insert(id.to_string());
    }

    /// Make the service-manager mode change fail for this service.
    pub fn fail_controller(&self, id: &str) {
        self.inner
            .borrow_mut()
            .controller_failures
            .insert(id.to_string());
    }

    /// Make the configuration-store write fail for this service.
    pub fn fail_store(&self, id: &str) {
        self.inner.borrow_mut().store_failures.insert(id.to_string());
    }

    pub fn state(&self, id: &str) -> Option<ServiceState> {
        self.inner
            .borrow()
            .services
            .get(id)
            .map(|(status, mode)| ServiceState {
                service_id: id.to_string(),
                status: *status,
                startup_mode: *mode,
            })
    }

    pub fn stop_calls(&self) -> usize {
        self.inner.borrow().stop_calls
    }

    pub fn controller_writes(&self) -> usize {
        self.inner.borrow().controller_writes
    }

    pub fn store_writes(&self) -> usize {
        self.inner.borrow().store_writes
    }

    /// Total mode-change attempts through either mechanism.
    pub fn mode_writes(&self) -> usize {
        let inner = self.inner.borrow();
        inner.controller_writes + inner.store_writes
    }

    fn lookup(&self, id: &str) -> Result<(RuntimeStatus, StartupMode)> {
        self.inner
            .borrow()
            .services
            .get(id)
            .copied()
            .ok_or_else(|| HardenError::ServiceNotFound(id.to_string()))
    }
}

impl ServiceController for InMemoryHost {
    fn status(&self, service_id: &str) -> Result<RuntimeStatus> {
        self.lookup(service_id).map(|(status, _)| status)
    }

    fn startup_mode(&self, service_id: &str) -> Result<StartupMode> {
        self.lookup(service_id).map(|(_, mode)| mode)
    }

    fn stop(&self, service_id: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.stop_calls += 1;
        if inner.refuse_stop.contains(service_id) {
            return Err(HardenError::StopFailed {
                service: service_id.to_string(),
                reason: "service did not accept the stop request".to_string(),
            });
        }
        let entry = inner
            .services
            .get_mut(service_id)
            .ok_or_else(|| HardenError::ServiceNotFound(service_id.to_string()))?;
        entry.0 = RuntimeStatus::Stopped;
        Ok(())
    }

    fn supports(&self, mode: StartupMode) -> bool {
        matches!(
            mode,
            StartupMode::Automatic | StartupMode::Manual | StartupMode::Disabled
        )
    }

    fn set_startup_mode(&self, service_id: &str, mode: StartupMode) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.controller_writes += 1;
        if inner.controller_failures.contains(service_id) {
            return Err(HardenError::CommandFailed {
                command: format!("set startup mode of {service_id}"),
                message: "access denied".to_string(),
            });
        }
        let entry = inner
            .services
            .get_mut(service_id)
            .ok_or_else(|| HardenError::ServiceNotFound(service_id.to_string()))?;
        entry.1 = mode;
        Ok(())
    }
}

impl ConfigStore for InMemoryHost {
    fn write_start_value(&self, service_id: &str, value: u32) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.store_writes += 1;
        if inner.store_failures.contains(service_id) {
            return Err(HardenError::CommandFailed {
                command: format!("write Start value of {service_id}"),
                message: "access denied".to_string(),
            });
        }
        let mode = StartupMode::from_code(value)
            .ok_or_else(|| HardenError::InvalidModeString(value.to_string()))?;
        let entry = inner
            .services
            .get_mut(service_id)
            .ok_or_else(|| HardenError::ServiceNotFound(service_id.to_string()))?;
        entry.1 = mode;
        Ok(())
    }
}
