use crate::host::ServiceController;
use crate::probe;
use crate::types::{RuntimeStatus, ServiceDirective, ServiceState};
use serde::Serialize;

/// What applying a directive would do right now.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedChange {
    pub directive: ServiceDirective,
    pub current: Option<ServiceState>,
    pub would_stop: bool,
    pub would_change: bool,
    pub error: Option<String>,
}

/// Probe every directive's service without mutating anything.
pub fn plan(controller: &dyn ServiceController, directives: &[ServiceDirective]) -> Vec<PlannedChange> {
    directives
        .iter()
        .map(|d| match probe::read(controller, &d.service_id) {
            Ok(state) => PlannedChange {
                directive: d.clone(),
                would_stop: state.status == RuntimeStatus::Running,
                would_change: state.startup_mode != d.target,
                current: Some(state),
                error: None,
            },
            Err(e) => PlannedChange {
                directive: d.clone(),
                current: None,
                would_stop: false,
                would_change: false,
                error: Some(e.to_string()),
            },
        })
        .collect()
}
