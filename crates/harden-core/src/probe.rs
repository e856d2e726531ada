use crate::error::Result;
use crate::host::ServiceController;
use crate::types::ServiceState;

/// Read a service's runtime status and startup mode.
///
/// Unknown ids fail with `ServiceNotFound`; callers decide whether that is fatal.
pub fn read(controller: &dyn ServiceController, service_id: &str) -> Result<ServiceState> {
    let status = controller.status(service_id)?;
    let startup_mode = controller.startup_mode(service_id)?;
    Ok(ServiceState {
        service_id: service_id.to_string(),
        status,
        startup_mode,
    })
}
