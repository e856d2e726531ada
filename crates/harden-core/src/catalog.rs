//! Built-in service policy for Windows Server hosts.
//!
//! Three overlapping lists make up the policy. `COMMON` applies to every role,
//! `NON_PRINT` to every role except print servers, and `MEMBER_ONLY` to member
//! servers that are neither domain controllers nor print servers.

use crate::types::{RoleFlags, ServiceDirective, StartupMode};

use crate::types::StartupMode::{Disabled, Manual};

/// Services not needed on any hardened server.
pub const COMMON: &[(&str, StartupMode)] = &[
    ("AxInstSV", Disabled),
    ("bthserv", Disabled),
    ("CDPUserSvc", Disabled),
    ("PimIndexMaintenanceSvc", Disabled),
    ("dmwappushservice", Disabled),
    ("MapsBroker", Disabled),
    ("lfsvc", Disabled),
    ("SharedAccess", Disabled),
    ("lltdsvc", Disabled),
    ("wlidsvc", Disabled),
    ("NgcSvc", Manual),
    ("NgcCtnrSvc", Manual),
    ("NcbService", Disabled),
    ("PhoneSvc", Disabled),
    ("PcaSvc", Disabled),
    ("QWAVE", Disabled),
    ("RmSvc", Disabled),
    ("RemoteRegistry", Disabled),
    ("SensorDataService", Disabled),
    ("SensrSvc", Disabled),
    ("SensorService", Disabled),
    ("ShellHWDetection", Disabled),
    ("SSDPSRV", Disabled),
    ("WiaRpc", Disabled),
    ("OneSyncSvc", Disabled),
    ("TabletInputService", Disabled),
    ("upnphost", Disabled),
    ("UserDataSvc", Disabled),
    ("UnistoreSvc", Disabled),
    ("WalletService", Disabled),
    ("Audiosrv", Disabled),
    ("AudioEndpointBuilder", Disabled),
    ("FrameServer", Disabled),
    ("stisvc", Disabled),
    ("wisvc", Disabled),
    ("icssvc", Disabled),
    ("WpnService", Disabled),
    ("WpnUserService", Disabled),
    ("XblAuthManager", Disabled),
    ("XblGameSave", Disabled),
];

/// Print stack; kept on print servers.
pub const NON_PRINT: &[(&str, StartupMode)] = &[("Spooler", Disabled), ("PrintNotify", Disabled)];

/// NetBIOS browsing; still relied on by domain controllers.
pub const MEMBER_ONLY: &[(&str, StartupMode)] = &[("Browser", Disabled), ("lmhosts", Manual)];

/// Build the ordered directive list for the given role switches.
///
/// Lists are concatenated without removing duplicates. No flags set yields an
/// empty list.
pub fn directives_for(flags: RoleFlags) -> Vec<ServiceDirective> {
    let mut out = Vec::new();
    if flags.is_empty() {
        return out;
    }
    extend(&mut out, COMMON);

    if !flags.print_server && (flags.member_server || flags.domain_controller) {
        extend(&mut out, NON_PRINT);
    }

    if !flags.domain_controller && !flags.print_server && flags.member_server {
        extend(&mut out, MEMBER_ONLY);
    }
    out
}

fn extend(out: &mut Vec<ServiceDirective>, list: &[(&str, StartupMode)]) {
    out.extend(list.iter().map(|(id, mode)| ServiceDirective::new(*id, *mode)));
}

/// True when `service_id` appears in any built-in list (case-insensitive, as
/// service names are on Windows).
pub fn contains(service_id: &str) -> bool {
    COMMON
        .iter()
        .chain(NON_PRINT)
        .chain(MEMBER_ONLY)
        .any(|(id, _)| id.eq_ignore_ascii_case(service_id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
