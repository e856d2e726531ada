use harden_core::paths::CONFIG_FILE;
use std::path::{Path, PathBuf};

/// Resolve the config file path.
///
/// Priority:
/// 1. `--config` flag / `HARDEN_CONFIG` env var (passed in as `explicit`)
/// 2. `harden.yaml` in the current directory, if present
/// 3. `harden.yaml` next to the executable, if present
/// 4. `harden.yaml` in the current directory (absent: defaults apply)
pub fn resolve_config(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf));
    resolve_in(&cwd, exe_dir.as_deref())
}

fn resolve_in(cwd: &Path, exe_dir: Option<&Path>) -> PathBuf {
    let local = cwd.join(CONFIG_FILE);
    if local.is_file() {
        return local;
    }
    if let Some(dir) = exe_dir {
        let beside = dir.join(CONFIG_FILE);
        if beside.is_file() {
            return beside;
        }
    }
    local
}
