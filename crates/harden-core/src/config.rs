use crate::catalog;
use crate::error::Result;
use crate::types::{RoleFlags, ServiceDirective, StartupMode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// A directive added on top of the built-in catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraDirective {
    pub service: String,
    pub mode: StartupMode,
}

/// Site-local overrides, read from `harden.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory for default-named audit logs. Current directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Service ids never touched by a forward run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    /// Directives applied after the catalog for every role.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<ExtraDirective>,
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn is_excluded(&self, service_id: &str) -> bool {
        self.exclude
            .iter()
            .any(|id| id.eq_ignore_ascii_case(service_id))
    }

    /// Catalog directives for `flags`, minus exclusions, plus extras.
    /// No role flags means no directives, extras included.
    pub fn directives_for(&self, flags: RoleFlags) -> Vec<ServiceDirective> {
        if flags.is_empty() {
            return Vec::new();
        }
        catalog::directives_for(flags)
            .into_iter()
            .chain(
                self.extra
                    .iter()
                    .map(|e| ServiceDirective::new(e.service.clone(), e.mode)),
            )
            .filter(|d| !self.is_excluded(&d.service_id))
            .collect()
    }

    /// Check for common mistakes.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for id in &self.exclude {
            if id.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "exclude contains an empty service name".to_string(),
                });
            } else if !catalog::contains(id) && !self.extra.iter().any(|e| e.service.eq_ignore_ascii_case(id)) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("excluded service '{id}' is not part of any policy"),
                });
            }
        }

        let mut seen = HashSet::new();
        for extra in &self.extra {
            let key = extra.service.to_ascii_lowercase();
            if key.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "extra directive with an empty service name".to_string(),
                });
                continue;
            }
            if !seen.insert(key) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("service '{}' appears more than once in extra", extra.service),
                });
            }
            if catalog::contains(&extra.service) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "extra directive for '{}' repeats a built-in policy entry",
                        extra.service
                    ),
                });
            }
        }

        if let Some(dir) = &self.log_dir {
            if dir.exists() && !dir.is_dir() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("log_dir '{}' is not a directory", dir.display()),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
