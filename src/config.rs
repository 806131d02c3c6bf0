//! Sidecar configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables with the `ARISE_` prefix (`ARISE_WORKSPACE`,
//!    `ARISE_LOG_LEVEL`, `ARISE_PRETTY_EXPORT`)
//! 2. Built-in defaults
//!
//! `ARISE_LOG` is read separately as a full tracing filter directive and wins
//! over `ARISE_LOG_LEVEL`.

use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_log_level() -> String {
    "warn".to_string()
}

const fn default_pretty_export() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Opened at startup when set; otherwise the host selects one over IPC.
    #[serde(default)]
    pub workspace: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Indent exported snapshot files.
    #[serde(default = "default_pretty_export")]
    pub pretty_export: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            workspace: None,
            log_level: default_log_level(),
            pretty_export: default_pretty_export(),
        }
    }
}

impl ServiceConfig {
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed("ARISE_").only(&["workspace", "log_level", "pretty_export"]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_env() {
        Jail::expect_with(|_jail| {
            let cfg = ServiceConfig::load()?;
            assert_eq!(cfg, ServiceConfig::default());
            assert_eq!(cfg.log_level, "warn");
            assert!(cfg.pretty_export);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("ARISE_WORKSPACE", "/tmp/arise-ws");
            jail.set_env("ARISE_LOG_LEVEL", "debug");
            jail.set_env("ARISE_PRETTY_EXPORT", "false");
            let cfg = ServiceConfig::load()?;
            assert_eq!(cfg.workspace, Some(PathBuf::from("/tmp/arise-ws")));
            assert_eq!(cfg.log_level, "debug");
            assert!(!cfg.pretty_export);
            Ok(())
        });
    }

    #[test]
    fn invalid_bool_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("ARISE_PRETTY_EXPORT", "sometimes");
            assert!(ServiceConfig::load().is_err());
            Ok(())
        });
    }
}
