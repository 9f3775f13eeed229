// ABOUTME: Configuration types and parsing for stackdock.yml.
// ABOUTME: Everything defaults; the tool runs with no config file at all.

use crate::catalog::Profile;
use crate::error::{Error, Result};
use crate::runtime::RuntimeConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "stackdock.yml";
pub const CONFIG_FILENAME_ALT: &str = "stackdock.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".stackdock/config.yml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Deployment profile to manage.
    #[serde(default = "default_profile", deserialize_with = "deserialize_profile")]
    pub profile: Profile,

    /// Publish host ports on `run` unless overridden on the command line.
    #[serde(default)]
    pub expose_ports: bool,

    /// Reconciliation poll interval.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Explicit engine override.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            expose_ports: false,
            poll_interval: default_poll_interval(),
            runtime: RuntimeConfig::default(),
        }
    }
}

fn default_profile() -> Profile {
    Profile::Community72
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(1500)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find and load a config file in `dir`, falling back to defaults when
    /// none of the candidates exist.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }
}

fn deserialize_profile<'de, D>(deserializer: D) -> std::result::Result<Profile, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.profile, Profile::Community72);
        assert!(!config.expose_ports);
        assert_eq!(config.poll_interval, Duration::from_millis(1500));
        assert!(config.runtime.runtime.is_none());
    }

    #[test]
    fn parses_full_config() {
        let yaml = r#"
profile: community-7.2
expose_ports: true
poll_interval: 3s
runtime:
  runtime: podman
  socket: /tmp/podman.sock
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.expose_ports);
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.runtime.socket.as_deref(), Some("/tmp/podman.sock"));
    }

    #[test]
    fn rejects_unknown_profile() {
        assert!(Config::from_yaml("profile: enterprise-99").is_err());
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(Config::from_yaml("servers: [a]").is_err());
    }
}
