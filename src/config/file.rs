// src/config/file.rs
// File-based configuration from ~/.bugscout/config.toml

use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Top-level config structure
#[derive(Debug, Deserialize, Default)]
pub struct ScoutConfig {
    #[serde(default)]
    pub investigation: Tunables,
}

/// Heuristic constants for the investigation pipeline.
///
/// The thresholds and the commit window are tunable configuration, not
/// protocol invariants; the defaults match the observed source behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// How far back to look for commits, in days
    pub window_days: u32,
    /// Maximum commits fetched per repository (newest first)
    pub commit_limit: usize,
    /// Impact score at or above which a commit is high tier
    pub high_threshold: u32,
    /// Impact score at or above which a commit is medium tier
    pub medium_threshold: u32,
    /// Bound on every adapter / AI call, in seconds
    pub call_timeout_secs: u64,
    /// How many commits per repository land in the merged recent-changes list
    pub recent_per_repo: usize,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            window_days: 7,
            commit_limit: 10,
            high_threshold: 3,
            medium_threshold: 1,
            call_timeout_secs: 10,
            recent_per_repo: 3,
        }
    }
}

impl ScoutConfig {
    /// Load config from ~/.bugscout/config.toml
    pub fn load() -> Self {
        let path = Self::config_path();

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Get the config file path
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bugscout")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[investigation]
window_days = 14
high_threshold = 5
"#;
        let config: ScoutConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.investigation.window_days, 14);
        assert_eq!(config.investigation.high_threshold, 5);
        // Unspecified fields keep their defaults
        assert_eq!(config.investigation.commit_limit, 10);
        assert_eq!(config.investigation.call_timeout_secs, 10);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: ScoutConfig = toml::from_str("").unwrap();
        assert_eq!(config.investigation.window_days, 7);
        assert_eq!(config.investigation.medium_threshold, 1);
    }
}
