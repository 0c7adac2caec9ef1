// src/config/env.rs
// Environment-based configuration - single source of truth for all env vars

use tracing::{debug, info, warn};

/// API credentials loaded from environment variables.
///
/// Provider tokens may also be referenced per-repository through
/// `RepositoryConfig::credential_env`; these are the process-wide defaults.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// GitHub personal access token (GITHUB_TOKEN)
    pub github: Option<String>,
    /// Azure DevOps PAT (AZURE_DEVOPS_TOKEN)
    pub azure: Option<String>,
    /// Bitbucket access token (BITBUCKET_TOKEN)
    pub bitbucket: Option<String>,
    /// OpenAI API key for the optional AI augmentation (OPENAI_API_KEY)
    pub openai: Option<String>,
}

impl ApiKeys {
    /// Load API keys from environment variables (single source of truth)
    ///
    /// Set `BUGSCOUT_DISABLE_AI=1` to suppress the OpenAI key (forces the
    /// static fallback path for AI augmentation).
    pub fn from_env() -> Self {
        let openai = if parse_bool_env("BUGSCOUT_DISABLE_AI").unwrap_or(false) {
            info!("BUGSCOUT_DISABLE_AI is set - AI augmentation disabled, using static fallbacks");
            None
        } else {
            Self::read_key("OPENAI_API_KEY")
        };

        let keys = Self {
            github: Self::read_key("GITHUB_TOKEN"),
            azure: Self::read_key("AZURE_DEVOPS_TOKEN"),
            bitbucket: Self::read_key("BITBUCKET_TOKEN"),
            openai,
        };
        keys.log_status();
        keys
    }

    /// Read a single API key from environment, filtering empty values
    fn read_key(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|k| !k.trim().is_empty())
    }

    /// Check if the AI augmentation path is available
    pub fn has_ai(&self) -> bool {
        self.openai.is_some()
    }

    /// Log which API keys are available (without exposing values)
    fn log_status(&self) {
        let mut available = Vec::new();
        if self.github.is_some() {
            available.push("GitHub");
        }
        if self.azure.is_some() {
            available.push("Azure DevOps");
        }
        if self.bitbucket.is_some() {
            available.push("Bitbucket");
        }
        if self.openai.is_some() {
            available.push("OpenAI");
        }

        if available.is_empty() {
            warn!("No API keys configured - investigations will return empty commit data");
        } else {
            debug!(keys = ?available, "API keys loaded");
        }
    }
}

/// Parse a boolean-ish environment variable ("1", "true", "yes")
fn parse_bool_env(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keys_empty() {
        let keys = ApiKeys::default();
        assert!(!keys.has_ai());
        assert!(keys.github.is_none());
    }

    #[test]
    fn test_parse_bool_env() {
        std::env::set_var("BUGSCOUT_TEST_FLAG", "true");
        assert_eq!(parse_bool_env("BUGSCOUT_TEST_FLAG"), Some(true));
        std::env::set_var("BUGSCOUT_TEST_FLAG", "0");
        assert_eq!(parse_bool_env("BUGSCOUT_TEST_FLAG"), Some(false));
        std::env::remove_var("BUGSCOUT_TEST_FLAG");
        assert_eq!(parse_bool_env("BUGSCOUT_TEST_FLAG"), None);
    }
}
