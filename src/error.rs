// src/error.rs
// Unified error type for the crate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ScoutError>;

impl From<String> for ScoutError {
    fn from(s: String) -> Self {
        ScoutError::Other(s)
    }
}

impl From<&str> for ScoutError {
    fn from(s: &str) -> Self {
        ScoutError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScoutError::InvalidRepoUrl("not a url".to_string());
        assert_eq!(err.to_string(), "Invalid repository URL: not a url");

        let err = ScoutError::Provider("rate limited".to_string());
        assert_eq!(err.to_string(), "Provider error: rate limited");
    }

    #[test]
    fn test_from_string() {
        let err: ScoutError = "something failed".into();
        assert!(matches!(err, ScoutError::Other(_)));
    }
}
