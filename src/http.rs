// src/http.rs
// Shared HTTP client for all network operations

use std::time::Duration;

/// Default request timeout; every provider and AI call is bounded by this
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Create the shared HTTP client with appropriate defaults.
///
/// This client should be created once at startup and passed to all
/// modules that need HTTP access. Uses connection pooling internally.
pub fn create_shared_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(10)
        .user_agent(concat!("bugscout/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
