// src/config/mod.rs
// Configuration: environment credentials and file-based tunables

pub mod env;
pub mod file;

pub use env::ApiKeys;
pub use file::{ScoutConfig, Tunables};
