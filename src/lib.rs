// src/lib.rs
// bugscout - Conversational bug intake and commit-history investigation

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod ai;
pub mod classify;
pub mod config;
pub mod error;
pub mod http;
pub mod impact;
pub mod investigate;
pub mod repo;
pub mod report;
pub mod session;
pub mod store;
pub use error::{Result, ScoutError};
