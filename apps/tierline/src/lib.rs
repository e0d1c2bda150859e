//! # Tierline
//!
//! Rewards views over the `tierline-core` progression engine.
//!
//! - [`sources`]: collaborators (HTTP rewards API, in-memory service)
//! - [`pages`]: screen controllers that fetch, compute and report
//! - [`cli`]: terminal front-end
//! - [`api`]: JSON view server

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pages;
pub mod sources;

pub use config::{Config, ConfigError};
pub use error::AppError;
