//! # Application Errors

use crate::config::ConfigError;
use crate::sources::SourceError;
use thiserror::Error;
use tierline_core::ProgressionError;

/// Errors surfaced by the CLI and the view server.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Progression(#[from] ProgressionError),

    /// A requested action was refused; the user has already been notified.
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(String),
}
