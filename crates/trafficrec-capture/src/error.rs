//! Error types for the capture pipeline

use thiserror::Error;

/// Errors raised while recording an event
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The store rejected or failed a write. Fatal for the event being recorded.
    #[error("Storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Startup configuration errors; the host process must not start capturing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ID of the current run not specified (hint: use `--run <run_id>`)")]
    MissingRunId,

    #[error("Run ID `{0}` is not a valid integer")]
    InvalidRunId(String),

    #[error("Run ID must be a positive integer, got {0}")]
    NonPositiveRunId(i64),

    #[error("Lifecycle step `{step}` is not allowed in state {state}")]
    OutOfOrder {
        step: &'static str,
        state: crate::lifecycle::LifecycleState,
    },

    #[error("Missing store setting: {0}")]
    MissingSetting(&'static str),

    #[error("Invalid store URL: {0}")]
    InvalidStoreUrl(String),
}
