//! Unified error type for the mindful shopping tracker.
//!
//! Lookups by id are not errors: they surface as `Ok(None)` from the stores.
//! Failures of the external analysis service are recovered where they occur
//! and only reach this type when a caller explicitly asks for them.

use thiserror::Error;

/// Every failure the library can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Database driver or query failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Price that is negative, NaN or infinite
    #[error("Invalid price: {amount}")]
    InvalidPrice {
        /// The rejected amount
        amount: f64,
    },

    /// A review schedule with no usable interval labels
    #[error("Review schedule must contain at least one interval")]
    EmptySchedule,

    /// Interval label outside the fixed vocabulary (strict policy only)
    #[error("Unknown review interval '{label}'")]
    UnknownInterval {
        /// The rejected label
        label: String,
    },

    /// Review decision outside `keep`, `archive`, `purchase`
    #[error("Unknown review decision '{value}'")]
    InvalidDecision {
        /// The rejected value
        value: String,
    },

    /// Malformed user input
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// Attempt to edit an archived item
    #[error("Item {id} is archived and can no longer be edited")]
    ItemArchived {
        /// Item id
        id: i64,
    },

    /// Attempt to complete a review twice
    #[error("Review {id} has already been completed")]
    ReviewAlreadyCompleted {
        /// Review id
        id: i64,
    },

    /// Price or sustainability analysis failure
    #[error("Analysis error: {message}")]
    Analysis {
        /// Failure detail
        message: String,
    },

    /// HTTP transport failure talking to the analysis service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Background task panicked or was aborted
    #[error("Background task error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
