//! Error types for the safe-write core.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while gating, pacing or committing bot edits.
#[derive(Debug, Error)]
pub enum BotError {
    /// A static input was rejected before any work was attempted.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Why the argument was rejected.
        reason: String,
    },

    /// Two mutually exclusive arguments were both supplied.
    #[error("{first} and {second} are mutually exclusive")]
    ArgumentConflict {
        /// Name of the first argument.
        first: &'static str,
        /// Name of the second argument.
        second: &'static str,
    },

    /// The operator has disabled the bot through its runpage.
    #[error("runpage {title} does not permit the bot to run")]
    RunpageHalt {
        /// Resolved title of the runpage that was checked.
        title: String,
    },

    /// The replica lag probe returned no rows for the cluster.
    #[error("replica cluster not found: {cluster}")]
    ClusterNotFound {
        /// The cluster that was probed.
        cluster: String,
    },

    /// Replica lag is above the configured ceiling.
    #[error("replica lag {lag:?} exceeds maximum {max:?}")]
    ReplagExceeded {
        /// Measured lag.
        lag: Duration,
        /// Configured ceiling.
        max: Duration,
    },

    /// The document does not exist and creation was not allowed.
    #[error("document not found: {title}")]
    DocumentNotFound {
        /// Title of the missing document.
        title: String,
    },

    /// The edit mode cannot be handled by the page writer.
    #[error("unsupported edit mode: {mode}")]
    UnsupportedMode {
        /// The rejected mode.
        mode: String,
    },

    /// The computed body is identical to the current one.
    #[error("no change to save for {title}")]
    NoChange {
        /// Title of the unchanged document.
        title: String,
    },

    /// The store rejected a commit because of a concurrent modification.
    #[error("edit conflict on {title}")]
    EditConflict {
        /// Title of the conflicting document.
        title: String,
    },

    /// Opaque failure reported by a document store client.
    #[error("store error: {msg}")]
    Store {
        /// Error message from the store client.
        msg: String,
    },

    /// Opaque failure reported by a database client.
    #[error("database error: {msg}")]
    Database {
        /// Error message from the database client.
        msg: String,
    },

    /// A configuration file could not be used.
    #[error("config error in {}: {msg}", path.display())]
    Config {
        /// Path of the offending file.
        path: PathBuf,
        /// What was wrong with it.
        msg: String,
    },

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BotError {
    /// Returns true for failures that may succeed if the same call is repeated.
    ///
    /// Edit conflicts and client/transport failures are transient; argument,
    /// gate and content errors are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            BotError::EditConflict { .. } => true,
            BotError::Store { .. } => true,
            BotError::Database { .. } => true,
            BotError::Io(_) => true,
            BotError::InvalidArgument { .. } => false,
            BotError::ArgumentConflict { .. } => false,
            BotError::RunpageHalt { .. } => false,
            BotError::ClusterNotFound { .. } => false,
            BotError::ReplagExceeded { .. } => false,
            BotError::DocumentNotFound { .. } => false,
            BotError::UnsupportedMode { .. } => false,
            BotError::NoChange { .. } => false,
            BotError::Config { .. } => false,
            BotError::Json(_) => false,
        }
    }
}

/// Result type for wikibot operations.
pub type Result<T> = std::result::Result<T, BotError>;
