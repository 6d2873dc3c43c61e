//! Error types for TheraLink
//!
//! Bad pose data is never an error. Missing landmarks, coincident points and
//! implausible rep timing all degrade to defined fallbacks inside the
//! pipeline; only configuration and plumbing failures surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Core TheraLink errors
#[derive(Error, Debug)]
pub enum TheraLinkError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration: {0}")]
    ConfigParse(String),

    // Summary errors
    #[error("Summary serialization failed: {0}")]
    Serialization(String),

    // Runtime errors
    #[error("Pipeline closed")]
    PipelineClosed,

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type for TheraLink operations
pub type TheraLinkResult<T> = Result<T, TheraLinkError>;
