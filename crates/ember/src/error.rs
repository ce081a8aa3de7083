//! # Demo Error Types

use std::path::PathBuf;

use thiserror::Error;

use ember_pool::PoolError;

/// Errors that can stop the demo.
#[derive(Error, Debug)]
pub enum DemoError {
    /// Could not read the config file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema.
    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    /// The pool rejected an operation.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Result type for demo operations.
pub type DemoResult<T> = Result<T, DemoError>;
