//! Library error type. Data-quality problems inside a dataset (bad rows,
//! missing fields) are skipped and counted rather than surfaced here; an
//! error means the operation as a whole could not proceed.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("configuration error: {0}")]
    Config(String),

    /// A dataset file that exists but cannot be read or parsed at all.
    #[error("dataset error for {path}: {message}")]
    Dataset { path: PathBuf, message: String },

    /// A required external collaborator (LLM endpoint, subprocess) failed.
    #[error("{what}: {message}")]
    External { what: String, message: String },

    /// An LLM verification reply that could not be interpreted even by the
    /// lenient fallback path.
    #[error("unparseable verification reply: {0}")]
    VerificationParse(String),
}

impl RosterError {
    pub fn dataset(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        RosterError::Dataset {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn external(what: impl Into<String>, message: impl Into<String>) -> Self {
        RosterError::External {
            what: what.into(),
            message: message.into(),
        }
    }
}
