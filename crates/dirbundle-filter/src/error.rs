//! Errors raised while building a rule chain.

use std::path::PathBuf;

use dirbundle_core::WalkError;
use thiserror::Error;

/// Errors that can occur while installing rules.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A pattern could not be compiled.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A path the chain depends on could not be resolved.
    #[error("Cannot resolve {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<FilterError> for WalkError {
    fn from(err: FilterError) -> Self {
        WalkError::Setup {
            message: err.to_string(),
            source: Box::new(err),
        }
    }
}
