//! Inliner error types

use std::path::PathBuf;
use thiserror::Error;

/// Inliner result type
pub type InlineResult<T> = Result<T, InlineError>;

/// Errors that abort an inlining run.
///
/// Malformed CSS never shows up here: it is recovered per fragment and written
/// back into the residual style block.
#[derive(Debug, Error)]
pub enum InlineError {
    #[error("cannot read input file {path}: {source}")]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write output file {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] std::io::Error),

    #[error("serialized document is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
