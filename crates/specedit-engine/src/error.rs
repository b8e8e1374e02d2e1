use specedit_syntax::{EditOperation, ParseError};
use thiserror::Error;

use crate::io::IoError;

/// Errors surfaced by the engine: parsing, edits and strategies.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{operation} is not supported for {target}")]
    UnsupportedEdit {
        operation: EditOperation,
        target: String,
    },

    #[error("section {0} not found")]
    SectionNotFound(String),

    #[error("no definition of {0} found")]
    DefinitionNotFound(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("strategy {name} failed: {message}")]
    Strategy { name: String, message: String },

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("input is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}
