//! # specedit-engine
//!
//! Structural edits on RPM spec files, on top of the lossless tree from
//! `specedit-syntax`.
//!
//! A [`SpecDocument`] holds a parsed file. Edits are [`Cmd`] values passed to
//! [`SpecDocument::apply`]; each returns a [`Patch`] describing what changed,
//! or an [`EngineError`] with the document left as it was. Unedited bytes are
//! never rewritten.
//!
//! Higher-level operations are [strategies](strategy): editors, renderers and
//! model writers, either built in or run as external commands.

pub mod editing;
pub mod error;
pub mod io;
pub mod strategy;

// Re-export key types for easier usage
pub use editing::{Cmd, LineSelector, Patch, ProvidesEntry, SpecDocument};
pub use error::EngineError;
pub use io::{IoError, read_all, read_spec};
pub use strategy::{
    Editor, ExternalStrategy, ModelWriter, Renderer, StrategyKind, StrategyRegistry,
    StrategyRequest,
};
