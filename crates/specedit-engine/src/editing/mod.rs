/*!
 * # Editing Core Module
 *
 * Structural edits on a parsed spec file.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: the statement tree
 * - A [`SpecDocument`] owns one [`SpecFile`](specedit_syntax::SpecFile)
 * - Serializing the tree reproduces the original bytes exactly
 * - Nothing regenerates text from a model; every byte comes from a token
 *
 * ### 2. Command-Based Editing
 * - All edits are represented as **Commands** (`Cmd` enum)
 * - A command is checked against the target section's capabilities first
 * - The edit is made on the flattened token vector, which is then parsed again
 * - A command that fails, or whose result does not parse, leaves the document
 *   unchanged
 *
 * ### 3. Token Ranges
 * - [`tokens::Flattened`] records the token range of every tree node while
 *   flattening, so statements found in the tree can be located and spliced
 * - Removing lines keeps the comments and blank lines that preceded them
 *
 * ## Module Structure
 *
 * - **`document`**: `SpecDocument` and the `apply` dispatch
 * - **`commands`**: `Cmd`, line selectors and provides entries
 * - **`sections`**: add, remove and replace on sections; sections merge
 * - **`values`**: definition and `%global` value replacement
 * - **`provides`**: `Provides:` listing, removal and insertion
 * - **`install`**: mode rewrites for `install` commands
 * - **`patch`**: what a command changed
 * - **`tokens`**: flat token view and splicing helpers
 */

pub mod commands;
pub mod document;
mod install;
pub mod patch;
mod provides;
mod sections;
pub mod tokens;
mod values;

pub use commands::{Cmd, LineSelector, ProvidesEntry, VERSION_OPERATORS};
pub use document::SpecDocument;
pub use patch::Patch;

pub(crate) use provides::render_provides;
