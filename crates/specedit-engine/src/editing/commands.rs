use std::fmt;

use glob::Pattern;
use specedit_syntax::{SectionId, SpecFile};

use crate::error::EngineError;

/// Editing commands applied to a [`SpecDocument`](super::SpecDocument).
#[derive(Debug, Clone)]
pub enum Cmd {
    /// Append lines to a section body; for the changelog, prepend items.
    AddToSection { target: SectionId, content: String },
    /// Delete the body lines matched by `selector`.
    RemoveFromSection {
        target: SectionId,
        selector: LineSelector,
    },
    /// Replace a whole section body. No section kind supports this.
    ReplaceSection { target: SectionId, content: String },
    /// Set the value of every definition (`Version:`) or macro variable
    /// (`%global commit`) called `name`.
    ReplaceValue { name: String, value: String },
    /// Rewrite the mode of `install` commands in `%install` sections.
    SetInstallMode { mode: String },
    RemoveProvides { entry: ProvidesEntry },
    AddProvides { entry: ProvidesEntry },
    /// Merge the sections of `overlay` into the document.
    MergeSections { overlay: SpecFile },
}

impl Cmd {
    pub fn name(&self) -> &'static str {
        match self {
            Cmd::AddToSection { .. } => "add-to-section",
            Cmd::RemoveFromSection { .. } => "remove-from-section",
            Cmd::ReplaceSection { .. } => "replace-section",
            Cmd::ReplaceValue { .. } => "replace-value",
            Cmd::SetInstallMode { .. } => "set-install-mode",
            Cmd::RemoveProvides { .. } => "remove-provides",
            Cmd::AddProvides { .. } => "add-provides",
            Cmd::MergeSections { .. } => "merge-sections",
        }
    }
}

/// Selects body lines for removal.
#[derive(Debug, Clone)]
pub enum LineSelector {
    /// The whole line, compared without surrounding whitespace.
    Exact(String),
    /// A glob matched against the first word of the line.
    FirstWord(Pattern),
}

impl LineSelector {
    pub fn exact(line: impl Into<String>) -> Self {
        LineSelector::Exact(line.into())
    }

    pub fn first_word(pattern: &str) -> Result<Self, EngineError> {
        Pattern::new(pattern)
            .map(LineSelector::FirstWord)
            .map_err(|e| EngineError::InvalidParameter(format!("bad pattern `{pattern}`: {e}")))
    }

    pub fn matches(&self, line: &str) -> bool {
        match self {
            LineSelector::Exact(expected) => line.trim() == expected.trim(),
            LineSelector::FirstWord(pattern) => line
                .split_whitespace()
                .next()
                .is_some_and(|word| pattern.matches(word)),
        }
    }
}

/// Comparison operators allowed in a versioned dependency.
pub const VERSION_OPERATORS: &[&str] = &["=", "==", "<", "<=", ">", ">="];

/// One entry of a `Provides:` list: `name [op version]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidesEntry {
    pub name: String,
    pub constraint: Option<(String, String)>,
}

impl ProvidesEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
        }
    }

    pub fn parse(text: &str) -> Result<Self, EngineError> {
        let words: Vec<&str> = text.split_whitespace().collect();
        match words.as_slice() {
            [name] => Ok(Self::new(*name)),
            [name, op, version] if VERSION_OPERATORS.contains(op) => Ok(Self {
                name: name.to_string(),
                constraint: Some((op.to_string(), version.to_string())),
            }),
            _ => Err(EngineError::InvalidParameter(format!(
                "`{text}` is not a provides entry (expected `name [op version]`)"
            ))),
        }
    }

    /// True when `other` is selected by this entry.
    ///
    /// The name is a glob; a constraint, when given, must match exactly.
    pub fn selects(&self, other: &ProvidesEntry) -> bool {
        let name_matches = Pattern::new(&self.name)
            .map(|pattern| pattern.matches(&other.name))
            .unwrap_or(self.name == other.name);
        name_matches && (self.constraint.is_none() || self.constraint == other.constraint)
    }
}

impl fmt::Display for ProvidesEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some((op, version)) => write!(f, "{} {op} {version}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
