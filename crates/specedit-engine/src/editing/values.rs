//! Value edits on tag definitions and macro variables.

use log::debug;
use specedit_syntax::grammar::{is_definition_tag, tag_name};
use specedit_syntax::lexer::lex;
use specedit_syntax::{SpecFile, SyntaxKind, Token};

use super::tokens::Flattened;
use crate::error::EngineError;

/// What a value name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ValueTarget {
    /// A tag such as `Version`, compared case-insensitively.
    Tag(String),
    /// A `%global`/`%define` variable.
    Macro(String),
}

impl ValueTarget {
    fn parse(name: &str) -> Result<Self, EngineError> {
        let name = name.trim();
        let keyword = name
            .strip_prefix("%global")
            .or_else(|| name.strip_prefix("%define"))
            .map(str::trim);
        let is_macro = keyword.is_some();
        let name = keyword.unwrap_or(name);
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(EngineError::InvalidParameter(format!(
                "`{name}` is not a tag or macro name"
            )));
        }

        let tag = format!("{}:", name.trim_end_matches(':'));
        if !is_macro && is_definition_tag(&tag) {
            Ok(ValueTarget::Tag(tag_name(&tag)))
        } else {
            Ok(ValueTarget::Macro(name.to_string()))
        }
    }
}

/// Set the value of every definition or global called `name`.
pub(crate) fn replace_value(
    file: &SpecFile,
    name: &str,
    value: &str,
) -> Result<SpecFile, EngineError> {
    if value.contains('\n') {
        return Err(EngineError::InvalidParameter(
            "a value must fit on one line".to_string(),
        ));
    }
    if value.trim_start().starts_with('#') {
        return Err(EngineError::InvalidParameter(
            "a value cannot start with `#`".to_string(),
        ));
    }
    let target = ValueTarget::parse(name)?;
    let mut flat = Flattened::new(file);

    let node_kind = match target {
        ValueTarget::Tag(_) => SyntaxKind::DEFINITION,
        ValueTarget::Macro(_) => SyntaxKind::GLOBAL,
    };
    let mut values = Vec::new();
    for node in flat.ranges(node_kind) {
        let matches = match &target {
            ValueTarget::Tag(tag) => tag_name(flat.tokens[node.start].text()) == *tag,
            ValueTarget::Macro(variable) => flat.tokens[node.start + 1].text() == variable,
        };
        if matches && let Some(range) = flat.child_range(&node, SyntaxKind::VALUE) {
            values.push(range);
        }
    }
    if values.is_empty() {
        return Err(EngineError::DefinitionNotFound(name.to_string()));
    }

    for range in values.iter().rev() {
        let spacing = flat
            .tokens
            .get(range.start)
            .filter(|_| !range.is_empty())
            .map(|first| first.trivia().to_string())
            .unwrap_or_else(|| " ".to_string());
        let mut new: Vec<Token> = lex(value.trim());
        new.pop();
        if let Some(first) = new.first_mut() {
            *first = Token::word(spacing, first.text());
        }
        flat.tokens.splice(range.clone(), new);
    }
    debug!("replaced {} value(s) of {name}", values.len());
    flat.reparse()
}
