//! Mode rewrites for `install` commands in `%install` sections.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use specedit_syntax::{SectionKind, SpecFile, Token};

use super::sections::Edited;
use super::tokens::{Flattened, content_lines};
use crate::error::EngineError;

static MODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-7]{3,4}$").unwrap());

/// Words that end one shell command on a line.
const COMMAND_SEPARATORS: &[&str] = &["&&", "||", ";", "|"];

fn is_install_command(word: &str) -> bool {
    matches!(word, "install" | "%{__install}" | "%__install") || word.ends_with("/install")
}

/// Rewrite the mode arguments of the install command starting at `tokens[0]`.
fn rewrite_modes(tokens: &mut [Token], mode: &str) -> usize {
    let mut rewritten = 0;
    let mut i = 1;
    while i < tokens.len() && !COMMAND_SEPARATORS.contains(&tokens[i].text()) {
        let text = tokens[i].text();
        let replacement = if text == "-m" {
            if let Some(argument) = tokens.get_mut(i + 1) {
                *argument = Token::word(argument.trivia(), mode);
                rewritten += 1;
            }
            i += 1;
            None
        } else if text.starts_with("--mode=") {
            Some(format!("--mode={mode}"))
        } else if text.len() > 2 && text.starts_with("-m") && MODE.is_match(&text[2..]) {
            Some(format!("-m{mode}"))
        } else {
            None
        };
        if let Some(text) = replacement {
            tokens[i] = Token::word(tokens[i].trivia(), text);
            rewritten += 1;
        }
        i += 1;
    }
    rewritten
}

/// Set the mode of every `install` invocation in the `%install` sections.
pub(crate) fn set_install_mode(file: &SpecFile, mode: &str) -> Result<Edited, EngineError> {
    if !MODE.is_match(mode) {
        return Err(EngineError::InvalidParameter(format!(
            "`{mode}` is not an octal file mode"
        )));
    }

    let mut flat = Flattened::new(file);
    let sections: Vec<_> = flat
        .sections(file)
        .into_iter()
        .filter(|(id, _)| id.kind == SectionKind::Install)
        .collect();
    if sections.is_empty() {
        return Err(EngineError::SectionNotFound(
            SectionKind::Install.header().to_string(),
        ));
    }

    let mut touched = Vec::new();
    for (id, range) in sections {
        let mut rewritten = 0;
        for line in content_lines(&flat.tokens, &range) {
            let tokens = &mut flat.tokens[line];
            let starts: Vec<usize> = (0..tokens.len())
                .filter(|&i| is_install_command(tokens[i].text()))
                .collect();
            for start in starts {
                rewritten += rewrite_modes(&mut tokens[start..], mode);
            }
        }
        if rewritten > 0 {
            debug!("rewrote {rewritten} mode argument(s) in {id}");
            touched.push(id);
        }
    }

    if touched.is_empty() {
        return Ok((file.clone(), touched));
    }
    Ok((flat.reparse()?, touched))
}
