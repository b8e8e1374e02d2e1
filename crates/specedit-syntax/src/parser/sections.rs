//! Sections and the changelog.
//!
//! A section body is every token up to the next line-start header. Bodies
//! track `%if`/`%endif` depth so that a conditional written inside a
//! scriptlet stays body text, while an `%else`/`%endif` closing a conditional
//! that encloses the whole section ends the body.

use crate::error::ParseError;
use crate::grammar::{
    CHANGELOG_ITEM_MARKER, CHANGELOG_VERSION_DELIMITER, ELSE, ENDIF, IF_OPENERS, SectionKind,
};
use crate::lexer::Token;
use crate::statement::{Changelog, ChangelogItem, Section};

use super::Parser;

/// True for a changelog item marker: `*` at the very start of a line.
fn is_item_marker(token: &Token) -> bool {
    token.text() == CHANGELOG_ITEM_MARKER && token.at_column_zero()
}

fn is_email(token: &Token) -> bool {
    let text = token.text();
    text.len() > 1 && text.starts_with('<') && text.ends_with('>')
}

impl Parser<'_> {
    pub(super) fn section(&mut self) -> Result<Option<Section>, ParseError> {
        let header = self.stream.get()?;
        if !header.is_line_start() {
            return Ok(None);
        }
        let kind = match SectionKind::from_header(header.text()) {
            Some(SectionKind::Changelog) | None => return Ok(None),
            Some(kind) => kind,
        };

        let body = self.body_tokens(kind);
        Ok(Some(Section {
            kind,
            header: header.clone(),
            body,
        }))
    }

    pub(super) fn changelog(&mut self) -> Result<Option<Changelog>, ParseError> {
        let header = self.stream.get()?;
        if !(header.is_line_start() && header.text() == SectionKind::Changelog.header()) {
            return Ok(None);
        }

        let mut items = Vec::new();
        while self.stream.touch().is_some_and(is_item_marker) {
            items.push(self.changelog_item()?);
        }

        Ok(Some(Changelog {
            header: header.clone(),
            items,
        }))
    }

    /// Consume a body of `kind`, stopping before its terminators, an
    /// unbalanced `%else`/`%endif`, or the end of file.
    fn body_tokens(&mut self, kind: SectionKind) -> Vec<Token> {
        let stop = kind.terminators();
        let mut depth = 0usize;
        self.stream.get_while(|token| {
            if !token.is_line_start() {
                return true;
            }
            let text = token.text();
            if stop.contains(&text) && (text != CHANGELOG_ITEM_MARKER || is_item_marker(token)) {
                return false;
            }
            if IF_OPENERS.contains(&text) {
                depth += 1;
            } else if text == ENDIF {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            } else if text == ELSE && depth == 0 {
                return false;
            }
            true
        })
    }

    fn changelog_item(&mut self) -> Result<ChangelogItem, ParseError> {
        let entry = self.stream.pointer();
        let result = self.changelog_item_inner();
        if result.is_err() {
            self.stream.set_pointer(entry);
        }
        result
    }

    fn changelog_item_inner(&mut self) -> Result<ChangelogItem, ParseError> {
        let marker = self.stream.get()?.clone();
        let line = marker.line();

        let date = [
            self.header_field(line, "date")?,
            self.header_field(line, "date")?,
            self.header_field(line, "date")?,
            self.header_field(line, "date")?,
        ];

        let mut author = Vec::new();
        let email = loop {
            let token = self.header_field(line, "email")?;
            if is_email(&token) {
                break token;
            }
            author.push(token);
        };
        if author.is_empty() {
            return Err(ParseError::MalformedChangelogItem {
                line,
                reason: "missing author".to_string(),
            });
        }

        let delimiter = self.header_field(line, "version delimiter")?;
        if delimiter.text() != CHANGELOG_VERSION_DELIMITER {
            return Err(ParseError::MalformedChangelogItem {
                line,
                reason: format!(
                    "expected `{CHANGELOG_VERSION_DELIMITER}` after the email, found `{}`",
                    delimiter.text()
                ),
            });
        }
        let version = self.header_field(line, "version")?;

        let message = self.body_tokens(SectionKind::Changelog);

        Ok(ChangelogItem {
            marker,
            date,
            author,
            email,
            delimiter,
            version,
            message,
        })
    }

    /// Next token of a changelog item header; it must be on the header line.
    fn header_field(&mut self, line: u32, what: &str) -> Result<Token, ParseError> {
        match self.stream.touch() {
            Some(token) if !token.is_eof() && !token.is_line_start() => {
                self.stream.get()?;
                Ok(token.clone())
            }
            _ => Err(ParseError::MalformedChangelogItem {
                line,
                reason: format!("header ends before the {what}"),
            }),
        }
    }
}
