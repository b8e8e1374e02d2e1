//! # Lexer - Tokenizing Spec File Source
//!
//! This module provides the first stage of parsing: breaking source text into
//! tokens using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! The most important property of this lexer is that **every byte in the input
//! appears in exactly one token**, either as its text or as the trivia that
//! precedes it. Nothing is skipped or discarded. This is what makes
//! round-tripping possible:
//!
//! ```
//! use specedit_syntax::lexer::lex;
//!
//! let input = "Name: hello\n# comment\n%build\n";
//! let tokens = lex(input);
//!
//! // Concatenating trivia and text of all tokens gives back the original
//! let reconstructed: String = tokens.iter().map(|t| t.to_string()).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Two Stages
//!
//! Logos produces **raw pieces** ([`RawKind`]): whitespace runs, line endings
//! and words (maximal runs of non-whitespace). [`lex`] then groups them into
//! [`Token`]s: whitespace, newlines and comments accumulate as *trivia*, and
//! each word becomes a token carrying the trivia that preceded it.
//!
//! A word starting with `#` that is the first word on its line opens a
//! comment. The comment runs to the end of the line and is trivia, so
//! `# %build` never looks like a section header to the parser.
//!
//! The trivia after the last word belongs to a final [`SyntaxKind::EOF`]
//! token with empty text. Every token vector returned by [`lex`] ends with
//! exactly one such token.
//!
//! ## Public API
//!
//! - [`lex`] - Tokenize input, returning `Vec<Token>`
//! - [`trivia_pieces`] - Split trivia back into whitespace/newline/comment
//! - [`Token`] - A word (or EOF) with its preceding trivia

use std::fmt;
use std::ops::Range;

use logos::Logos;

use crate::syntax_kind::SyntaxKind;

/// Raw piece kinds produced by the Logos lexer.
///
/// A stray `\r` that is not part of a CRLF line ending matches nothing and
/// is reported as a lexer error; [`lex`] keeps it as whitespace trivia.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    /// Horizontal whitespace (spaces, tabs)
    #[regex(r"[ \t]+")]
    Whitespace,

    /// Line ending (LF or CRLF)
    #[regex(r"\r?\n")]
    Newline,

    /// Anything that is not whitespace
    #[regex(r"[^ \t\r\n]+")]
    Word,
}

/// A lexed token: a word (or the end of file) plus the trivia preceding it.
///
/// Tokens are immutable. Edits build new tokens (see [`Token::word`] and
/// [`Token::with_trivia`]) instead of changing existing ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: SyntaxKind,
    trivia: String,
    text: String,
    line: u32,
    line_start: bool,
}

impl Token {
    /// Build a word token outside the lexer, e.g. for inserted content.
    ///
    /// The token counts as the first on its line when its trivia contains a
    /// line break. Synthesized tokens carry line 0.
    pub fn word(trivia: impl Into<String>, text: impl Into<String>) -> Self {
        let trivia = trivia.into();
        let line_start = trivia.contains('\n');
        Self {
            kind: SyntaxKind::WORD,
            trivia,
            text: text.into(),
            line: 0,
            line_start,
        }
    }

    /// A copy of this token with different preceding trivia.
    pub fn with_trivia(&self, trivia: impl Into<String>) -> Self {
        let trivia = trivia.into();
        let line_start = match self.kind {
            SyntaxKind::EOF => true,
            _ => trivia.contains('\n') || (self.line_start && !self.trivia.contains('\n')),
        };
        Self {
            trivia,
            line_start,
            ..self.clone()
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    /// The token's own text, without trivia.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whitespace, newlines and comments that preceded the token.
    pub fn trivia(&self) -> &str {
        &self.trivia
    }

    /// 1-based line of the token's text in the source it was lexed from.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// True when only whitespace separates this token from the start of its line.
    pub fn is_line_start(&self) -> bool {
        self.line_start
    }

    /// True when the token starts its line without indentation.
    pub fn at_column_zero(&self) -> bool {
        self.line_start && (self.trivia.is_empty() || self.trivia.ends_with('\n'))
    }

    pub fn is_eof(&self) -> bool {
        self.kind == SyntaxKind::EOF
    }

    /// True when the token starts with the directive sigil `%`.
    pub fn is_directive(&self) -> bool {
        self.text.starts_with('%')
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.trivia)?;
        f.write_str(&self.text)
    }
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens, and
/// that the last token is the EOF token.
pub fn lex(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = RawKind::lexer(input);

    let mut trivia = String::new();
    let mut line = 1;
    let mut at_line_start = true;
    let mut in_comment = false;

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        match result {
            Ok(RawKind::Newline) => {
                trivia.push_str(text);
                line += 1;
                at_line_start = true;
                in_comment = false;
            }
            Ok(RawKind::Word) if in_comment => trivia.push_str(text),
            Ok(RawKind::Word) if at_line_start && text.starts_with('#') => {
                in_comment = true;
                trivia.push_str(text);
            }
            Ok(RawKind::Word) => {
                tokens.push(Token {
                    kind: SyntaxKind::WORD,
                    trivia: std::mem::take(&mut trivia),
                    text: text.to_string(),
                    line,
                    line_start: at_line_start,
                });
                at_line_start = false;
            }
            // Logos error means a stray carriage return - keep it as trivia
            Ok(RawKind::Whitespace) | Err(()) => trivia.push_str(text),
        }
    }

    tokens.push(Token {
        kind: SyntaxKind::EOF,
        trivia,
        text: String::new(),
        line,
        line_start: true,
    });

    tokens
}

/// Split a trivia string into whitespace, newline and comment pieces.
///
/// Used when building the CST, where trivia are separate tokens.
pub fn trivia_pieces(trivia: &str) -> Vec<(SyntaxKind, &str)> {
    let mut pieces: Vec<(SyntaxKind, Range<usize>)> = Vec::new();
    let mut in_comment = false;

    for (result, span) in RawKind::lexer(trivia).spanned() {
        let kind = match result {
            Ok(RawKind::Newline) => {
                in_comment = false;
                SyntaxKind::NEWLINE
            }
            Ok(RawKind::Word) => {
                in_comment = true;
                SyntaxKind::COMMENT
            }
            _ if in_comment => SyntaxKind::COMMENT,
            _ => SyntaxKind::WHITESPACE,
        };

        match pieces.last_mut() {
            Some((last, range)) if *last == kind && kind != SyntaxKind::NEWLINE => {
                range.end = span.end;
            }
            _ => pieces.push((kind, span)),
        }
    }

    pieces
        .into_iter()
        .map(|(kind, range)| (kind, &trivia[range]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(tokens: &[Token]) -> Vec<(&str, &str)> {
        tokens.iter().map(|t| (t.trivia(), t.text())).collect()
    }

    #[test]
    fn lex_empty_input() {
        let tokens = lex("");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_eof());
        assert_eq!(tokens[0].trivia(), "");
    }

    #[test]
    fn lex_words_carry_preceding_trivia() {
        let tokens = lex("Name:  foo\n");
        assert_eq!(texts(&tokens), vec![("", "Name:"), ("  ", "foo"), ("\n", "")]);
    }

    #[test]
    fn lex_marks_line_start() {
        let tokens = lex("%global foo bar\n  %build\n");
        let starts: Vec<bool> = tokens.iter().map(Token::is_line_start).collect();
        assert_eq!(starts, vec![true, false, false, true, true]);
    }

    #[test]
    fn lex_tracks_lines() {
        let tokens = lex("a\n\nb c\n");
        let lines: Vec<u32> = tokens.iter().map(Token::line).collect();
        assert_eq!(lines, vec![1, 3, 3, 4]);
    }

    #[test]
    fn lex_line_start_hash_is_comment() {
        let tokens = lex("# %build is not a header\n%install\n");
        assert_eq!(
            texts(&tokens),
            vec![("# %build is not a header\n", "%install"), ("\n", "")]
        );
    }

    #[test]
    fn lex_indented_hash_is_comment() {
        let tokens = lex("make\n    # just a note\nmake install\n");
        assert_eq!(tokens[1].trivia(), "\n    # just a note\n");
        assert_eq!(tokens[1].text(), "make");
    }

    #[test]
    fn lex_mid_line_hash_is_a_word() {
        let tokens = lex("echo # not a comment\n");
        assert_eq!(tokens[1].text(), "#");
        assert_eq!(tokens[2].text(), "not");
    }

    #[test]
    fn lex_crlf_line_endings() {
        let tokens = lex("a\r\nb\r\n");
        assert_eq!(texts(&tokens), vec![("", "a"), ("\r\n", "b"), ("\r\n", "")]);
    }

    #[test]
    fn lex_stray_carriage_return_is_trivia() {
        let tokens = lex("a\rb");
        assert_eq!(texts(&tokens), vec![("", "a"), ("\r", "b"), ("", "")]);
    }

    #[test]
    fn all_bytes_preserved() {
        let input = "Name: x\n# c\n%if 0%{?rhel}\n\tRequires: y\n%endif\n\n";
        let reconstructed: String = lex(input).iter().map(|t| t.to_string()).collect();
        assert_eq!(input, reconstructed);
    }

    #[test]
    fn synthesized_word_line_start_follows_trivia() {
        assert!(Token::word("\n", "Provides:").is_line_start());
        assert!(!Token::word(" ", "foo").is_line_start());
    }

    #[test]
    fn with_trivia_keeps_text() {
        let token = Token::word(" ", "foo");
        let moved = token.with_trivia("\n\n");
        assert_eq!(moved.text(), "foo");
        assert_eq!(moved.trivia(), "\n\n");
        assert!(moved.is_line_start());
    }

    #[test]
    fn trivia_pieces_split_kinds() {
        let pieces = trivia_pieces("\n  # note here\n\t");
        assert_eq!(
            pieces,
            vec![
                (SyntaxKind::NEWLINE, "\n"),
                (SyntaxKind::WHITESPACE, "  "),
                (SyntaxKind::COMMENT, "# note here"),
                (SyntaxKind::NEWLINE, "\n"),
                (SyntaxKind::WHITESPACE, "\t"),
            ]
        );
    }
}
