//! Repositionable token stream used by the parser for backtracking.
//!
//! The stream is an index into an immutable token slice, so saving and
//! restoring a position is a plain integer copy. The final EOF token produced
//! by [`lex`](crate::lexer::lex) is part of the slice; [`TokenStream::get`]
//! hands it out like any other token and fails only once it has been
//! consumed.

use crate::error::ParseError;
use crate::lexer::Token;

/// A saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pointer(usize);

#[derive(Debug, Clone)]
pub struct TokenStream<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> TokenStream<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Return the next token and advance.
    pub fn get(&mut self) -> Result<&'t Token, ParseError> {
        let token = self.tokens.get(self.pos).ok_or(ParseError::EndOfStream)?;
        self.pos += 1;
        Ok(token)
    }

    /// Rewind exactly one token.
    pub fn unget(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    /// Peek at the next token without consuming it.
    pub fn touch(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    pub fn pointer(&self) -> Pointer {
        Pointer(self.pos)
    }

    pub fn set_pointer(&mut self, pointer: Pointer) {
        self.pos = pointer.0.min(self.tokens.len());
    }

    /// True when the next token is the EOF token, or nothing is left.
    pub fn at_eof(&self) -> bool {
        self.touch().is_none_or(Token::is_eof)
    }

    /// True when the next token starts a line and its text is one of `markers`.
    pub fn at_marker(&self, markers: &[&str]) -> bool {
        self.touch()
            .is_some_and(|t| t.is_line_start() && markers.contains(&t.text()))
    }

    /// Consume tokens up to, not including, the first line-start token whose
    /// text is in `stop`, or the EOF token.
    ///
    /// Never fails: at the end of input all remaining tokens are returned.
    pub fn get_while_not(&mut self, stop: &[&str]) -> Vec<Token> {
        self.get_while(|t| !(t.is_line_start() && stop.contains(&t.text())))
    }

    /// Consume tokens while `keep` holds, stopping at the EOF token.
    pub fn get_while(&mut self, mut keep: impl FnMut(&Token) -> bool) -> Vec<Token> {
        let mut taken = Vec::new();
        while let Some(token) = self.touch() {
            if token.is_eof() || !keep(token) {
                break;
            }
            taken.push(token.clone());
            self.pos += 1;
        }
        taken
    }

    /// Consume the rest of the current line (tokens not starting a new line).
    pub fn rest_of_line(&mut self) -> Vec<Token> {
        self.get_while(|t| !t.is_line_start())
    }
}
