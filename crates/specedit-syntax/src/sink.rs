//! Sinks receiving the token walk of the serializer.
//!
//! [`Statement::emit`](crate::statement::Statement::emit) walks the tree and
//! reports node boundaries and tokens to a [`TokenSink`]. The text sinks
//! ignore the boundaries and reproduce the bytes; [`GreenSink`] turns the same
//! walk into a Rowan green tree.

use std::io;

use rowan::GreenNodeBuilder;

use crate::lexer::{Token, trivia_pieces};
use crate::syntax_kind::{SyntaxKind, SyntaxNode};

/// Receiver of a serialized statement tree.
pub trait TokenSink {
    fn start_node(&mut self, _kind: SyntaxKind) {}

    fn finish_node(&mut self) {}

    fn token(&mut self, token: &Token);
}

/// Collects the serialized bytes into a `String`.
#[derive(Debug, Default)]
pub struct TextSink {
    out: String,
}

impl TextSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl TokenSink for TextSink {
    fn token(&mut self, token: &Token) {
        self.out.push_str(token.trivia());
        self.out.push_str(token.text());
    }
}

/// Streams the serialized bytes into an `io::Write`.
///
/// The first write error is kept and returned by [`WriteSink::finish`];
/// later tokens are dropped.
pub struct WriteSink<W: io::Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: io::Write> WriteSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: io::Write> TokenSink for WriteSink<W> {
    fn token(&mut self, token: &Token) {
        if self.error.is_some() {
            return;
        }
        let result = self
            .writer
            .write_all(token.trivia().as_bytes())
            .and_then(|()| self.writer.write_all(token.text().as_bytes()));
        if let Err(error) = result {
            self.error = Some(error);
        }
    }
}

/// Builds a lossless Rowan tree from the token walk.
///
/// Trivia is split into WHITESPACE, NEWLINE and COMMENT tokens; words become
/// WORD tokens. The empty EOF token is not materialized.
pub struct GreenSink {
    builder: GreenNodeBuilder<'static>,
}

impl Default for GreenSink {
    fn default() -> Self {
        Self::new()
    }
}

impl GreenSink {
    pub fn new() -> Self {
        Self {
            builder: GreenNodeBuilder::new(),
        }
    }

    /// Consume the sink and build the syntax tree.
    pub fn finish(self) -> SyntaxNode {
        SyntaxNode::new_root(self.builder.finish())
    }
}

impl TokenSink for GreenSink {
    fn start_node(&mut self, kind: SyntaxKind) {
        self.builder.start_node(kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn token(&mut self, token: &Token) {
        for (kind, text) in trivia_pieces(token.trivia()) {
            self.builder.token(kind.into(), text);
        }
        if !token.is_eof() {
            self.builder.token(token.kind().into(), token.text());
        }
    }
}
