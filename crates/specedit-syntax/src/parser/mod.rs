//! # Parser - Speculative Statement Parsing
//!
//! Turns the token vector from [`lex`](crate::lexer::lex) into a
//! [`SpecFile`]: an ordered list of [`Statement`]s whose tokens, emitted in
//! order, reproduce the input exactly.
//!
//! ## The Body Loop
//!
//! [`Parser::body`] parses a sequence of statements. At every position it
//! builds the candidate set (the kinds the [`Context`] allows, intersected
//! with the successors of the previous statement, see
//! [`Rule`](crate::grammar::Rule)) and tries the candidates in
//! [`StatementKind::PRIORITY`] order:
//!
//! ```text
//! If → Global → Definition → Changelog → Section → MacroLine → Eof
//! ```
//!
//! Each candidate either:
//!
//! - returns `Ok(Some(statement))` and the loop moves on,
//! - returns `Ok(None)` because its leading token is not what it looks for,
//! - or returns `Err` because it recognized its leading token but the rest
//!   was malformed.
//!
//! After a failed candidate the stream is restored to where the attempt
//! started. When no candidate succeeds, the first recorded error is
//! returned, or [`ParseError::UnexpectedToken`] if every candidate simply
//! declined.
//!
//! ## Nesting
//!
//! `%if` recursively parses its branches with a context whose terminators
//! are `%else` / `%endif`. Nesting deeper than [`MAX_NESTING`] levels is
//! rejected with [`ParseError::NestingTooDeep`] rather than risking the stack.
//!
//! ## Module Structure
//!
//! - `statements` - conditionals, tags, macro variables, macro lines, EOF
//! - `sections` - section bodies and the changelog

mod sections;
mod statements;

use log::{debug, trace};

use crate::error::ParseError;
use crate::grammar::{KindSet, StatementKind};
use crate::lexer::{Token, lex};
use crate::statement::{SpecFile, Statement};
use crate::stream::TokenStream;

/// Maximum depth of nested conditionals.
pub const MAX_NESTING: usize = 64;

/// Parse spec file source into a statement tree.
///
/// ```
/// use specedit_syntax::parse;
///
/// let source = "Name: hello\n%build\nmake\n";
/// let file = parse(source).unwrap();
/// assert_eq!(file.to_string(), source);
/// ```
pub fn parse(source: &str) -> Result<SpecFile, ParseError> {
    let tokens = lex(source);
    Parser::new(&tokens).parse()
}

/// What the surrounding construct allows inside a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Statement kinds permitted anywhere in the body.
    pub allowed: KindSet,
    /// Line-start markers that end the body without being consumed.
    pub terminators: Vec<&'static str>,
    /// Number of enclosing conditionals.
    pub depth: usize,
}

impl Context {
    /// The context of a whole file.
    pub fn root() -> Self {
        Self {
            allowed: KindSet::ALL,
            terminators: Vec::new(),
            depth: 0,
        }
    }

    /// Context of a body nested inside a statement of `kind`.
    ///
    /// A nested body cannot contain the end of file and also stops at the
    /// terminators of `kind`.
    pub fn nested(&self, kind: StatementKind) -> Self {
        let mut terminators = self.terminators.clone();
        for marker in kind.rule().terminators {
            if !terminators.contains(marker) {
                terminators.push(marker);
            }
        }
        Self {
            allowed: self.allowed.without(StatementKind::Eof),
            terminators,
            depth: self.depth + 1,
        }
    }
}

/// Recursive-descent parser over a repositionable token stream.
pub struct Parser<'t> {
    stream: TokenStream<'t>,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self::from_stream(TokenStream::new(tokens))
    }

    pub fn from_stream(stream: TokenStream<'t>) -> Self {
        Self { stream }
    }

    /// Parse the whole stream as a file.
    pub fn parse(mut self) -> Result<SpecFile, ParseError> {
        let statements = self.body(&Context::root())?;
        debug!("parsed {} top-level statements", statements.len());
        Ok(SpecFile::new(statements))
    }

    /// Give the stream back, positioned after whatever was parsed.
    pub fn into_stream(self) -> TokenStream<'t> {
        self.stream
    }

    /// Parse statements until a terminator of `ctx`, the end of file, or a
    /// position where nothing fits.
    pub fn body(&mut self, ctx: &Context) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        let mut allowed = ctx.allowed;

        while let Some(next) = self.stream.touch() {
            if self.stream.at_marker(&ctx.terminators) {
                break;
            }
            // A nested body leaves the end of file to its opener to report.
            if next.is_eof() && !allowed.contains(StatementKind::Eof) {
                break;
            }

            let statement = self.statement(allowed, ctx)?;
            let kind = statement.kind();
            statements.push(statement);
            if kind == StatementKind::Eof {
                break;
            }
            allowed = ctx.allowed.intersect(kind.rule().successors);
        }

        Ok(statements)
    }

    /// Try every allowed kind at the current position.
    fn statement(&mut self, allowed: KindSet, ctx: &Context) -> Result<Statement, ParseError> {
        let start = self.stream.pointer();
        let mut failure: Option<ParseError> = None;

        for kind in allowed.iter() {
            trace!("trying {kind} at {start:?}");
            match self.attempt(kind, ctx) {
                Ok(Some(statement)) => return Ok(statement),
                Ok(None) => {}
                Err(error) => {
                    debug!("backtracking from {kind}: {error}");
                    failure.get_or_insert(error);
                }
            }
            self.stream.set_pointer(start);
        }

        Err(failure.unwrap_or_else(|| self.unexpected(allowed, ctx)))
    }

    fn attempt(&mut self, kind: StatementKind, ctx: &Context) -> Result<Option<Statement>, ParseError> {
        Ok(match kind {
            StatementKind::If => self.if_block(ctx)?.map(Statement::If),
            StatementKind::Global => self.global()?.map(Statement::Global),
            StatementKind::Definition => self.definition()?.map(Statement::Definition),
            StatementKind::Changelog => self.changelog()?.map(Statement::Changelog),
            StatementKind::Section => self.section()?.map(Statement::Section),
            StatementKind::MacroLine => self.macro_line()?.map(Statement::MacroLine),
            StatementKind::Eof => self.eof()?.map(Statement::Eof),
        })
    }

    fn unexpected(&self, allowed: KindSet, ctx: &Context) -> ParseError {
        let mut expected = allowed.to_string();
        if !ctx.terminators.is_empty() {
            if !expected.is_empty() {
                expected.push_str(" or ");
            }
            expected.push_str(&ctx.terminators.join(" or "));
        }
        match self.stream.touch() {
            Some(token) => ParseError::UnexpectedToken {
                found: if token.is_eof() {
                    "<eof>".to_string()
                } else {
                    token.text().to_string()
                },
                line: token.line(),
                expected,
            },
            None => ParseError::EndOfStream,
        }
    }

    /// Rest of the current line, following trailing-backslash continuations.
    fn line_value(&mut self) -> Vec<Token> {
        let mut tokens = self.stream.rest_of_line();
        while tokens.last().is_some_and(|t| t.text().ends_with('\\')) && !self.stream.at_eof() {
            let Ok(first) = self.stream.get() else {
                break;
            };
            tokens.push(first.clone());
            tokens.extend(self.stream.rest_of_line());
        }
        tokens
    }
}
