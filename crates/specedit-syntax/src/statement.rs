//! Statement tree produced by the parser.
//!
//! Each statement owns the tokens it was parsed from, trivia included, so
//! emitting the tokens of every statement in order reproduces the source.
//! Statements hold no back pointers; use [`SpecFile::syntax`] for a Rowan
//! view with parent navigation.

use std::fmt;

use crate::error::ParseError;
use crate::grammar::{SectionKind, StatementKind, tag_name};
use crate::lexer::{Token, lex};
use crate::parser::Parser;
use crate::sink::{GreenSink, TextSink, TokenSink};
use crate::syntax_kind::{SyntaxKind, SyntaxNode};

/// A parsed spec file: the top-level statements, ending with [`Statement::Eof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFile {
    statements: Vec<Statement>,
}

impl SpecFile {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// Lex and parse `source`.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let tokens = lex(source);
        Parser::new(&tokens).parse()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Visit every statement depth-first, including those inside conditional
    /// branches.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Statement)) {
        walk(&self.statements, f);
    }

    /// All sections in document order, conditional branches included.
    pub fn sections(&self) -> Vec<&Section> {
        let mut sections = Vec::new();
        self.walk(&mut |statement| {
            if let Statement::Section(section) = statement {
                sections.push(section);
            }
        });
        sections
    }

    /// The first section with the given identity.
    pub fn find_section(&self, id: &SectionId) -> Option<&Section> {
        self.sections().into_iter().find(|section| &section.id() == id)
    }

    /// The first changelog, wherever it is.
    pub fn changelog(&self) -> Option<&Changelog> {
        let mut found = None;
        self.walk(&mut |statement| {
            if let Statement::Changelog(changelog) = statement {
                found.get_or_insert(changelog);
            }
        });
        found
    }

    /// The value of the first top-level `Name:` tag.
    pub fn package_name(&self) -> Option<String> {
        self.statements.iter().find_map(|statement| match statement {
            Statement::Definition(definition) if definition.tag() == "name" => {
                Some(definition.value.text())
            }
            _ => None,
        })
    }

    pub fn emit<S: TokenSink + ?Sized>(&self, sink: &mut S) {
        for statement in &self.statements {
            statement.emit(sink);
        }
    }

    /// Build a lossless Rowan tree of the file.
    pub fn syntax(&self) -> SyntaxNode {
        let mut sink = GreenSink::new();
        sink.start_node(SyntaxKind::ROOT);
        self.emit(&mut sink);
        sink.finish_node();
        sink.finish()
    }
}

impl fmt::Display for SpecFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sink = TextSink::new();
        self.emit(&mut sink);
        f.write_str(&sink.finish())
    }
}

fn walk<'a>(statements: &'a [Statement], f: &mut impl FnMut(&'a Statement)) {
    for statement in statements {
        f(statement);
        if let Statement::If(block) = statement {
            walk(&block.true_branch, f);
            if let Some(else_branch) = &block.else_branch {
                walk(&else_branch.statements, f);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    If(IfBlock),
    Definition(Definition),
    Global(Global),
    MacroLine(MacroLine),
    Section(Section),
    Changelog(Changelog),
    Eof(Eof),
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::If(_) => StatementKind::If,
            Statement::Definition(_) => StatementKind::Definition,
            Statement::Global(_) => StatementKind::Global,
            Statement::MacroLine(_) => StatementKind::MacroLine,
            Statement::Section(_) => StatementKind::Section,
            Statement::Changelog(_) => StatementKind::Changelog,
            Statement::Eof(_) => StatementKind::Eof,
        }
    }

    /// The token that opened this statement.
    pub fn first_token(&self) -> &Token {
        match self {
            Statement::If(block) => &block.opener,
            Statement::Definition(definition) => &definition.name,
            Statement::Global(global) => &global.keyword,
            Statement::MacroLine(line) => &line.directive,
            Statement::Section(section) => &section.header,
            Statement::Changelog(changelog) => &changelog.header,
            Statement::Eof(eof) => &eof.token,
        }
    }

    /// Source line where the statement starts (0 for synthesized statements).
    pub fn line(&self) -> u32 {
        self.first_token().line()
    }

    /// Walk the statement's tokens in source order.
    pub fn emit<S: TokenSink + ?Sized>(&self, sink: &mut S) {
        match self {
            Statement::If(block) => block.emit(sink),
            Statement::Definition(definition) => definition.emit(sink),
            Statement::Global(global) => global.emit(sink),
            Statement::MacroLine(line) => line.emit(sink),
            Statement::Section(section) => section.emit(sink),
            Statement::Changelog(changelog) => changelog.emit(sink),
            Statement::Eof(eof) => sink.token(&eof.token),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sink = TextSink::new();
        self.emit(&mut sink);
        f.write_str(&sink.finish())
    }
}

fn emit_tokens<S: TokenSink + ?Sized>(sink: &mut S, tokens: &[Token]) {
    for token in tokens {
        sink.token(token);
    }
}

fn emit_node<S: TokenSink + ?Sized>(sink: &mut S, kind: SyntaxKind, tokens: &[Token]) {
    sink.start_node(kind);
    emit_tokens(sink, tokens);
    sink.finish_node();
}

/// Join token texts with their inner trivia, dropping the leading trivia.
fn join_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            out.push_str(token.trivia());
        }
        out.push_str(token.text());
    }
    out
}

/// A run of tokens used as a value or condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expression {
    pub tokens: Vec<Token>,
}

impl Expression {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The expression text as written, without its leading trivia.
    pub fn text(&self) -> String {
        join_tokens(&self.tokens)
    }
}

/// `%if <cond> ... [%else ...] %endif`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfBlock {
    pub opener: Token,
    pub condition: Expression,
    pub true_branch: Vec<Statement>,
    pub else_branch: Option<ElseBranch>,
    pub endif: Token,
}

impl IfBlock {
    fn emit<S: TokenSink + ?Sized>(&self, sink: &mut S) {
        sink.start_node(SyntaxKind::IF);
        sink.token(&self.opener);
        emit_node(sink, SyntaxKind::CONDITION, &self.condition.tokens);
        sink.start_node(SyntaxKind::BRANCH);
        for statement in &self.true_branch {
            statement.emit(sink);
        }
        sink.finish_node();
        if let Some(else_branch) = &self.else_branch {
            sink.start_node(SyntaxKind::ELSE_BRANCH);
            sink.token(&else_branch.else_token);
            for statement in &else_branch.statements {
                statement.emit(sink);
            }
            sink.finish_node();
        }
        sink.token(&self.endif);
        sink.finish_node();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElseBranch {
    pub else_token: Token,
    pub statements: Vec<Statement>,
}

/// `Tag: value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: Token,
    pub value: Expression,
}

impl Definition {
    /// Lower-cased tag name without qualifier, e.g. `requires`.
    pub fn tag(&self) -> String {
        tag_name(self.name.text())
    }

    fn emit<S: TokenSink + ?Sized>(&self, sink: &mut S) {
        sink.start_node(SyntaxKind::DEFINITION);
        sink.token(&self.name);
        emit_node(sink, SyntaxKind::VALUE, &self.value.tokens);
        sink.finish_node();
    }
}

/// `%global name value` or `%define name value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub keyword: Token,
    pub variable: Token,
    pub value: Expression,
}

impl Global {
    pub fn name(&self) -> &str {
        self.variable.text()
    }

    fn emit<S: TokenSink + ?Sized>(&self, sink: &mut S) {
        sink.start_node(SyntaxKind::GLOBAL);
        sink.token(&self.keyword);
        sink.token(&self.variable);
        emit_node(sink, SyntaxKind::VALUE, &self.value.tokens);
        sink.finish_node();
    }
}

/// Any other line starting with a `%` directive, e.g. `%bcond_without tests`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroLine {
    pub directive: Token,
    pub args: Expression,
}

impl MacroLine {
    fn emit<S: TokenSink + ?Sized>(&self, sink: &mut S) {
        sink.start_node(SyntaxKind::MACRO_LINE);
        sink.token(&self.directive);
        emit_node(sink, SyntaxKind::VALUE, &self.args.tokens);
        sink.finish_node();
    }
}

/// Identity of a section: its kind plus the arguments on its header line.
///
/// `%files devel` and `%files` are different sections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId {
    pub kind: SectionKind,
    pub qualifier: String,
}

impl SectionId {
    pub fn new(kind: SectionKind, qualifier: impl Into<String>) -> Self {
        Self {
            kind,
            qualifier: qualifier.into(),
        }
    }

    /// Parse a header such as `%files devel`.
    pub fn from_header_line(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let kind = SectionKind::from_header(words.next()?)?;
        Some(Self::new(kind, words.collect::<Vec<_>>().join(" ")))
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.qualifier.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} {}", self.kind, self.qualifier)
        }
    }
}

/// A section: its header token and every token up to the next header.
///
/// The header line's arguments are the leading body tokens that do not
/// start a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub header: Token,
    pub body: Vec<Token>,
}

impl Section {
    /// Number of body tokens on the header line.
    pub fn header_args_len(&self) -> usize {
        self.body
            .iter()
            .take_while(|token| !token.is_line_start())
            .count()
    }

    pub fn qualifier(&self) -> String {
        let args = &self.body[..self.header_args_len()];
        args.iter()
            .map(Token::text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn id(&self) -> SectionId {
        SectionId::new(self.kind, self.qualifier())
    }

    /// Body tokens after the header line.
    pub fn content(&self) -> &[Token] {
        &self.body[self.header_args_len()..]
    }

    /// Content grouped into lines.
    pub fn lines(&self) -> Vec<&[Token]> {
        split_lines(self.content())
    }

    fn emit<S: TokenSink + ?Sized>(&self, sink: &mut S) {
        sink.start_node(SyntaxKind::SECTION);
        sink.token(&self.header);
        emit_node(sink, SyntaxKind::SECTION_BODY, &self.body);
        sink.finish_node();
    }
}

/// Group tokens into lines; a new line begins at every line-start token.
pub fn split_lines(tokens: &[Token]) -> Vec<&[Token]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if i > start && token.is_line_start() {
            lines.push(&tokens[start..i]);
            start = i;
        }
    }
    if start < tokens.len() {
        lines.push(&tokens[start..]);
    }
    lines
}

/// `%changelog` followed by its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changelog {
    pub header: Token,
    pub items: Vec<ChangelogItem>,
}

impl Changelog {
    pub fn id(&self) -> SectionId {
        SectionId::new(SectionKind::Changelog, "")
    }

    fn emit<S: TokenSink + ?Sized>(&self, sink: &mut S) {
        sink.start_node(SyntaxKind::CHANGELOG);
        sink.token(&self.header);
        for item in &self.items {
            item.emit(sink);
        }
        sink.finish_node();
    }
}

/// `* Mon Jan 01 2024 Jane Doe <jane@example.com> - 1.0-1` plus message lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogItem {
    pub marker: Token,
    pub date: [Token; 4],
    pub author: Vec<Token>,
    pub email: Token,
    pub delimiter: Token,
    pub version: Token,
    pub message: Vec<Token>,
}

impl ChangelogItem {
    pub fn date_text(&self) -> String {
        join_tokens(&self.date)
    }

    pub fn author_text(&self) -> String {
        join_tokens(&self.author)
    }

    /// Email without the angle brackets.
    pub fn email_address(&self) -> &str {
        self.email
            .text()
            .trim_start_matches('<')
            .trim_end_matches('>')
    }

    pub fn message_text(&self) -> String {
        join_tokens(&self.message)
    }

    fn emit<S: TokenSink + ?Sized>(&self, sink: &mut S) {
        sink.start_node(SyntaxKind::CHANGELOG_ITEM);
        sink.start_node(SyntaxKind::CHANGELOG_HEADER);
        sink.token(&self.marker);
        emit_tokens(sink, &self.date);
        emit_tokens(sink, &self.author);
        sink.token(&self.email);
        sink.token(&self.delimiter);
        sink.token(&self.version);
        sink.finish_node();
        emit_node(sink, SyntaxKind::CHANGELOG_MESSAGE, &self.message);
        sink.finish_node();
    }
}

/// The end of the file, holding trailing trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eof {
    pub token: Token,
}
