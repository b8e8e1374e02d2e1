//! Flat token view of a parsed file.
//!
//! Edits are made on the flattened token vector of the whole file and the
//! result is parsed again. [`Flattened`] records the token range of every
//! node while flattening, so a statement found in the tree can be located in
//! the vector.

use std::ops::Range;

use specedit_syntax::lexer::lex;
use specedit_syntax::parser::Parser;
use specedit_syntax::sink::TokenSink;
use specedit_syntax::{SectionId, SpecFile, Statement, SyntaxKind, Token};

use crate::error::EngineError;

/// Token range of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SyntaxKind,
    pub range: Range<usize>,
}

/// A file flattened into tokens, with the range of every node.
#[derive(Debug, Clone)]
pub struct Flattened {
    pub tokens: Vec<Token>,
    spans: Vec<Span>,
}

#[derive(Default)]
struct FlatSink {
    tokens: Vec<Token>,
    open: Vec<(SyntaxKind, usize)>,
    spans: Vec<Span>,
}

impl TokenSink for FlatSink {
    fn start_node(&mut self, kind: SyntaxKind) {
        self.open.push((kind, self.tokens.len()));
    }

    fn finish_node(&mut self) {
        if let Some((kind, start)) = self.open.pop() {
            self.spans.push(Span {
                kind,
                range: start..self.tokens.len(),
            });
        }
    }

    fn token(&mut self, token: &Token) {
        self.tokens.push(token.clone());
    }
}

impl Flattened {
    pub fn new(file: &SpecFile) -> Self {
        let mut sink = FlatSink::default();
        file.emit(&mut sink);
        let mut spans = sink.spans;
        spans.sort_by_key(|span| (span.range.start, std::cmp::Reverse(span.range.end)));
        Self {
            tokens: sink.tokens,
            spans,
        }
    }

    /// Ranges of all nodes of `kind`, in document order.
    pub fn ranges(&self, kind: SyntaxKind) -> Vec<Range<usize>> {
        self.spans
            .iter()
            .filter(|span| span.kind == kind)
            .map(|span| span.range.clone())
            .collect()
    }

    /// First range of a `kind` node lying inside `outer`.
    pub fn child_range(&self, outer: &Range<usize>, kind: SyntaxKind) -> Option<Range<usize>> {
        self.spans
            .iter()
            .find(|span| {
                span.kind == kind && span.range.start >= outer.start && span.range.end <= outer.end
            })
            .map(|span| span.range.clone())
    }

    /// Sections and changelogs with their identity, in document order.
    pub fn sections(&self, file: &SpecFile) -> Vec<(SectionId, Range<usize>)> {
        let mut ids = Vec::new();
        file.walk(&mut |statement| match statement {
            Statement::Section(section) => ids.push(section.id()),
            Statement::Changelog(changelog) => ids.push(changelog.id()),
            _ => {}
        });
        let ranges = self.spans.iter().filter(|span| {
            span.kind == SyntaxKind::SECTION || span.kind == SyntaxKind::CHANGELOG
        });
        ids.into_iter()
            .zip(ranges.map(|span| span.range.clone()))
            .collect()
    }

    /// Parse the edited tokens back into a file.
    pub fn reparse(&self) -> Result<SpecFile, EngineError> {
        Ok(Parser::new(&self.tokens).parse()?)
    }
}

/// Lines of a section's content, skipping the header and its arguments.
pub fn content_lines(tokens: &[Token], section: &Range<usize>) -> Vec<Range<usize>> {
    let mut start = section.start + 1;
    while start < section.end && !tokens[start].is_line_start() {
        start += 1;
    }
    line_ranges(tokens, start..section.end)
}

/// Split `range` into lines; each line begins at a line-start token.
pub fn line_ranges(tokens: &[Token], range: Range<usize>) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = range.start;
    for i in range.clone() {
        if i > start && tokens[i].is_line_start() {
            lines.push(start..i);
            start = i;
        }
    }
    if start < range.end {
        lines.push(start..range.end);
    }
    lines
}

/// Text of a token run without its leading trivia.
pub fn text_of(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            out.push_str(token.trivia());
        }
        out.push_str(token.text());
    }
    out
}

/// Remove `range`, keeping the comments and blank lines that preceded it.
///
/// Everything in the first removed token's trivia up to its last line break
/// is moved in front of the token following the range.
pub fn remove_tokens(tokens: &mut Vec<Token>, range: Range<usize>) {
    if range.is_empty() {
        return;
    }
    let kept = match tokens[range.start].trivia().rfind('\n') {
        Some(at) => tokens[range.start].trivia()[..at].to_string(),
        None => String::new(),
    };
    let end = range.end;
    if !kept.is_empty() && end < tokens.len() {
        let next = &tokens[end];
        tokens[end] = next.with_trivia(format!("{kept}{}", next.trivia()));
    }
    tokens.drain(range);
}

/// Line ending used by the file: `\r\n` when its first line break is one.
pub fn line_ending(tokens: &[Token]) -> &'static str {
    let first_break = tokens
        .iter()
        .flat_map(|token| [token.trivia(), token.text()])
        .find_map(|text| text.find('\n').map(|at| text[..at].ends_with('\r')));
    match first_break {
        Some(true) => "\r\n",
        _ => "\n",
    }
}

/// Rewrite every line break in `text` as `eol`.
pub fn with_line_ending(text: &str, eol: &str) -> String {
    let text = text.replace("\r\n", "\n");
    if eol == "\n" { text } else { text.replace('\n', eol) }
}

/// Lex `content` into tokens that start on a new line, breaking lines with
/// `eol`.
///
/// Returns the tokens and any comment trailing the content, which belongs in
/// front of whatever follows the insertion point.
pub fn lex_lines(content: &str, eol: &str) -> (Vec<Token>, String) {
    let mut tokens = lex(&with_line_ending(content, eol));
    let trailing = tokens
        .pop()
        .map(|eof| eof.trivia().to_string())
        .unwrap_or_default();
    if let Some(first) = tokens.first_mut() {
        *first = first.with_trivia(format!("{eol}{}", first.trivia()));
    }
    let trailing = if trailing.trim().is_empty() {
        String::new()
    } else {
        format!("{eol}{}", trailing.trim_matches(['\r', '\n']))
    };
    (tokens, trailing)
}

/// Insert `new` before index `at`, prepending `trailing` to the token at `at`.
pub fn insert_tokens(tokens: &mut Vec<Token>, at: usize, new: Vec<Token>, trailing: &str) {
    if !trailing.is_empty() && at < tokens.len() {
        let next = &tokens[at];
        tokens[at] = next.with_trivia(format!("{trailing}{}", next.trivia()));
    }
    tokens.splice(at..at, new);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(tokens: &[Token]) -> String {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn records_section_ranges() {
        let file = SpecFile::parse("Name: x\n%files\n/a\n%files devel\n/b\n").unwrap();
        let flat = Flattened::new(&file);
        let sections = flat.sections(&file);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].0.to_string(), "%files");
        assert_eq!(sections[1].0.to_string(), "%files devel");
        assert_eq!(text_of(&flat.tokens[sections[1].1.clone()]), "%files devel\n/b");
    }

    #[test]
    fn content_lines_skip_header_arguments() {
        let file = SpecFile::parse("%files -n foo\n/a\n/b c\n").unwrap();
        let flat = Flattened::new(&file);
        let range = flat.sections(&file)[0].1.clone();
        let lines: Vec<String> = content_lines(&flat.tokens, &range)
            .into_iter()
            .map(|line| text_of(&flat.tokens[line]))
            .collect();
        assert_eq!(lines, vec!["/a", "/b c"]);
    }

    #[test]
    fn remove_keeps_preceding_comment() {
        let mut tokens = lex("a\n# about b\nb\nc\n");
        remove_tokens(&mut tokens, 1..2);
        assert_eq!(render(&tokens), "a\n# about b\nc\n");
    }

    #[test]
    fn remove_keeps_blank_line() {
        let mut tokens = lex("a\n\nb\nc\n");
        remove_tokens(&mut tokens, 1..2);
        assert_eq!(render(&tokens), "a\n\nc\n");
    }

    #[test]
    fn lex_lines_starts_on_new_line() {
        let (tokens, trailing) = lex_lines("x y\nz\n", "\n");
        assert_eq!(render(&tokens), "\nx y\nz");
        assert_eq!(trailing, "");
        assert!(tokens[0].is_line_start());
    }

    #[test]
    fn lex_lines_keeps_trailing_comment() {
        let (tokens, trailing) = lex_lines("x\n# done\n", "\n");
        assert_eq!(render(&tokens), "\nx");
        assert_eq!(trailing, "\n# done");
    }

    #[test]
    fn reparse_after_edit() {
        let file = SpecFile::parse("%build\nmake\n").unwrap();
        let mut flat = Flattened::new(&file);
        let (new, trailing) = lex_lines("make check", line_ending(&flat.tokens));
        let at = flat.tokens.len() - 1;
        insert_tokens(&mut flat.tokens, at, new, &trailing);
        assert_eq!(flat.reparse().unwrap().to_string(), "%build\nmake\nmake check\n");
    }

    #[test]
    fn detects_crlf_files() {
        assert_eq!(line_ending(&lex("Name: x\r\nVersion: 1\r\n")), "\r\n");
        assert_eq!(line_ending(&lex("Name: x\nVersion: 1\r\n")), "\n");
        assert_eq!(line_ending(&lex("Name: x")), "\n");
    }

    #[test]
    fn lex_lines_uses_crlf() {
        let (tokens, trailing) = lex_lines("a\nb\r\n# c\n", "\r\n");
        assert_eq!(render(&tokens), "\r\na\r\nb");
        assert_eq!(trailing, "\r\n# c");
    }
}
