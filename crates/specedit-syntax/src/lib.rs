//! # specedit-syntax
//!
//! A lossless syntax tree for RPM spec files, built with [Logos] and
//! viewable as a [Rowan] tree.
//!
//! [Logos]: https://docs.rs/logos
//! [Rowan]: https://docs.rs/rowan
//!
//! ## Lossless Round-Trip
//!
//! Every byte of the input belongs to exactly one token, either as the
//! token's text or as the *trivia* (whitespace, line breaks, comments) in
//! front of it. Statements own their tokens, so serializing an unmodified
//! tree gives back the input byte for byte:
//!
//! ```
//! use specedit_syntax::parse;
//!
//! let source = "Name: hello\n\n# build it\n%build\nmake %{?_smp_mflags}\n";
//! let file = parse(source).unwrap();
//! assert_eq!(file.to_string(), source);
//! ```
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Statements → Sink → Text / Rowan Tree
//!               (Logos)          (speculative descent)
//! ```
//!
//! ### 1. Lexer ([`lexer`] module)
//!
//! Splits the input into words, each carrying the trivia before it, and
//! ends with an EOF token holding the trailing trivia.
//!
//! ### 2. Parser ([`parser`] module)
//!
//! A recursive-descent parser over a [`TokenStream`](stream::TokenStream)
//! that can be rewound. At each position it tries the statement kinds the
//! [`grammar`] tables allow, in a fixed priority order, and backtracks when
//! a candidate fails.
//!
//! ### 3. Statements ([`statement`] module)
//!
//! Conditionals, tag definitions, macro variables, macro lines, sections,
//! the changelog and the end of file. This is the tree edits operate on.
//!
//! ### 4. Sinks ([`sink`] module)
//!
//! Serialization walks the statements and hands tokens to a
//! [`TokenSink`](sink::TokenSink): into a `String`, an `io::Write`, or a
//! Rowan green tree for parent navigation ([`SpecFile::syntax`]).
//!
//! ## Module Structure
//!
//! ```text
//! specedit-syntax/
//! ├── lib.rs           # This file - public API and integration tests
//! ├── syntax_kind.rs   # SyntaxKind enum (tokens + nodes) and Rowan integration
//! ├── lexer.rs         # Logos-based tokenizer
//! ├── stream.rs        # Repositionable token stream
//! ├── grammar.rs       # Statement rules, section kinds, edit capabilities
//! ├── statement.rs     # Statement tree
//! ├── sink.rs          # Text, writer and Rowan sinks
//! ├── error.rs         # ParseError
//! └── parser/
//!     ├── mod.rs       # Body loop and speculative candidate selection
//!     ├── statements.rs# Conditionals, tags, globals, macro lines
//!     └── sections.rs  # Section bodies and the changelog
//! ```

pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod sink;
pub mod statement;
pub mod stream;
pub mod syntax_kind;

pub use error::ParseError;
pub use grammar::{EditCapabilities, EditOperation, KindSet, SectionKind, StatementKind};
pub use lexer::Token;
pub use parser::parse;
pub use statement::{
    Changelog, ChangelogItem, Definition, ElseBranch, Eof, Expression, Global, IfBlock, MacroLine,
    Section, SectionId, SpecFile, Statement,
};
pub use syntax_kind::{SpecLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// Helper to format a syntax tree for snapshot testing.
    fn format_tree(node: &SyntaxNode, indent: usize) -> String {
        let mut result = String::new();
        let prefix = "  ".repeat(indent);

        result.push_str(&format!(
            "{}{:?}@{:?}\n",
            prefix,
            node.kind(),
            node.text_range()
        ));

        for child in node.children_with_tokens() {
            match child {
                rowan::NodeOrToken::Node(n) => {
                    result.push_str(&format_tree(&n, indent + 1));
                }
                rowan::NodeOrToken::Token(t) => {
                    result.push_str(&format!(
                        "{}  {:?}@{:?} {:?}\n",
                        prefix,
                        t.kind(),
                        t.text_range(),
                        t.text()
                    ));
                }
            }
        }

        result
    }

    /// Parse a fixture from src/fixtures and check it survives unchanged.
    /// Called by generated test functions (see build.rs).
    fn roundtrip_fixture(name: &str) {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("src/fixtures")
            .join(format!("{name}.spec"));
        let input = std::fs::read_to_string(&path).unwrap();

        let file = parse(&input).unwrap_or_else(|e| panic!("{name}.spec: {e}"));
        assert_eq!(file.to_string(), input, "text roundtrip of {name}.spec");
        assert_eq!(
            file.syntax().text().to_string(),
            input,
            "tree roundtrip of {name}.spec"
        );
        assert!(matches!(file.statements().last(), Some(Statement::Eof(_))));
    }

    // Generated by build.rs - one test per .spec file in src/fixtures/
    include!(concat!(env!("OUT_DIR"), "/fixture_tests.rs"));

    #[test]
    fn snapshot_definition() {
        let file = parse("Name: x\n").unwrap();
        assert_snapshot!(format_tree(&file.syntax(), 0), @r#"
        ROOT@0..8
          DEFINITION@0..7
            WORD@0..5 "Name:"
            VALUE@5..7
              WHITESPACE@5..6 " "
              WORD@6..7 "x"
          NEWLINE@7..8 "\n"
        "#);
    }

    #[test]
    fn snapshot_conditional() {
        let file = parse("%if a\nName: x\n%endif\n").unwrap();
        assert_snapshot!(format_tree(&file.syntax(), 0), @r#"
        ROOT@0..21
          IF@0..20
            WORD@0..3 "%if"
            CONDITION@3..5
              WHITESPACE@3..4 " "
              WORD@4..5 "a"
            BRANCH@5..13
              DEFINITION@5..13
                NEWLINE@5..6 "\n"
                WORD@6..11 "Name:"
                VALUE@11..13
                  WHITESPACE@11..12 " "
                  WORD@12..13 "x"
            NEWLINE@13..14 "\n"
            WORD@14..20 "%endif"
          NEWLINE@20..21 "\n"
        "#);
    }

    #[rstest]
    #[case("")]
    #[case("\n")]
    #[case("Name: x")]
    #[case("Name: x\r\nVersion: 1\r\n")]
    #[case("# only a comment\n")]
    #[case("%global x 1\n\n\n")]
    #[case("\t%build  \n\tmake\t\n")]
    #[case("%if 1\n%else\n%endif")]
    #[case("%changelog\n* Mon Jan 01 2024 A <a@b> - 1\n")]
    fn roundtrip_preserves_text(#[case] input: &str) {
        let file = parse(input).unwrap();
        assert_eq!(file.to_string(), input, "Roundtrip failed for: {input:?}");
        assert_eq!(file.syntax().text().to_string(), input);
    }

    #[test]
    fn write_sink_matches_display() {
        let source = "Name: x\n%files\n/usr/bin/x\n";
        let file = parse(source).unwrap();
        let mut sink = sink::WriteSink::new(Vec::new());
        file.emit(&mut sink);
        assert_eq!(sink.finish().unwrap(), source.as_bytes());
    }
}
