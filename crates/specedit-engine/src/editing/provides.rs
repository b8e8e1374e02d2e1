//! `Provides:` lists in the preamble and in `%package` bodies.

use std::ops::Range;

use glob::Pattern;
use log::debug;
use specedit_syntax::grammar::{is_definition_tag, tag_name};
use specedit_syntax::lexer::lex;
use specedit_syntax::{SectionKind, SpecFile, SyntaxKind, Token};

use super::commands::{ProvidesEntry, VERSION_OPERATORS};
use super::tokens::{Flattened, content_lines, line_ending, remove_tokens};
use crate::error::EngineError;

const PROVIDES_TAG: &str = "Provides:";

/// One `Provides:` line located in the flattened token vector.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProvidesLine {
    package: String,
    tag: usize,
    value: Range<usize>,
}

fn is_provides_tag(token: &Token) -> bool {
    is_definition_tag(token.text()) && tag_name(token.text()) == "provides"
}

/// Name of the package a `%package` qualifier declares.
fn package_label(main: &str, qualifier: &str) -> String {
    match qualifier.strip_prefix("-n") {
        Some(name) => name.trim().to_string(),
        None if qualifier.is_empty() => main.to_string(),
        None => format!("{main}-{qualifier}"),
    }
}

fn provides_lines(file: &SpecFile, flat: &Flattened) -> Vec<ProvidesLine> {
    let main = file.package_name().unwrap_or_else(|| "main".to_string());
    let mut lines = Vec::new();

    for node in flat.ranges(SyntaxKind::DEFINITION) {
        if is_provides_tag(&flat.tokens[node.start]) {
            lines.push(ProvidesLine {
                package: main.clone(),
                tag: node.start,
                value: node.start + 1..node.end,
            });
        }
    }

    for (id, range) in flat.sections(file) {
        if id.kind != SectionKind::Package {
            continue;
        }
        for line in content_lines(&flat.tokens, &range) {
            if is_provides_tag(&flat.tokens[line.start]) {
                lines.push(ProvidesLine {
                    package: package_label(&main, &id.qualifier),
                    tag: line.start,
                    value: line.start + 1..line.end,
                });
            }
        }
    }

    lines.sort_by_key(|line| line.tag);
    lines
}

/// Split a provides value into entries; also reports whether commas were used.
fn parse_entries(tokens: &[Token]) -> (Vec<ProvidesEntry>, bool) {
    let uses_commas = tokens.iter().any(|t| t.text().contains(','));
    let pieces: Vec<&str> = tokens
        .iter()
        .flat_map(|t| t.text().split(','))
        .filter(|piece| !piece.is_empty())
        .collect();

    let mut entries = Vec::new();
    let mut i = 0;
    while i < pieces.len() {
        match pieces.get(i + 1..i + 3) {
            Some([op, version]) if VERSION_OPERATORS.contains(op) => {
                entries.push(ProvidesEntry {
                    name: pieces[i].to_string(),
                    constraint: Some((op.to_string(), version.to_string())),
                });
                i += 3;
            }
            _ => {
                entries.push(ProvidesEntry::new(pieces[i]));
                i += 1;
            }
        }
    }
    (entries, uses_commas)
}

fn value_tokens(text: &str, spacing: &str) -> Vec<Token> {
    let mut tokens = lex(text);
    tokens.pop();
    if let Some(first) = tokens.first_mut() {
        *first = Token::word(spacing, first.text());
    }
    tokens
}

/// List every entry whose name matches `pattern`, as `<package>: <entry>` lines.
pub(crate) fn render_provides(file: &SpecFile, pattern: &Pattern) -> String {
    let flat = Flattened::new(file);
    let mut out = String::new();
    for line in provides_lines(file, &flat) {
        let (entries, _) = parse_entries(&flat.tokens[line.value.clone()]);
        for entry in entries.iter().filter(|e| pattern.matches(&e.name)) {
            out.push_str(&format!("{}: {entry}\n", line.package));
        }
    }
    out
}

/// Remove the entries selected by `entry`; lines left empty are deleted.
///
/// Returns `None` when nothing matched.
pub(crate) fn remove_provides(
    file: &SpecFile,
    entry: &ProvidesEntry,
) -> Result<Option<SpecFile>, EngineError> {
    let mut flat = Flattened::new(file);
    let lines = provides_lines(file, &flat);
    let mut removed = 0;

    for line in lines.iter().rev() {
        let (entries, uses_commas) = parse_entries(&flat.tokens[line.value.clone()]);
        let keep: Vec<&ProvidesEntry> = entries.iter().filter(|e| !entry.selects(e)).collect();
        if keep.len() == entries.len() {
            continue;
        }
        removed += entries.len() - keep.len();

        if keep.is_empty() {
            remove_tokens(&mut flat.tokens, line.tag..line.value.end);
        } else {
            let separator = if uses_commas { ", " } else { " " };
            let text = keep
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(separator);
            let spacing = flat.tokens[line.value.start].trivia().to_string();
            flat.tokens
                .splice(line.value.clone(), value_tokens(&text, &spacing));
        }
    }

    if removed == 0 {
        return Ok(None);
    }
    debug!("removed {removed} provides entr(y/ies) matching {entry}");
    Ok(Some(flat.reparse()?))
}

/// Spacing for a new `Provides:` line so its value lines up with `anchor`.
fn aligned_spacing(anchor_tag: &str, anchor_spacing: &str) -> String {
    if anchor_spacing.is_empty() || !anchor_spacing.chars().all(|c| c == ' ') {
        return if anchor_spacing.is_empty() {
            " ".to_string()
        } else {
            anchor_spacing.to_string()
        };
    }
    let column = anchor_tag.len() + anchor_spacing.len();
    " ".repeat(column.saturating_sub(PROVIDES_TAG.len()).max(1))
}

/// Add `entry` on a new `Provides:` line after the last top-level preamble
/// definition. Returns `None` when an identical entry already exists.
pub(crate) fn add_provides(
    file: &SpecFile,
    entry: &ProvidesEntry,
) -> Result<Option<SpecFile>, EngineError> {
    let mut flat = Flattened::new(file);

    let existing = provides_lines(file, &flat).into_iter().any(|line| {
        parse_entries(&flat.tokens[line.value]).0.contains(entry)
    });
    if existing {
        debug!("provides entry {entry} already present");
        return Ok(None);
    }

    let conditionals = flat.ranges(SyntaxKind::IF);
    let preamble_end = flat
        .ranges(SyntaxKind::SECTION)
        .into_iter()
        .chain(flat.ranges(SyntaxKind::CHANGELOG))
        .map(|range| range.start)
        .min()
        .unwrap_or(flat.tokens.len());
    let anchor = flat
        .ranges(SyntaxKind::DEFINITION)
        .into_iter()
        .filter(|node| node.end <= preamble_end)
        .filter(|node| !conditionals.iter().any(|c| c.start <= node.start && node.end <= c.end))
        .next_back()
        .ok_or_else(|| EngineError::DefinitionNotFound("preamble definition".to_string()))?;

    let anchor_tag = &flat.tokens[anchor.start];
    let anchor_spacing = if anchor.len() > 1 {
        flat.tokens[anchor.start + 1].trivia()
    } else {
        ""
    };
    let indent = anchor_tag
        .trivia()
        .rsplit('\n')
        .next()
        .unwrap_or_default();

    let eol = line_ending(&flat.tokens);
    let mut new = vec![Token::word(format!("{eol}{indent}"), PROVIDES_TAG)];
    new.extend(value_tokens(
        &entry.to_string(),
        &aligned_spacing(anchor_tag.text(), anchor_spacing),
    ));
    flat.tokens.splice(anchor.end..anchor.end, new);

    debug!("added provides entry {entry}");
    Ok(Some(flat.reparse()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SPEC: &str = "\
Name:     libfoo
Version:  1.0
Provides: foo = 1.0, libfoo-compat
Provides: bar

%package devel
Summary:  Headers
Provides: foo-devel = %{version}

%package -n python3-foo
Provides: python-foo

%files
";

    fn entry(text: &str) -> ProvidesEntry {
        ProvidesEntry::parse(text).unwrap()
    }

    #[test]
    fn renders_matching_entries_per_package() {
        let file = SpecFile::parse(SPEC).unwrap();
        let pattern = Pattern::new("*foo*").unwrap();
        assert_eq!(
            render_provides(&file, &pattern),
            "libfoo: foo = 1.0\nlibfoo: libfoo-compat\nlibfoo-devel: foo-devel = %{version}\npython3-foo: python-foo\n"
        );
    }

    #[test]
    fn removing_one_entry_keeps_rest_of_line() {
        let file = SpecFile::parse(SPEC).unwrap();
        let edited = remove_provides(&file, &entry("foo")).unwrap().unwrap();
        assert!(
            edited
                .to_string()
                .contains("Provides: libfoo-compat\nProvides: bar\n")
        );
    }

    #[test]
    fn removing_only_entry_deletes_line() {
        let file = SpecFile::parse(SPEC).unwrap();
        let edited = remove_provides(&file, &entry("bar")).unwrap().unwrap();
        assert_eq!(
            edited.to_string(),
            SPEC.replace("Provides: bar\n", "")
        );
    }

    #[test]
    fn removes_from_package_bodies() {
        let file = SpecFile::parse(SPEC).unwrap();
        let edited = remove_provides(&file, &entry("python-foo")).unwrap().unwrap();
        assert_eq!(
            edited.to_string(),
            SPEC.replace("Provides: python-foo\n", "")
        );
    }

    #[test]
    fn removing_unknown_entry_changes_nothing() {
        let file = SpecFile::parse(SPEC).unwrap();
        assert_eq!(remove_provides(&file, &entry("nothing")).unwrap(), None);
    }

    #[test]
    fn added_line_copies_alignment() {
        let file = SpecFile::parse("Name:    x\nLicense: MIT\n\n%files\n").unwrap();
        let edited = add_provides(&file, &entry("x-compat = 2")).unwrap().unwrap();
        assert_eq!(
            edited.to_string(),
            "Name:    x\nLicense: MIT\nProvides: x-compat = 2\n\n%files\n"
        );

        let wide = SpecFile::parse("Name:           x\n").unwrap();
        let edited = add_provides(&wide, &entry("y")).unwrap().unwrap();
        assert_eq!(edited.to_string(), "Name:           x\nProvides:      y\n");
    }

    #[test]
    fn adding_existing_entry_is_a_no_op() {
        let file = SpecFile::parse(SPEC).unwrap();
        assert_eq!(add_provides(&file, &entry("bar")).unwrap(), None);
    }

    #[test]
    fn adding_needs_a_preamble() {
        let file = SpecFile::parse("%files\n").unwrap();
        assert!(matches!(
            add_provides(&file, &entry("x")),
            Err(EngineError::DefinitionNotFound(_))
        ));
    }

    #[test]
    fn added_line_keeps_crlf() {
        let file = SpecFile::parse("Name: x\r\n\r\n%files\r\n").unwrap();
        let edited = add_provides(&file, &entry("y")).unwrap().unwrap();
        assert_eq!(edited.to_string(), "Name: x\r\nProvides: y\r\n\r\n%files\r\n");
    }

    #[test]
    fn whitespace_separated_entries() {
        let tokens = lex("a b >= 2 c");
        let (entries, commas) = parse_entries(&tokens[..5]);
        assert!(!commas);
        let names: Vec<String> = entries.iter().map(|e| e.to_string()).collect();
        assert_eq!(names, vec!["a", "b >= 2", "c"]);
    }
}
