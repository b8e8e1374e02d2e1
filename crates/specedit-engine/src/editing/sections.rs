//! Section-level edits: add lines, remove lines, merge whole sections.

use std::ops::Range;

use log::{debug, warn};
use specedit_syntax::{
    EditOperation, SectionId, SectionKind, SpecFile, Statement, StatementKind, Token,
};

use super::commands::LineSelector;
use super::tokens::{
    Flattened, content_lines, insert_tokens, lex_lines, line_ending, remove_tokens, text_of,
    with_line_ending,
};
use crate::error::EngineError;

/// Outcome of an edit: the new file and the sections it changed.
pub(crate) type Edited = (SpecFile, Vec<SectionId>);

fn check_supported(target: &SectionId, operation: EditOperation) -> Result<(), EngineError> {
    if target.kind.capabilities().supports(operation) {
        Ok(())
    } else {
        Err(EngineError::UnsupportedEdit {
            operation,
            target: target.to_string(),
        })
    }
}

fn find(
    flat: &Flattened,
    file: &SpecFile,
    target: &SectionId,
) -> Result<Range<usize>, EngineError> {
    flat.sections(file)
        .into_iter()
        .find(|(id, _)| id == target)
        .map(|(_, range)| range)
        .ok_or_else(|| EngineError::SectionNotFound(target.to_string()))
}

/// Statement kinds in walk order; an edit inside a section body must not
/// change it.
fn shape(file: &SpecFile) -> Vec<StatementKind> {
    let mut kinds = Vec::new();
    file.walk(&mut |statement| kinds.push(statement.kind()));
    kinds
}

pub(crate) fn add_to_section(
    file: &SpecFile,
    target: &SectionId,
    content: &str,
) -> Result<Edited, EngineError> {
    check_supported(target, EditOperation::Add)?;
    if target.kind == SectionKind::Changelog {
        return add_changelog_items(file, content);
    }

    let mut flat = Flattened::new(file);
    let range = find(&flat, file, target)?;
    let content = content.trim_end_matches(['\r', '\n']);
    if content.trim().is_empty() {
        return Ok((file.clone(), Vec::new()));
    }

    let (new, trailing) = lex_lines(content, line_ending(&flat.tokens));
    insert_tokens(&mut flat.tokens, range.end, new, &trailing);

    let edited = flat.reparse().map_err(|e| invalid_content(target, e))?;
    if shape(&edited) != shape(file) {
        return Err(EngineError::InvalidParameter(format!(
            "content added to {target} would change the file structure"
        )));
    }
    debug!("appended {} line(s) to {target}", content.lines().count());
    Ok((edited, vec![target.clone()]))
}

fn invalid_content(target: &SectionId, error: EngineError) -> EngineError {
    EngineError::InvalidParameter(format!("content for {target} does not parse: {error}"))
}

/// Insert changelog items parsed from `content` before the first existing item.
fn add_changelog_items(file: &SpecFile, content: &str) -> Result<Edited, EngineError> {
    let target = SectionId::new(SectionKind::Changelog, "");
    let mut flat = Flattened::new(file);
    let eol = line_ending(&flat.tokens);
    let fragment = SpecFile::parse(&with_line_ending(&format!("%changelog\n{content}"), eol))
        .map_err(|e| invalid_content(&target, e.into()))?;
    let added = match fragment.statements() {
        [Statement::Changelog(changelog), Statement::Eof(_)] if !changelog.items.is_empty() => {
            changelog.items.len()
        }
        _ => {
            return Err(EngineError::InvalidParameter(
                "changelog content must consist of changelog items".to_string(),
            ));
        }
    };
    let fragment_tokens = Flattened::new(&fragment).tokens;
    let mut new: Vec<Token> = fragment_tokens[1..fragment_tokens.len() - 1].to_vec();

    let range = find(&flat, file, &target)?;
    let at = range.start + 1;
    if at < range.end {
        // The new items take over the spacing after the header.
        let first_old = &flat.tokens[at];
        new[0] = new[0].with_trivia(first_old.trivia());
        flat.tokens[at] = first_old.with_trivia(format!("{eol}{eol}"));
    }
    flat.tokens.splice(at..at, new);

    let edited = flat.reparse()?;
    let before = file.changelog().map_or(0, |c| c.items.len());
    let after = edited.changelog().map_or(0, |c| c.items.len());
    if after != before + added {
        return Err(EngineError::InvalidParameter(
            "changelog content would change the file structure".to_string(),
        ));
    }
    debug!("prepended {added} changelog item(s)");
    Ok((edited, vec![target]))
}

pub(crate) fn remove_from_section(
    file: &SpecFile,
    target: &SectionId,
    selector: &LineSelector,
) -> Result<Edited, EngineError> {
    check_supported(target, EditOperation::Remove)?;

    let mut flat = Flattened::new(file);
    let range = find(&flat, file, target)?;
    let matched: Vec<Range<usize>> = content_lines(&flat.tokens, &range)
        .into_iter()
        .filter(|line| selector.matches(&text_of(&flat.tokens[line.clone()])))
        .collect();

    if matched.is_empty() {
        warn!("no line of {target} matched {selector:?}");
        return Ok((file.clone(), Vec::new()));
    }
    for line in matched.iter().rev() {
        remove_tokens(&mut flat.tokens, line.clone());
    }
    debug!("removed {} line(s) from {target}", matched.len());
    Ok((flat.reparse()?, vec![target.clone()]))
}

pub(crate) fn replace_section(target: &SectionId) -> Result<Edited, EngineError> {
    check_supported(target, EditOperation::Replace)?;
    // No section kind supports replacement yet.
    Err(EngineError::UnsupportedEdit {
        operation: EditOperation::Replace,
        target: target.to_string(),
    })
}

/// Merge the sections of `overlay` into `file`, keyed by section kind.
///
/// A kind present in both is replaced in place by the overlay's version:
/// it takes the position of the first base instance of that kind and every
/// other base instance, whatever its qualifier, is removed together with
/// its leading trivia. Kinds only in
/// the overlay are appended before the end of file, in overlay order. When
/// the overlay repeats a kind, its last instance wins.
pub(crate) fn merge_sections(file: &SpecFile, overlay: &SpecFile) -> Result<Edited, EngineError> {
    let overlay_flat = Flattened::new(overlay);
    let mut incoming: Vec<(SectionId, Vec<Token>)> = Vec::new();
    for (id, range) in overlay_flat.sections(overlay) {
        let tokens = overlay_flat.tokens[range].to_vec();
        match incoming.iter_mut().find(|(existing, _)| existing.kind == id.kind) {
            Some(slot) => *slot = (id, tokens),
            None => incoming.push((id, tokens)),
        }
    }

    let mut flat = Flattened::new(file);
    let base = flat.sections(file);
    let mut replacements: Vec<(Range<usize>, Vec<Token>)> = Vec::new();
    let mut appended: Vec<Token> = Vec::new();
    let mut touched = Vec::new();

    for (id, mut tokens) in incoming {
        let mut instances = base
            .iter()
            .filter(|(base_id, _)| base_id.kind == id.kind)
            .map(|(_, range)| range.clone());
        if let Some(first) = instances.next() {
            tokens[0] = tokens[0].with_trivia(flat.tokens[first.start].trivia());
            replacements.push((first, tokens));
            replacements.extend(instances.map(|duplicate| (duplicate, Vec::new())));
        } else {
            if !tokens[0].trivia().contains('\n') {
                let eol = line_ending(&flat.tokens);
                tokens[0] = tokens[0].with_trivia(format!("{eol}{}", tokens[0].trivia()));
            }
            appended.extend(tokens);
        }
        touched.push(id);
    }

    // The EOF token follows every replaced range, so appending first keeps
    // the recorded ranges valid.
    let eof = flat.tokens.len() - 1;
    flat.tokens.splice(eof..eof, appended);
    replacements.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));
    // A dropped duplicate takes its leading blank lines and comments along.
    for (range, tokens) in replacements {
        flat.tokens.splice(range, tokens);
    }

    debug!("merged {} section(s)", touched.len());
    Ok((flat.reparse()?, touched))
}
