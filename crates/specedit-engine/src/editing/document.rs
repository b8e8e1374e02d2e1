use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use log::info;
use specedit_syntax::{SectionId, SectionKind, SpecFile, Statement};

use super::commands::Cmd;
use super::patch::Patch;
use super::{install, provides, sections, values};
use crate::error::EngineError;
use crate::io::read_spec;

/// An open spec file: the parsed statement tree plus an edit counter.
///
/// The tree is the single source of truth. Its serialization is the file
/// text, byte for byte, until a command changes it. Every edit goes through
/// [`SpecDocument::apply`], which either commits a fully reparsed tree or
/// leaves the document untouched.
///
/// ```rust
/// # use specedit_engine::editing::{Cmd, SpecDocument};
/// # use specedit_syntax::{SectionId, SectionKind};
/// let mut doc = SpecDocument::from_text("Name: hello\n\n%files\n/usr/bin/hello\n").unwrap();
/// let patch = doc
///     .apply(Cmd::AddToSection {
///         target: SectionId::new(SectionKind::Files, ""),
///         content: "%doc README".to_string(),
///     })
///     .unwrap();
/// assert_eq!(patch.version, 1);
/// assert_eq!(doc.text(), "Name: hello\n\n%files\n/usr/bin/hello\n%doc README\n");
/// ```
#[derive(Debug, Clone)]
pub struct SpecDocument {
    file: SpecFile,
    version: u64,
}

impl SpecDocument {
    /// Parse a document from raw bytes, which must be UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        Self::from_text(std::str::from_utf8(bytes)?)
    }

    pub fn from_text(text: &str) -> Result<Self, EngineError> {
        Ok(Self {
            file: SpecFile::parse(text)?,
            version: 0,
        })
    }

    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let text = read_spec(path)?;
        Self::from_text(&text)
    }

    pub fn file(&self) -> &SpecFile {
        &self.file
    }

    /// Number of edits committed so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn text(&self) -> String {
        self.file.to_string()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.text().into_bytes()
    }

    /// Serialize the document to `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> std::io::Result<W> {
        let mut sink = specedit_syntax::sink::WriteSink::new(writer);
        self.file.emit(&mut sink);
        sink.finish()
    }

    /// Replace the whole text, e.g. with the output of an external strategy.
    ///
    /// The new text must parse; otherwise the document is unchanged.
    ///
    /// The patch lists the sections whose text differs, sorted by identity,
    /// and flags the preamble only when a top-level statement outside the
    /// sections changed.
    pub fn replace_text(&mut self, text: &str) -> Result<Patch, EngineError> {
        let file = SpecFile::parse(text)?;
        if file == self.file {
            return Ok(Patch::unchanged(self.version));
        }

        let (before, after) = (section_texts(&self.file), section_texts(&file));
        let mut touched: Vec<SectionId> = before
            .keys()
            .chain(after.keys())
            .filter(|id| before.get(*id) != after.get(*id))
            .cloned()
            .collect();
        touched.sort();
        touched.dedup();
        let preamble_changed = preamble_text(&self.file) != preamble_text(&file);
        if touched.is_empty() && !preamble_changed {
            // Same sections, different order.
            touched = after.into_keys().collect();
        }
        Ok(self.commit(file, touched, preamble_changed))
    }

    /// Apply one command. On error the document is unchanged.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EngineError> {
        let name = cmd.name();
        let (file, touched, preamble_changed) = match cmd {
            Cmd::AddToSection { target, content } => {
                let (file, touched) = sections::add_to_section(&self.file, &target, &content)?;
                (file, touched, false)
            }
            Cmd::RemoveFromSection { target, selector } => {
                let (file, touched) =
                    sections::remove_from_section(&self.file, &target, &selector)?;
                (file, touched, false)
            }
            Cmd::ReplaceSection { target, .. } => {
                let (file, touched) = sections::replace_section(&target)?;
                (file, touched, false)
            }
            Cmd::ReplaceValue { name, value } => {
                let file = values::replace_value(&self.file, &name, &value)?;
                let changed = file != self.file;
                (file, Vec::new(), changed)
            }
            Cmd::SetInstallMode { mode } => {
                let (file, touched) = install::set_install_mode(&self.file, &mode)?;
                (file, touched, false)
            }
            Cmd::RemoveProvides { entry } => match provides::remove_provides(&self.file, &entry)? {
                Some(file) => (file, self.provides_sections(), true),
                None => (self.file.clone(), Vec::new(), false),
            },
            Cmd::AddProvides { entry } => match provides::add_provides(&self.file, &entry)? {
                Some(file) => (file, Vec::new(), true),
                None => (self.file.clone(), Vec::new(), false),
            },
            Cmd::MergeSections { overlay } => {
                let (file, touched) = sections::merge_sections(&self.file, &overlay)?;
                (file, touched, false)
            }
        };

        let patch = self.commit(file, touched, preamble_changed);
        info!(
            "applied {name}: {} section(s) touched, version {}",
            patch.touched.len(),
            patch.version
        );
        Ok(patch)
    }

    fn provides_sections(&self) -> Vec<SectionId> {
        self.file
            .sections()
            .into_iter()
            .filter(|section| section.kind == SectionKind::Package)
            .map(|section| section.id())
            .collect()
    }

    fn commit(
        &mut self,
        file: SpecFile,
        touched: Vec<SectionId>,
        preamble_changed: bool,
    ) -> Patch {
        if preamble_changed || !touched.is_empty() {
            self.file = file;
            self.version += 1;
        }
        Patch {
            touched,
            preamble_changed,
            version: self.version,
        }
    }
}

/// Text of every section and changelog, keyed by identity.
fn section_texts(file: &SpecFile) -> BTreeMap<SectionId, String> {
    let mut texts: BTreeMap<SectionId, String> = BTreeMap::new();
    file.walk(&mut |statement| {
        let id = match statement {
            Statement::Section(section) => section.id(),
            Statement::Changelog(changelog) => changelog.id(),
            _ => return,
        };
        texts.entry(id).or_default().push_str(&statement.to_string());
    });
    texts
}

/// Text of the top-level statements that are not sections.
fn preamble_text(file: &SpecFile) -> String {
    file.statements()
        .iter()
        .filter(|statement| !matches!(statement, Statement::Section(_) | Statement::Changelog(_)))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{LineSelector, ProvidesEntry};
    use pretty_assertions::assert_eq;
    use specedit_syntax::EditOperation;

    const SPEC: &str = "\
Name:     hello
Version:  1.0
Provides: hello-bin

%description
Says hello.

%install
install -m 644 hello %{buildroot}%{_bindir}/hello

%files
%{_bindir}/hello
%doc README

%changelog
* Mon Jan 01 2024 Jane Doe <jane@example.com> - 1.0-1
- Initial package
";

    fn files() -> SectionId {
        SectionId::new(SectionKind::Files, "")
    }

    #[test]
    fn test_roundtrip_without_edits() {
        let doc = SpecDocument::from_bytes(SPEC.as_bytes()).unwrap();
        assert_eq!(doc.to_bytes(), SPEC.as_bytes());
        assert_eq!(doc.version(), 0);

        let written = doc.write_to(Vec::new()).unwrap();
        assert_eq!(written, SPEC.as_bytes());
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            SpecDocument::from_bytes(&[0x4e, 0xff, 0xfe]),
            Err(EngineError::Encoding(_))
        ));
    }

    #[test]
    fn test_add_then_remove() {
        let mut doc = SpecDocument::from_text(SPEC).unwrap();
        let patch = doc
            .apply(Cmd::AddToSection {
                target: files(),
                content: "%license COPYING\n".to_string(),
            })
            .unwrap();
        assert_eq!(patch.touched, vec![files()]);
        assert!(doc.text().contains("%doc README\n%license COPYING\n\n%changelog"));

        let patch = doc
            .apply(Cmd::RemoveFromSection {
                target: files(),
                selector: LineSelector::first_word("%license").unwrap(),
            })
            .unwrap();
        assert_eq!(patch.version, 2);
        assert_eq!(doc.text(), SPEC);
    }

    #[test]
    fn test_failed_command_leaves_document_unchanged() {
        let mut doc = SpecDocument::from_text(SPEC).unwrap();
        let error = doc
            .apply(Cmd::RemoveFromSection {
                target: SectionId::new(SectionKind::Install, ""),
                selector: LineSelector::exact("install"),
            })
            .unwrap_err();
        assert!(matches!(
            error,
            EngineError::UnsupportedEdit {
                operation: EditOperation::Remove,
                ..
            }
        ));

        let error = doc
            .apply(Cmd::AddToSection {
                target: SectionId::new(SectionKind::Files, "devel"),
                content: "/x".to_string(),
            })
            .unwrap_err();
        assert!(matches!(error, EngineError::SectionNotFound(_)));

        assert_eq!(doc.text(), SPEC);
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_replace_section_is_unsupported() {
        let mut doc = SpecDocument::from_text(SPEC).unwrap();
        assert!(matches!(
            doc.apply(Cmd::ReplaceSection {
                target: files(),
                content: String::new(),
            }),
            Err(EngineError::UnsupportedEdit { .. })
        ));
    }

    #[test]
    fn test_no_op_keeps_version() {
        let mut doc = SpecDocument::from_text(SPEC).unwrap();
        let patch = doc
            .apply(Cmd::RemoveFromSection {
                target: files(),
                selector: LineSelector::exact("/nothing"),
            })
            .unwrap();
        assert!(patch.is_empty());
        assert_eq!(patch.version, 0);
    }

    #[test]
    fn test_value_and_provides_edits() {
        let mut doc = SpecDocument::from_text(SPEC).unwrap();
        doc.apply(Cmd::ReplaceValue {
            name: "Version".to_string(),
            value: "1.1".to_string(),
        })
        .unwrap();
        doc.apply(Cmd::RemoveProvides {
            entry: ProvidesEntry::new("hello-bin"),
        })
        .unwrap();
        let patch = doc
            .apply(Cmd::AddProvides {
                entry: ProvidesEntry::parse("hello-cli = 1.1").unwrap(),
            })
            .unwrap();
        assert!(patch.preamble_changed);
        assert_eq!(patch.version, 3);
        assert!(
            doc.text()
                .starts_with("Name:     hello\nVersion:  1.1\nProvides: hello-cli = 1.1\n\n%description")
        );
    }

    #[test]
    fn test_install_mode() {
        let mut doc = SpecDocument::from_text(SPEC).unwrap();
        let patch = doc
            .apply(Cmd::SetInstallMode {
                mode: "0755".to_string(),
            })
            .unwrap();
        assert_eq!(patch.touched, vec![SectionId::new(SectionKind::Install, "")]);
        assert!(doc.text().contains("install -m 0755 hello"));
    }

    #[test]
    fn test_changelog_add_prepends() {
        let mut doc = SpecDocument::from_text(SPEC).unwrap();
        doc.apply(Cmd::AddToSection {
            target: SectionId::new(SectionKind::Changelog, ""),
            content: "* Tue Jan 02 2024 Jane Doe <jane@example.com> - 1.0-2\n- Rebuild\n"
                .to_string(),
        })
        .unwrap();
        let changelog = doc.file().changelog().unwrap();
        assert_eq!(changelog.items.len(), 2);
        assert_eq!(changelog.items[0].version.text(), "1.0-2");
    }

    #[test]
    fn test_merge_sections() {
        let mut doc = SpecDocument::from_text(SPEC).unwrap();
        let overlay = SpecFile::parse("%files\n/only\n\n%check\nmake test\n").unwrap();
        let patch = doc.apply(Cmd::MergeSections { overlay }).unwrap();
        assert_eq!(
            patch.touched,
            vec![files(), SectionId::new(SectionKind::Check, "")]
        );
        let text = doc.text();
        assert!(text.contains("\n%files\n/only\n\n%changelog"));
        assert!(text.ends_with("- Initial package\n\n%check\nmake test\n"));
    }

    #[test]
    fn test_replace_text() {
        let mut doc = SpecDocument::from_text(SPEC).unwrap();
        assert!(doc.replace_text("%if\n").is_err());
        assert_eq!(doc.text(), SPEC);

        let patch = doc.replace_text("Name: other\n").unwrap();
        assert!(patch.preamble_changed);
        assert_eq!(doc.text(), "Name: other\n");
    }

    #[test]
    fn test_replace_text_reports_what_changed() {
        let mut doc = SpecDocument::from_text(SPEC).unwrap();
        let patch = doc
            .replace_text(&SPEC.replace("%doc README", "%doc README.md"))
            .unwrap();
        assert!(!patch.preamble_changed);
        assert_eq!(patch.touched, vec![files()]);
        assert_eq!(patch.version, 1);

        let same = doc.text();
        let patch = doc.replace_text(&same).unwrap();
        assert!(patch.is_empty());
        assert_eq!(patch.version, 1);
    }

    #[test]
    fn test_replace_value_with_same_value_keeps_version() {
        let mut doc = SpecDocument::from_text(SPEC).unwrap();
        let patch = doc
            .apply(Cmd::ReplaceValue {
                name: "Version".to_string(),
                value: "1.0".to_string(),
            })
            .unwrap();
        assert!(!patch.preamble_changed);
        assert_eq!(patch.version, 0);
        assert_eq!(doc.text(), SPEC);
    }

    #[test]
    fn test_merge_keys_on_section_kind() {
        let mut doc = SpecDocument::from_text("Name: x\n%files\n/a\n%files devel\n/b\n").unwrap();
        let overlay = SpecFile::parse("%files\n/c\n").unwrap();
        let patch = doc.apply(Cmd::MergeSections { overlay }).unwrap();
        assert_eq!(patch.touched, vec![files()]);
        assert_eq!(doc.text(), "Name: x\n%files\n/c\n");

        let overlay = SpecFile::parse("%files doc\n/d\n%files tools\n/e\n").unwrap();
        doc.apply(Cmd::MergeSections { overlay }).unwrap();
        assert_eq!(doc.text(), "Name: x\n%files tools\n/e\n");
    }

    #[test]
    fn test_edits_keep_crlf_line_endings() {
        let source = "Name: x\r\n\r\n%files\r\n/a\r\n";
        let mut doc = SpecDocument::from_text(source).unwrap();
        doc.apply(Cmd::AddToSection {
            target: files(),
            content: "/b\n/c\n".to_string(),
        })
        .unwrap();
        assert_eq!(doc.text(), "Name: x\r\n\r\n%files\r\n/a\r\n/b\r\n/c\r\n");
    }
}
