//! # Grammar Rules
//!
//! Declarative tables consulted by the parser. Nothing in here consumes
//! tokens; the parser asks these tables which statement kinds may come next,
//! where a section body ends, and which edits a section kind supports.
//!
//! ## Statement rules
//!
//! Every [`StatementKind`] has a static [`Rule`]:
//!
//! - `successors`: the kinds that may directly follow a statement of this
//!   kind. The parser intersects this with the kinds allowed by the
//!   surrounding context to build the candidate list for the next position.
//! - `terminators`: markers that close the nested body this kind opens.
//!   Only `%if` opens a body; its branches end at `%else` / `%endif`.
//!
//! ## Section table
//!
//! Sections are a single statement variant parameterized by
//! [`SectionKind`]. Each kind has a header keyword and an
//! [`EditCapabilities`] row. Adding a section kind means adding a variant and
//! its row; the parser loop does not change.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Openers of a conditional block.
pub const IF_OPENERS: &[&str] = &["%if", "%ifarch", "%ifnarch", "%ifos", "%ifnos"];
pub const ELSE: &str = "%else";
pub const ENDIF: &str = "%endif";
/// Markers that close a conditional branch.
pub const BRANCH_TERMINATORS: &[&str] = &[ELSE, ENDIF];
/// Directives introducing a macro variable.
pub const GLOBAL_KEYWORDS: &[&str] = &["%global", "%define"];
/// Marker opening a changelog item.
pub const CHANGELOG_ITEM_MARKER: &str = "*";
/// Delimiter between the email and the version of a changelog item.
pub const CHANGELOG_VERSION_DELIMITER: &str = "-";

/// Statement kinds in the order the parser tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    If,
    Global,
    Definition,
    Changelog,
    Section,
    MacroLine,
    Eof,
}

impl StatementKind {
    /// Fixed priority order for speculative parsing.
    pub const PRIORITY: [StatementKind; 7] = [
        StatementKind::If,
        StatementKind::Global,
        StatementKind::Definition,
        StatementKind::Changelog,
        StatementKind::Section,
        StatementKind::MacroLine,
        StatementKind::Eof,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn rule(self) -> &'static Rule {
        match self {
            StatementKind::If => &IF_RULE,
            StatementKind::Global | StatementKind::Definition | StatementKind::MacroLine => {
                &LINE_RULE
            }
            StatementKind::Changelog | StatementKind::Section => &SECTION_RULE,
            StatementKind::Eof => &EOF_RULE,
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::If => "%if block",
            StatementKind::Global => "%global",
            StatementKind::Definition => "tag definition",
            StatementKind::Changelog => "%changelog",
            StatementKind::Section => "section header",
            StatementKind::MacroLine => "macro line",
            StatementKind::Eof => "end of file",
        };
        f.write_str(name)
    }
}

/// A small set of statement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KindSet(u8);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);
    pub const ALL: KindSet = KindSet::of(&StatementKind::PRIORITY);

    pub const fn of(kinds: &[StatementKind]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bit();
            i += 1;
        }
        KindSet(bits)
    }

    pub const fn with(self, kind: StatementKind) -> Self {
        KindSet(self.0 | kind.bit())
    }

    pub const fn without(self, kind: StatementKind) -> Self {
        KindSet(self.0 & !kind.bit())
    }

    pub const fn contains(self, kind: StatementKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub const fn intersect(self, other: KindSet) -> Self {
        KindSet(self.0 & other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in priority order.
    pub fn iter(self) -> impl Iterator<Item = StatementKind> {
        StatementKind::PRIORITY
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl fmt::Display for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|kind| kind.to_string()).collect();
        f.write_str(&names.join(" or "))
    }
}

/// Grammar rule of one statement kind.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub successors: KindSet,
    pub terminators: &'static [&'static str],
}

static IF_RULE: Rule = Rule {
    successors: KindSet::ALL,
    terminators: BRANCH_TERMINATORS,
};

static LINE_RULE: Rule = Rule {
    successors: KindSet::ALL,
    terminators: &[],
};

// A section body swallows everything up to the next header, so only another
// header or the end of input can follow it.
static SECTION_RULE: Rule = Rule {
    successors: KindSet::of(&[
        StatementKind::Changelog,
        StatementKind::Section,
        StatementKind::Eof,
    ]),
    terminators: &[],
};

static EOF_RULE: Rule = Rule {
    successors: KindSet::EMPTY,
    terminators: &[],
};

/// Edit operations of the edit protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOperation {
    Add,
    Remove,
    Replace,
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EditOperation::Add => "add",
            EditOperation::Remove => "remove",
            EditOperation::Replace => "replace",
        })
    }
}

/// Which edit operations a section kind implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditCapabilities {
    pub add: bool,
    pub remove: bool,
    pub replace: bool,
}

impl EditCapabilities {
    const LIST: EditCapabilities = EditCapabilities {
        add: true,
        remove: true,
        replace: false,
    };
    const APPEND_ONLY: EditCapabilities = EditCapabilities {
        add: true,
        remove: false,
        replace: false,
    };

    pub fn supports(self, operation: EditOperation) -> bool {
        match operation {
            EditOperation::Add => self.add,
            EditOperation::Remove => self.remove,
            EditOperation::Replace => self.replace,
        }
    }
}

/// Every recognized section kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Description,
    Build,
    Changelog,
    Check,
    Clean,
    Conf,
    Files,
    GenerateBuildrequires,
    Install,
    Package,
    Patchlist,
    Prep,
    Pre,
    Post,
    Preun,
    Postun,
    Pretrans,
    Posttrans,
    Preuntrans,
    Postuntrans,
    Sourcelist,
    Trigger,
    Triggerin,
    Triggerprein,
    Triggerun,
    Triggerpostun,
    Filetriggerin,
    Filetriggerun,
    Filetriggerpostun,
    Transfiletriggerin,
    Transfiletriggerun,
    Transfiletriggerpostun,
    Verifyscript,
}

impl SectionKind {
    pub const ALL: [SectionKind; 33] = [
        SectionKind::Description,
        SectionKind::Build,
        SectionKind::Changelog,
        SectionKind::Check,
        SectionKind::Clean,
        SectionKind::Conf,
        SectionKind::Files,
        SectionKind::GenerateBuildrequires,
        SectionKind::Install,
        SectionKind::Package,
        SectionKind::Patchlist,
        SectionKind::Prep,
        SectionKind::Pre,
        SectionKind::Post,
        SectionKind::Preun,
        SectionKind::Postun,
        SectionKind::Pretrans,
        SectionKind::Posttrans,
        SectionKind::Preuntrans,
        SectionKind::Postuntrans,
        SectionKind::Sourcelist,
        SectionKind::Trigger,
        SectionKind::Triggerin,
        SectionKind::Triggerprein,
        SectionKind::Triggerun,
        SectionKind::Triggerpostun,
        SectionKind::Filetriggerin,
        SectionKind::Filetriggerun,
        SectionKind::Filetriggerpostun,
        SectionKind::Transfiletriggerin,
        SectionKind::Transfiletriggerun,
        SectionKind::Transfiletriggerpostun,
        SectionKind::Verifyscript,
    ];

    /// The header keyword opening this section.
    pub fn header(self) -> &'static str {
        match self {
            SectionKind::Description => "%description",
            SectionKind::Build => "%build",
            SectionKind::Changelog => "%changelog",
            SectionKind::Check => "%check",
            SectionKind::Clean => "%clean",
            SectionKind::Conf => "%conf",
            SectionKind::Files => "%files",
            SectionKind::GenerateBuildrequires => "%generate_buildrequires",
            SectionKind::Install => "%install",
            SectionKind::Package => "%package",
            SectionKind::Patchlist => "%patchlist",
            SectionKind::Prep => "%prep",
            SectionKind::Pre => "%pre",
            SectionKind::Post => "%post",
            SectionKind::Preun => "%preun",
            SectionKind::Postun => "%postun",
            SectionKind::Pretrans => "%pretrans",
            SectionKind::Posttrans => "%posttrans",
            SectionKind::Preuntrans => "%preuntrans",
            SectionKind::Postuntrans => "%postuntrans",
            SectionKind::Sourcelist => "%sourcelist",
            SectionKind::Trigger => "%trigger",
            SectionKind::Triggerin => "%triggerin",
            SectionKind::Triggerprein => "%triggerprein",
            SectionKind::Triggerun => "%triggerun",
            SectionKind::Triggerpostun => "%triggerpostun",
            SectionKind::Filetriggerin => "%filetriggerin",
            SectionKind::Filetriggerun => "%filetriggerun",
            SectionKind::Filetriggerpostun => "%filetriggerpostun",
            SectionKind::Transfiletriggerin => "%transfiletriggerin",
            SectionKind::Transfiletriggerun => "%transfiletriggerun",
            SectionKind::Transfiletriggerpostun => "%transfiletriggerpostun",
            SectionKind::Verifyscript => "%verifyscript",
        }
    }

    pub fn from_header(text: &str) -> Option<SectionKind> {
        SectionKind::ALL
            .into_iter()
            .find(|kind| kind.header() == text)
    }

    pub fn capabilities(self) -> EditCapabilities {
        match self {
            SectionKind::Files
            | SectionKind::Package
            | SectionKind::Description
            | SectionKind::Sourcelist
            | SectionKind::Patchlist => EditCapabilities::LIST,
            _ => EditCapabilities::APPEND_ONLY,
        }
    }

    /// Markers that end a body of this kind (besides EOF and the
    /// depth-tracked `%else`/`%endif`).
    ///
    /// A changelog message additionally ends at the next item marker.
    pub fn terminators(self) -> Vec<&'static str> {
        let mut stop = section_headers();
        if self == SectionKind::Changelog {
            stop.push(CHANGELOG_ITEM_MARKER);
        }
        stop
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Header keywords of every section kind.
pub fn section_headers() -> Vec<&'static str> {
    SectionKind::ALL.into_iter().map(SectionKind::header).collect()
}

/// Directives that the macro-line rule must leave to other rules.
pub fn is_reserved_directive(text: &str) -> bool {
    IF_OPENERS.contains(&text)
        || BRANCH_TERMINATORS.contains(&text)
        || GLOBAL_KEYWORDS.contains(&text)
        || SectionKind::from_header(text).is_some()
}

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(name|version|release|epoch|summary|license|group|url|bugurl|vcs",
        r"|source\d*|patch\d*|nosource|nopatch|buildroot|buildarch|buildarchitectures",
        r"|buildrequires|buildconflicts|buildprereq|requires|prereq|provides|conflicts",
        r"|obsoletes|recommends|suggests|supplements|enhances|orderwithrequires",
        r"|exclusivearch|excludearch|exclusiveos|excludeos|prefix|prefixes|packager",
        r"|vendor|distribution|disttag|icon|autoreq|autoprov|autoreqprov",
        r"|modularitylabel|removepathpostfixes|docdir)(\([^()]*\))?:$"
    ))
    .expect("tag pattern is a valid regex")
});

/// True when `text` is a recognized tag such as `Name:` or `Requires(post):`.
pub fn is_definition_tag(text: &str) -> bool {
    TAG.is_match(text)
}

/// The tag name without qualifier and colon, lower-cased.
///
/// `Requires(post):` becomes `requires`.
pub fn tag_name(text: &str) -> String {
    text.trim_end_matches(':')
        .split('(')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}
