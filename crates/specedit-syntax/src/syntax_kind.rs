//! SyntaxKind enum for all tokens and nodes in the spec file CST.
//!
//! Following the rust-analyzer model, all tokens and nodes share a single enum.
//! Every byte in the source must appear as a token in the tree.

/// All syntax kinds for the spec file CST.
///
/// This enum represents both tokens (lexer output) and composite nodes
/// (statement structure). The `repr(u16)` ensures efficient storage in
/// rowan's green tree.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Tokens (lexer output) ===
    /// Horizontal whitespace (spaces, tabs, stray carriage returns)
    WHITESPACE,
    /// Line ending
    NEWLINE,
    /// `#` comment running to the end of its line
    COMMENT,
    /// Any run of non-whitespace characters
    WORD,
    /// End of file marker (empty text)
    EOF,

    // === Composite Nodes (statement structure) ===
    /// Root document node
    ROOT,
    /// `%if` ... `%endif` block
    IF,
    /// Condition following `%if`
    CONDITION,
    /// Statements of the true branch
    BRANCH,
    /// `%else` and the statements following it
    ELSE_BRANCH,
    /// Tag line such as `Name: foo`
    DEFINITION,
    /// `%global` / `%define` line
    GLOBAL,
    /// Any other directive line
    MACRO_LINE,
    /// Value of a definition, global or macro line
    VALUE,
    /// Section header and body
    SECTION,
    /// Opaque section body
    SECTION_BODY,
    /// `%changelog` section
    CHANGELOG,
    /// A single `* date author <email> - version` entry
    CHANGELOG_ITEM,
    /// Header line of a changelog entry
    CHANGELOG_HEADER,
    /// Free-form message of a changelog entry
    CHANGELOG_MESSAGE,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Returns true if this kind is trivia (whitespace/newlines/comments).
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::NEWLINE | Self::COMMENT)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpecLang {}

impl rowan::Language for SpecLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::CHANGELOG_MESSAGE as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<SpecLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<SpecLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<SpecLang>;
