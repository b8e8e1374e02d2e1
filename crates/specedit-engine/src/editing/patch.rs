use specedit_syntax::SectionId;

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Sections whose text changed, in the order they were edited.
    pub touched: Vec<SectionId>,
    /// Whether any definition or global value changed.
    pub preamble_changed: bool,
    pub version: u64,
}

impl Patch {
    /// A patch recording no change at `version`.
    pub fn unchanged(version: u64) -> Self {
        Self {
            touched: Vec::new(),
            preamble_changed: false,
            version,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty() && !self.preamble_changed
    }

    /// Combine with a patch applied after this one.
    pub fn then(mut self, next: Patch) -> Patch {
        for id in next.touched {
            if !self.touched.contains(&id) {
                self.touched.push(id);
            }
        }
        self.preamble_changed |= next.preamble_changed;
        self.version = next.version;
        self
    }
}
