//! Pluggable strategies.
//!
//! Three seams can be filled independently:
//!
//! - an [`Editor`] changes the document from parameters and side-channel text
//! - a [`Renderer`] reads the document and produces a report
//! - a [`ModelWriter`] edits the package model (provides lists)
//!
//! A [`StrategyRegistry`] maps names to implementations. The built-ins live
//! in [`builtin`]; anything else is run as a subprocess, see [`external`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use log::debug;

use crate::editing::{Patch, SpecDocument};
use crate::error::EngineError;

pub mod builtin;
pub mod external;

pub use external::ExternalStrategy;

/// Parameters and side-channel text handed to a strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyRequest {
    pub params: BTreeMap<String, String>,
    pub side_channel: String,
}

impl StrategyRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_side_channel(mut self, side_channel: impl Into<String>) -> Self {
        self.side_channel = side_channel.into();
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// A parameter the strategy `name` cannot run without.
    pub fn require(&self, name: &str, key: &str) -> Result<&str, EngineError> {
        self.param(key).ok_or_else(|| {
            EngineError::InvalidParameter(format!("strategy {name} needs the {key} parameter"))
        })
    }
}

/// The seam a strategy fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Editor,
    Renderer,
    ModelWriter,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Editor => "editor",
            StrategyKind::Renderer => "renderer",
            StrategyKind::ModelWriter => "model-writer",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait Editor {
    fn name(&self) -> &str;
    fn edit(&self, doc: &mut SpecDocument, request: &StrategyRequest)
    -> Result<Patch, EngineError>;
}

pub trait Renderer {
    fn name(&self) -> &str;
    fn render(&self, doc: &SpecDocument, request: &StrategyRequest) -> Result<String, EngineError>;
}

pub trait ModelWriter {
    fn name(&self) -> &str;
    fn write(
        &self,
        doc: &mut SpecDocument,
        request: &StrategyRequest,
    ) -> Result<Patch, EngineError>;
}

/// Strategies by name, one table per seam.
#[derive(Default)]
pub struct StrategyRegistry {
    editors: BTreeMap<String, Rc<dyn Editor>>,
    renderers: BTreeMap<String, Rc<dyn Renderer>>,
    model_writers: BTreeMap<String, Rc<dyn ModelWriter>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in strategies.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_editor(Rc::new(builtin::InstallModeEditor));
        registry.register_renderer(Rc::new(builtin::ProvidesRenderer));
        registry.register_model_writer(Rc::new(builtin::ProvidesModelWriter));
        registry
    }

    pub fn register_editor(&mut self, editor: Rc<dyn Editor>) {
        self.editors.insert(editor.name().to_string(), editor);
    }

    pub fn register_renderer(&mut self, renderer: Rc<dyn Renderer>) {
        self.renderers.insert(renderer.name().to_string(), renderer);
    }

    pub fn register_model_writer(&mut self, writer: Rc<dyn ModelWriter>) {
        self.model_writers.insert(writer.name().to_string(), writer);
    }

    /// Register an external command under its name for every seam.
    pub fn register_external(&mut self, strategy: ExternalStrategy, kind: StrategyKind) {
        let strategy = Rc::new(strategy);
        match kind {
            StrategyKind::Editor => self.register_editor(strategy),
            StrategyKind::Renderer => self.register_renderer(strategy),
            StrategyKind::ModelWriter => self.register_model_writer(strategy),
        }
    }

    pub fn editor(&self, name: &str) -> Result<Rc<dyn Editor>, EngineError> {
        match self.editors.get(name) {
            Some(editor) => Ok(Rc::clone(editor)),
            None => Ok(Rc::new(external_for(name, StrategyKind::Editor)?)),
        }
    }

    pub fn renderer(&self, name: &str) -> Result<Rc<dyn Renderer>, EngineError> {
        match self.renderers.get(name) {
            Some(renderer) => Ok(Rc::clone(renderer)),
            None => Ok(Rc::new(external_for(name, StrategyKind::Renderer)?)),
        }
    }

    pub fn model_writer(&self, name: &str) -> Result<Rc<dyn ModelWriter>, EngineError> {
        match self.model_writers.get(name) {
            Some(writer) => Ok(Rc::clone(writer)),
            None => Ok(Rc::new(external_for(name, StrategyKind::ModelWriter)?)),
        }
    }

    /// Registered names for `kind`, sorted.
    pub fn names(&self, kind: StrategyKind) -> Vec<&str> {
        let names: Vec<&String> = match kind {
            StrategyKind::Editor => self.editors.keys().collect(),
            StrategyKind::Renderer => self.renderers.keys().collect(),
            StrategyKind::ModelWriter => self.model_writers.keys().collect(),
        };
        names.into_iter().map(String::as_str).collect()
    }
}

/// An unregistered name is run as a command when it names an existing file.
///
/// The path is made absolute so a bare file name is not looked up in `PATH`.
fn external_for(name: &str, kind: StrategyKind) -> Result<ExternalStrategy, EngineError> {
    let path = Path::new(name);
    if !path.is_file() {
        return Err(EngineError::UnknownStrategy(format!("{kind} {name}")));
    }
    let command = std::path::absolute(path).map_err(crate::io::IoError::from)?;
    debug!("using {} as an external {kind}", command.display());
    Ok(ExternalStrategy::new(name, command))
}
