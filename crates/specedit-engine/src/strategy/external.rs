//! Strategies run as subprocesses.
//!
//! The command receives the current spec text on stdin and these variables:
//!
//! - `SPECEDIT_OPERATION`: `editor`, `renderer` or `model-writer`
//! - `SPECEDIT_PARAM_<KEY>`: one per parameter, the key upper-cased with
//!   `-` replaced by `_`
//! - `SPECEDIT_SIDE_CHANNEL`: path of a temporary file holding the side
//!   channel
//!
//! A renderer's stdout is its rendering. For editors and model writers
//! stdout is the new spec text, which must parse.

use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use log::{debug, info};

use super::{Editor, ModelWriter, Renderer, StrategyKind, StrategyRequest};
use crate::editing::{Patch, SpecDocument};
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalStrategy {
    name: String,
    command: PathBuf,
    args: Vec<String>,
}

/// Environment variable carrying the parameter `key`.
pub fn param_variable(key: &str) -> String {
    format!("SPECEDIT_PARAM_{}", key.to_uppercase().replace('-', "_"))
}

impl ExternalStrategy {
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn failure(&self, message: impl Into<String>) -> EngineError {
        EngineError::Strategy {
            name: self.name.clone(),
            message: message.into(),
        }
    }

    /// Run the command for `kind`, returning its stdout.
    fn run(
        &self,
        kind: StrategyKind,
        input: String,
        request: &StrategyRequest,
    ) -> Result<String, EngineError> {
        let mut side_channel = tempfile::NamedTempFile::new().map_err(crate::io::IoError::from)?;
        side_channel
            .write_all(request.side_channel.as_bytes())
            .map_err(crate::io::IoError::from)?;

        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .env("SPECEDIT_OPERATION", kind.as_str())
            .env("SPECEDIT_SIDE_CHANNEL", side_channel.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &request.params {
            command.env(param_variable(key), value);
        }

        debug!("running {} for {kind} {}", self.command.display(), self.name);
        let mut child = command
            .spawn()
            .map_err(|e| self.failure(format!("failed to run {}: {e}", self.command.display())))?;

        // stdin is fed while stdout is drained.
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || match stdin.write_all(input.as_bytes()) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            })
        });

        let output = child
            .wait_with_output()
            .map_err(|e| self.failure(format!("failed to wait for command: {e}")))?;
        if let Some(writer) = writer {
            match writer.join() {
                Ok(result) => {
                    result.map_err(|e| self.failure(format!("failed to write stdin: {e}")))?
                }
                Err(_) => return Err(self.failure("stdin writer panicked")),
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!("{}: {}", output.status, stderr.trim_end())));
        }
        String::from_utf8(output.stdout)
            .map_err(|_| self.failure("output is not valid UTF-8"))
    }

    fn rewrite(
        &self,
        kind: StrategyKind,
        doc: &mut SpecDocument,
        request: &StrategyRequest,
    ) -> Result<Patch, EngineError> {
        let output = self.run(kind, doc.text(), request)?;
        let patch = doc.replace_text(&output)?;
        info!("{kind} {}: document version {}", self.name, patch.version);
        Ok(patch)
    }
}

impl Editor for ExternalStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn edit(
        &self,
        doc: &mut SpecDocument,
        request: &StrategyRequest,
    ) -> Result<Patch, EngineError> {
        self.rewrite(StrategyKind::Editor, doc, request)
    }
}

impl Renderer for ExternalStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, doc: &SpecDocument, request: &StrategyRequest) -> Result<String, EngineError> {
        self.run(StrategyKind::Renderer, doc.text(), request)
    }
}

impl ModelWriter for ExternalStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(
        &self,
        doc: &mut SpecDocument,
        request: &StrategyRequest,
    ) -> Result<Patch, EngineError> {
        self.rewrite(StrategyKind::ModelWriter, doc, request)
    }
}
