//! Strategies compiled into the engine.

use glob::Pattern;
use log::info;
use specedit_syntax::{SectionId, SectionKind};

use super::{Editor, ModelWriter, Renderer, StrategyRequest};
use crate::editing::{Cmd, Patch, ProvidesEntry, SpecDocument, render_provides};
use crate::error::EngineError;

pub const INSTALL_EDIT: &str = "install-edit";
pub const PROVIDES_SHOW: &str = "provides-show";
pub const PROVIDES_REMOVE: &str = "provides-remove";
pub const PROVIDES_ADD: &str = "provides-add";

/// Rewrites `install` modes; appends non-blank side-channel text to `%install`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallModeEditor;

impl Editor for InstallModeEditor {
    fn name(&self) -> &str {
        "install-mode"
    }

    fn edit(
        &self,
        doc: &mut SpecDocument,
        request: &StrategyRequest,
    ) -> Result<Patch, EngineError> {
        let mode = request.require(self.name(), INSTALL_EDIT)?;

        // Work on a copy so a failing second command leaves `doc` as it was.
        let mut edited = doc.clone();
        let mut patch = edited.apply(Cmd::SetInstallMode {
            mode: mode.to_string(),
        })?;
        if !request.side_channel.trim().is_empty() {
            patch = patch.then(edited.apply(Cmd::AddToSection {
                target: SectionId::new(SectionKind::Install, ""),
                content: request.side_channel.clone(),
            })?);
        }
        *doc = edited;
        info!("{}: {} section(s) edited", self.name(), patch.touched.len());
        Ok(patch)
    }
}

/// Lists provides entries whose name matches a glob.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvidesRenderer;

impl Renderer for ProvidesRenderer {
    fn name(&self) -> &str {
        "provides"
    }

    fn render(&self, doc: &SpecDocument, request: &StrategyRequest) -> Result<String, EngineError> {
        let glob = request.require(self.name(), PROVIDES_SHOW)?;
        let pattern = Pattern::new(glob)
            .map_err(|e| EngineError::InvalidParameter(format!("bad pattern `{glob}`: {e}")))?;
        Ok(render_provides(doc.file(), &pattern))
    }
}

/// Removes and adds provides entries; removal runs first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvidesModelWriter;

impl ModelWriter for ProvidesModelWriter {
    fn name(&self) -> &str {
        "provides"
    }

    fn write(
        &self,
        doc: &mut SpecDocument,
        request: &StrategyRequest,
    ) -> Result<Patch, EngineError> {
        let remove = request.param(PROVIDES_REMOVE).map(ProvidesEntry::parse).transpose()?;
        let add = request.param(PROVIDES_ADD).map(ProvidesEntry::parse).transpose()?;
        if remove.is_none() && add.is_none() {
            return Err(EngineError::InvalidParameter(format!(
                "model writer {} needs {PROVIDES_REMOVE} or {PROVIDES_ADD}",
                self.name()
            )));
        }

        let mut edited = doc.clone();
        let mut patch = Patch::unchanged(edited.version());
        if let Some(entry) = remove {
            patch = patch.then(edited.apply(Cmd::RemoveProvides { entry })?);
        }
        if let Some(entry) = add {
            patch = patch.then(edited.apply(Cmd::AddProvides { entry })?);
        }
        *doc = edited;
        Ok(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SPEC: &str = "\
Name:     tool
Provides: tool-bin, tool-cli

%package libs
Provides: libtool-compat

%install
install -m 644 tool %{buildroot}/tool
";

    fn doc() -> SpecDocument {
        SpecDocument::from_text(SPEC).unwrap()
    }

    #[test]
    fn install_mode_with_side_channel() {
        let mut doc = doc();
        let request = StrategyRequest::new()
            .with_param(INSTALL_EDIT, "0755")
            .with_side_channel("touch %{buildroot}/stamp\n");
        let patch = InstallModeEditor.edit(&mut doc, &request).unwrap();

        assert_eq!(patch.version, 2);
        assert!(doc.text().ends_with(
            "%install\ninstall -m 0755 tool %{buildroot}/tool\ntouch %{buildroot}/stamp\n"
        ));
    }

    #[test]
    fn install_mode_blank_side_channel_is_ignored() {
        let mut doc = doc();
        let request = StrategyRequest::new()
            .with_param(INSTALL_EDIT, "600")
            .with_side_channel("  \n");
        assert_eq!(InstallModeEditor.edit(&mut doc, &request).unwrap().version, 1);
    }

    #[test]
    fn install_mode_requires_mode() {
        let mut doc = doc();
        let result = InstallModeEditor.edit(&mut doc, &StrategyRequest::new());
        assert!(matches!(result, Err(EngineError::InvalidParameter(_))));
        assert_eq!(doc.text(), SPEC);
    }

    #[test]
    fn renders_provides() {
        let request = StrategyRequest::new().with_param(PROVIDES_SHOW, "*tool*");
        assert_eq!(
            ProvidesRenderer.render(&doc(), &request).unwrap(),
            "tool: tool-bin\ntool: tool-cli\ntool-libs: libtool-compat\n"
        );
    }

    #[test]
    fn model_writer_removes_then_adds() {
        let mut doc = doc();
        let request = StrategyRequest::new()
            .with_param(PROVIDES_REMOVE, "tool-*")
            .with_param(PROVIDES_ADD, "tool-ng = 2.0");
        let patch = ProvidesModelWriter.write(&mut doc, &request).unwrap();

        assert!(patch.preamble_changed);
        assert!(
            doc.text()
                .starts_with("Name:     tool\nProvides: tool-ng = 2.0\n\n%package libs\n")
        );
    }

    #[test]
    fn model_writer_needs_a_parameter() {
        let mut doc = doc();
        assert!(matches!(
            ProvidesModelWriter.write(&mut doc, &StrategyRequest::new()),
            Err(EngineError::InvalidParameter(_))
        ));
    }
}
