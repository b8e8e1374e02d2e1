//! Command-line arguments for `specedit`.

use clap::Parser;
use std::path::PathBuf;

/// Parse an RPM spec file, optionally edit it, and print the result.
///
/// Without options the file is printed back unchanged.
#[derive(Debug, Parser)]
#[command(name = "specedit", version)]
pub struct Args {
    /// The spec file to read.
    pub file: PathBuf,

    /// Merge the sections of the side-channel spec file into FILE.
    #[arg(long)]
    pub sections_add: bool,

    /// Editor strategy: a registered name or a path to an executable.
    #[arg(long, value_name = "NAME|PATH")]
    pub custom_editor: Option<String>,

    /// Octal mode for `install` commands in %install (install-mode editor).
    #[arg(long, value_name = "MODE")]
    pub install_edit: Option<String>,

    /// Renderer strategy: a registered name or a path to an executable.
    #[arg(long, value_name = "NAME|PATH")]
    pub custom_manipulator_renderer: Option<String>,

    /// List provides entries whose name matches GLOB (provides renderer).
    #[arg(long, value_name = "GLOB")]
    pub provides_show: Option<String>,

    /// Model writer strategy: a registered name or a path to an executable.
    #[arg(long, value_name = "NAME|PATH")]
    pub custom_model_writer: Option<String>,

    /// Remove a provides entry, `name [op version]` (provides model writer).
    #[arg(long, value_name = "ENTRY")]
    pub provides_remove: Option<String>,

    /// Add a provides entry, `name [op version]` (provides model writer).
    #[arg(long, value_name = "ENTRY")]
    pub provides_add: Option<String>,

    /// Read side-channel content from PATH instead of standard input.
    #[arg(long, value_name = "PATH")]
    pub side_channel: Option<PathBuf>,

    /// Print the syntax tree instead of the file.
    #[arg(long)]
    pub dump_tree: bool,

    /// Configuration file [default: ~/.config/specedit/config.toml].
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Strategy parameters given on the command line.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        [
            ("install-edit", &self.install_edit),
            ("provides-show", &self.provides_show),
            ("provides-remove", &self.provides_remove),
            ("provides-add", &self.provides_add),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|value| (key, value)))
        .collect()
    }

    /// Editor to run, if any; `--install-edit` alone selects the built-in.
    pub fn editor(&self) -> Option<&str> {
        self.custom_editor
            .as_deref()
            .or(self.install_edit.as_ref().map(|_| "install-mode"))
    }

    pub fn renderer(&self) -> Option<&str> {
        self.custom_manipulator_renderer
            .as_deref()
            .or(self.provides_show.as_ref().map(|_| "provides"))
    }

    pub fn model_writer(&self) -> Option<&str> {
        self.custom_model_writer.as_deref().or(self
            .provides_remove
            .as_ref()
            .or(self.provides_add.as_ref())
            .map(|_| "provides"))
    }
}
