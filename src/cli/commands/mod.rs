pub mod init;
pub mod process;
pub mod translate;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::{Config, load_config};
use crate::core::text::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

/// A problem found while running a command, tied to a file and optionally a
/// position in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Path as displayed to the user.
    pub file: String,
    pub position: Option<Position>,
    pub message: String,
    /// The source line at `position`, shown under the location.
    pub source_line: Option<String>,
}

impl Diagnostic {
    pub fn error(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            file: file.into(),
            position: None,
            message: message.into(),
            source_line: None,
        }
    }

    pub fn warning(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(file, message)
        }
    }

    pub fn at(mut self, position: Position, source_line: Option<&str>) -> Self {
        self.position = Some(position);
        self.source_line = source_line.map(str::to_string);
        self
    }
}

#[derive(Debug, Default)]
pub struct ProcessSummary {
    pub files_scanned: usize,
    pub files_rewritten: usize,
    pub messages: usize,
    /// Bundle id when `nls.metadata.json` was written.
    pub bundle_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct TranslateSummary {
    pub bundles: usize,
    pub languages: usize,
    pub files_written: usize,
}

#[derive(Debug)]
pub struct InitSummary {
    pub created: bool,
}

#[derive(Debug)]
pub enum CommandSummary {
    Process(ProcessSummary),
    Translate(TranslateSummary),
    Init(InitSummary),
}

/// Result of running nlsx commands
#[derive(Debug)]
pub struct CommandResult {
    pub summary: CommandSummary,
    pub diagnostics: Vec<Diagnostic>,
    /// If true, exit code 1 should be returned when there are errors.
    pub exit_on_errors: bool,
}

impl CommandResult {
    pub fn new(summary: CommandSummary, mut diagnostics: Vec<Diagnostic>) -> Self {
        diagnostics.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then_with(|| a.position.cmp(&b.position))
                .then_with(|| a.severity.cmp(&b.severity))
        });
        Self {
            summary,
            diagnostics,
            exit_on_errors: true,
        }
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Configuration plus the directories a command works on.
pub struct CommandContext {
    pub config: Config,
    /// Directory relative config paths are resolved against.
    pub base_dir: PathBuf,
    /// Directory holding the compiled output.
    pub root: PathBuf,
}

impl CommandContext {
    /// Load the config found from the current directory; `root` from the
    /// command line wins over the configured one.
    pub fn load(root: Option<&Path>, verbose: bool) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let loaded = load_config(&cwd)?;

        if verbose && !loaded.from_file {
            eprintln!("Note: No .nlsrc.json found, using default configuration");
        }

        let root = match root {
            Some(root) => cwd.join(root),
            None => loaded.base_dir.join(&loaded.config.root),
        };
        Ok(Self {
            config: loaded.config,
            base_dir: loaded.base_dir,
            root,
        })
    }

    /// Resolve a path from the command line against the working directory,
    /// or a configured one against the config directory.
    pub fn resolve(&self, cli: Option<&Path>, configured: &str) -> Result<PathBuf> {
        Ok(match cli {
            Some(path) => std::env::current_dir()?.join(path),
            None => self.base_dir.join(configured),
        })
    }
}
