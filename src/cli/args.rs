//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `process`: Rewrite localize calls in compiled output and write message bundles
//! - `translate`: Build translated message files from bundles and `.i18n.json` files
//! - `init`: Initialize nlsx configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Process(cmd)) => cmd.common.verbose,
            Some(Command::Translate(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Directory with the compiled output (overrides config file)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Write rewritten files and bundles here instead of in place
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Write nls.metadata.json and its header with this bundle id
    #[arg(long)]
    pub bundle_id: Option<String>,

    /// Localization module to look for (default: vscode-nls)
    #[arg(long)]
    pub module_name: Option<String>,

    /// Reference files relative to __dirname instead of with __filename
    #[arg(long)]
    pub relative_paths: bool,
}

#[derive(Debug, Args)]
pub struct TranslateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Folder with translated .i18n.json files (overrides config file)
    #[arg(long)]
    pub i18n: Option<PathBuf>,

    /// Language as FOLDER[:ID], e.g. `deu:de`. Can be specified multiple times
    #[arg(long = "language", short = 'l', required = true)]
    pub languages: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replace localize call keys and messages with bundle indices
    Process(ProcessArgs),
    /// Write translated message bundles for each language
    Translate(TranslateArgs),
    /// Initialize a new .nlsrc.json configuration file
    Init,
}
