//! Dispatch of a parsed command line to its command handler.
//!
//! # Returns
//! - `Ok(CommandResult)` with the diagnostics and exit behavior
//! - `Err` if the command fails (e.g., invalid config, missing root directory)

use anyhow::Result;

use super::{
    args::{Arguments, Command},
    commands::{CommandResult, init::init, process::process, translate::translate},
};

pub fn run(Arguments { command }: Arguments) -> Result<CommandResult> {
    match command {
        Some(Command::Process(cmd)) => process(cmd),
        Some(Command::Translate(cmd)) => translate(cmd),
        Some(Command::Init) => init(),
        None => {
            anyhow::bail!("No command provided. Use --help to see available commands.")
        }
    }
}
