//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the tandem binary.

mod commands;
mod files;

pub use commands::Cli;
pub use files::handle_command;
