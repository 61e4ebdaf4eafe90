//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Tandem - file storage with consistent metadata and contents
#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(about = "File storage with consistent metadata and contents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file layered over the defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a local file
    Upload {
        /// Path of the file to upload
        path: PathBuf,

        /// Display name; the file's own extension is appended
        #[arg(long)]
        name: Option<String>,

        /// Opaque metadata to store with the file
        #[arg(long)]
        data: Option<String>,

        /// Content type recorded for the file
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },

    /// List stored files
    List {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Show one stored file
    Show {
        /// ID of the file
        id: i32,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Rename a file and/or replace its metadata
    Rename {
        /// ID of the file
        id: i32,

        /// New display name; the current extension is kept
        #[arg(long)]
        name: Option<String>,

        /// New opaque metadata
        #[arg(long)]
        data: Option<String>,
    },

    /// Delete a file's record and contents
    Delete {
        /// ID of the file
        id: i32,
    },

    /// Apply pending database migrations
    Migrate,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
