//! Tandem CLI binary.
//!
//! This binary provides command-line access to a Tandem file store:
//! - Upload local files
//! - List, show, rename and delete stored files
//! - Apply database migrations

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, handle_command};

    let _ = dotenvy::dotenv();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = tandem::TandemConfig::load(cli.config.as_deref())?;
    tandem::init_logging(config.logging(), cli.verbose)?;

    handle_command(cli.command, &config).await?;

    Ok(())
}
