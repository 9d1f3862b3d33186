//! HID++ harness CLI
//!
//! Inspect builtin features, decode captured frames and check feature
//! descriptors from the command line.

use clap::Parser;
use tracing_subscriber::EnvFilter;

// CLI definitions
mod cli;
use cli::{Cli, Commands, DescriptorCommands};

// Command handlers
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Features => commands::features::list()?,
        Commands::Describe { feature, version } => {
            commands::features::describe(&feature, version)?;
        }
        Commands::Decode {
            feature,
            version,
            hex,
        } => {
            commands::decode::decode(feature.as_deref(), version, cli.session.as_deref(), &hex)?;
        }
        Commands::Descriptor(DescriptorCommands::Validate { file }) => {
            commands::descriptor::validate(&file)?;
        }
        Commands::Descriptor(DescriptorCommands::Layout { file, version }) => {
            commands::descriptor::layout(&file, version)?;
        }
    }
    Ok(())
}
