// CLI definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hidpp-harness")]
#[command(author, version, about = "HID++ 2.0 feature codec and descriptor tools")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Session file mapping feature ids to indices (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub session: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List builtin features and their versions
    #[command(visible_aliases = ["feat", "f"])]
    Features,

    /// Show interface attributes and bound classes of a feature version
    #[command(visible_alias = "desc", disable_version_flag = true)]
    Describe {
        /// Feature id (0x1861) or name (BatteryLevelsCalibration)
        #[arg(short, long)]
        feature: String,

        /// Feature version
        #[arg(short, long, default_value_t = 0)]
        version: u8,
    },

    /// Decode a frame given as hex
    #[command(visible_alias = "d", disable_version_flag = true)]
    Decode {
        /// Feature id or name; without it the session table routes the frame
        #[arg(short, long)]
        feature: Option<String>,

        /// Feature version used with --feature
        #[arg(short, long, default_value_t = 0)]
        version: u8,

        /// Frame bytes ("11 01 04 40 02 00 00" or "11010440020000")
        #[arg(required = true, num_args = 1..)]
        hex: Vec<String>,
    },

    /// Feature descriptor tools
    #[command(subcommand)]
    Descriptor(DescriptorCommands),
}

#[derive(Subcommand)]
pub enum DescriptorCommands {
    /// Load a descriptor and check frame sizes for every version
    Validate {
        /// Descriptor file (.json or .toml)
        file: PathBuf,
    },

    /// Regenerate and print the message classes of one version
    #[command(disable_version_flag = true)]
    Layout {
        /// Descriptor file (.json or .toml)
        file: PathBuf,

        /// Feature version
        #[arg(short, long)]
        version: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_decode() {
        let cli = Cli::try_parse_from([
            "hidpp-harness",
            "--log-level",
            "debug",
            "decode",
            "--feature",
            "0x1861",
            "11",
            "01",
            "04",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        match cli.command {
            Commands::Decode { feature, hex, .. } => {
                assert_eq!(feature.as_deref(), Some("0x1861"));
                assert_eq!(hex, vec!["11", "01", "04"]);
            }
            _ => panic!("expected decode"),
        }
    }

    #[test]
    fn test_parse_descriptor_layout() {
        let cli = Cli::try_parse_from([
            "hidpp-harness",
            "descriptor",
            "layout",
            "battery.toml",
            "--version",
            "1",
            "--session",
            "session.toml",
        ])
        .unwrap();
        assert_eq!(cli.session, Some(PathBuf::from("session.toml")));
        assert!(matches!(
            cli.command,
            Commands::Descriptor(DescriptorCommands::Layout { version: 1, .. })
        ));
    }
}
