use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::secrets::labels::DEFAULT_VAULT;

/// seedforge - configuration payload builder for unattended installer media
#[derive(Parser)]
#[command(name = "seedforge")]
#[command(about = "Discovers network storage, captures installer configuration into a secret \
                   store, and renders unattended-install artifacts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover hosts and interactively capture configuration into the store
    Capture {
        /// Number of host/share slots to configure (prompted for when omitted)
        #[arg(short, long)]
        slots: Option<usize>,

        /// Vault receiving the three configuration items
        #[arg(long, default_value = DEFAULT_VAULT)]
        vault: String,

        /// Skip the subnet scan and enter every host manually
        #[arg(long)]
        no_scan: bool,

        /// Scan this subnet instead of auto-detecting (CIDR, e.g. 10.0.0.0/24)
        #[arg(long)]
        subnet: Option<String>,
    },
    /// Resolve the store and render the answer-file, environment file and boot menu
    Build {
        /// Answer-file template containing ${key} placeholders
        #[arg(short, long)]
        template: PathBuf,

        /// Boot menu inside the extracted image tree (skips patching when omitted)
        #[arg(short, long)]
        menu: Option<PathBuf>,

        /// Directory receiving the rendered artifacts
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Vault holding the configuration items
        #[arg(long, default_value = DEFAULT_VAULT)]
        vault: String,
    },
    /// Diagnostic: detect the local subnet and list live hosts with their services
    Scan {
        /// Scan this subnet instead of auto-detecting
        #[arg(long)]
        subnet: Option<String>,

        /// Print the host list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Diagnostic: enumerate shares and exports on one host
    Shares {
        /// Host address to query
        #[arg(long)]
        host: String,

        /// Query SMB with this username (password prompted; anonymous when omitted)
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Report which template placeholders a build would leave unresolved
    Validate {
        /// Answer-file template to check
        #[arg(short, long)]
        template: PathBuf,

        /// Vault holding the configuration items
        #[arg(long, default_value = DEFAULT_VAULT)]
        vault: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_defaults() {
        let cli = Cli::try_parse_from(["seedforge", "capture"]).unwrap();
        match cli.command {
            Commands::Capture {
                slots,
                vault,
                no_scan,
                subnet,
            } => {
                assert_eq!(slots, None);
                assert_eq!(vault, DEFAULT_VAULT);
                assert!(!no_scan);
                assert!(subnet.is_none());
            }
            _ => panic!("expected capture"),
        }
    }

    #[test]
    fn test_build_requires_template() {
        assert!(Cli::try_parse_from(["seedforge", "build"]).is_err());
        let cli =
            Cli::try_parse_from(["seedforge", "build", "--template", "preseed.tpl"]).unwrap();
        match cli.command {
            Commands::Build { template, menu, .. } => {
                assert_eq!(template, PathBuf::from("preseed.tpl"));
                assert!(menu.is_none());
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_scan_json_flag() {
        let cli = Cli::try_parse_from(["seedforge", "scan", "--json"]).unwrap();
        match cli.command {
            Commands::Scan { json, .. } => assert!(json),
            _ => panic!("expected scan"),
        }
    }
}
