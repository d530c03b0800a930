//! seedforge - Main entry point
//!
//! Thin dispatch layer: initialize logging, verify the environment for
//! the chosen subcommand, then hand off to the library pipeline.

mod bootmenu;
mod builder;
mod capture;
mod cli;
mod discovery;
mod error;
mod records;
mod resolved;
mod runner;
mod sanity;
mod secrets;
mod template;
mod types;

use anyhow::Result;
use console::style;
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

use crate::builder::BuildPlan;
use crate::capture::prompt::{secret_required, TermPrompter};
use crate::capture::{persist_outcome, CaptureSession, NetDiscovery};
use crate::cli::{Cli, Commands};
use crate::error::SeedForgeError;
use crate::records::Host;
use crate::secrets::store::OpCliStore;

/// Initialize the logger with appropriate settings
fn init_logger() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            // RUST_LOG overrides the default level.
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logger();
    info!("seedforge starting up");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match cli.command {
        Commands::Capture {
            slots,
            vault,
            no_scan,
            subnet,
        } => {
            check_environment(if no_scan { &["op"] } else { &["op", "ip"] });
            run_capture(slots, &vault, no_scan, subnet.as_deref())
        }
        Commands::Build {
            template,
            menu,
            output,
            vault,
        } => {
            check_environment(&["op"]);
            run_build(BuildPlan {
                template,
                menu,
                output_dir: output,
                vault,
            })
        }
        Commands::Scan { subnet, json } => {
            check_environment(&["ip"]);
            run_scan(subnet.as_deref(), json)
        }
        Commands::Shares { host, username } => run_shares(&host, username.as_deref()),
        Commands::Validate { template, vault } => {
            check_environment(&["op"]);
            run_validate(&template, &vault)
        }
    }
}

/// Verify external tools and exit with a report when a required one is
/// missing. Missing optional tools only log the strategy they disable.
fn check_environment(needed: &[&str]) {
    let result = sanity::verify_environment(needed);
    for binary in &result.missing_optional {
        warn!(
            "Optional tool '{}' not found (package {}); a fallback strategy will be used",
            binary,
            sanity::providing_package(binary)
        );
    }
    if !result.is_ok() {
        eprintln!("{} Missing required tools:", style("✗").red().bold());
        for binary in &result.missing_required {
            eprintln!("    {} (install {})", binary, sanity::providing_package(binary));
        }
        std::process::exit(1);
    }
}

fn resolve_subnet(override_cidr: Option<&str>) -> Result<discovery::Subnet> {
    match override_cidr {
        Some(cidr) => Ok(cidr.parse()?),
        None => Ok(discovery::detect_local_subnet()?),
    }
}

fn run_capture(
    slots: Option<usize>,
    vault: &str,
    no_scan: bool,
    subnet: Option<&str>,
) -> Result<()> {
    // Fail fast on a missing store session before any operator work.
    let mut store = OpCliStore::connect()?;

    let discovered = if no_scan {
        Vec::new()
    } else {
        let subnet = resolve_subnet(subnet)?;
        println!("Scanning {} ...", style(subnet).bold());
        match discovery::scan_subnet(&subnet) {
            Ok(hosts) => {
                println!("Found {} host(s).", hosts.len());
                hosts
            }
            Err(e) => {
                // Discovery failures degrade to manual capture.
                warn!("Subnet scan failed: {}; continuing with manual entry", e);
                Vec::new()
            }
        }
    };

    let mut prompter = TermPrompter::new();
    let net = NetDiscovery;
    let outcome = match CaptureSession::new(&mut prompter, &net, discovered).run(slots) {
        Ok(outcome) => outcome,
        Err(SeedForgeError::Aborted) => {
            eprintln!(
                "{} Capture aborted; the secret store was not modified.",
                style("✗").red().bold()
            );
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    persist_outcome(&mut store, vault, &outcome)?;
    println!(
        "{} Captured {} host(s) and {} share(s) into vault '{}'.",
        style("✓").green().bold(),
        outcome.hosts.len(),
        outcome.shares.len(),
        vault
    );
    Ok(())
}

fn run_build(plan: BuildPlan) -> Result<()> {
    let store = OpCliStore::connect()?;
    let report = builder::run_build(&store, &plan)?;

    println!(
        "{} Wrote {}",
        style("✓").green().bold(),
        report.answer_file.display()
    );
    println!(
        "{} Wrote {}",
        style("✓").green().bold(),
        report.env_file.display()
    );
    if report.menu_patched {
        println!("{} Boot menu patched.", style("✓").green().bold());
    }
    if !report.unresolved.is_empty() {
        println!(
            "{} Left for manual completion: {}",
            style("!").yellow().bold(),
            report.unresolved.join(", ")
        );
    }
    Ok(())
}

fn run_scan(subnet: Option<&str>, json: bool) -> Result<()> {
    let subnet = resolve_subnet(subnet)?;
    println!("Scanning {} ...", style(subnet).bold());
    let mut hosts = discovery::scan_subnet(&subnet)?;
    for host in &mut hosts {
        host.services = discovery::detect_services_at(host.address);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&hosts)?);
        return Ok(());
    }
    if hosts.is_empty() {
        println!("No live hosts found on {}.", subnet);
        return Ok(());
    }
    for host in &hosts {
        let services: Vec<String> = host.services.iter().map(|s| s.to_string()).collect();
        let services = if services.is_empty() {
            "-".to_string()
        } else {
            services.join(", ")
        };
        println!("{:<16} {:<24} {}", host.address, host.name, services);
    }
    Ok(())
}

fn run_shares(host: &str, username: Option<&str>) -> Result<()> {
    let address: Ipv4Addr = host
        .parse()
        .map_err(|_| SeedForgeError::invalid(format!("'{}' is not an IPv4 address", host)))?;
    let host = Host::unnamed(address);

    let credentials = match username {
        Some(username) => {
            let mut prompter = TermPrompter::new();
            let password = secret_required(&mut prompter, &format!("Password for {}: ", username))?;
            Some(records::Credentials {
                username: username.to_string(),
                password,
            })
        }
        None => None,
    };

    match discovery::list_smb_shares(&host, credentials.as_ref()) {
        Ok(shares) if shares.is_empty() => println!("SMB: no shares visible."),
        Ok(shares) => {
            println!("SMB shares:");
            for share in shares {
                println!("    {}", share);
            }
        }
        Err(e) => println!("SMB: {}", e),
    }
    match discovery::list_nfs_exports(&host) {
        Ok(exports) if exports.is_empty() => println!("NFS: no exports published."),
        Ok(exports) => {
            println!("NFS exports:");
            for export in exports {
                println!("    {}", export);
            }
        }
        Err(e) => println!("NFS: {}", e),
    }
    Ok(())
}

fn run_validate(template: &std::path::Path, vault: &str) -> Result<()> {
    let store = OpCliStore::connect()?;
    let unresolved = builder::validate_template(&store, vault, template)?;
    if unresolved.is_empty() {
        println!(
            "{} Every placeholder resolves against vault '{}'.",
            style("✓").green().bold(),
            vault
        );
    } else {
        println!(
            "{} {} placeholder(s) would be left for manual completion:",
            style("!").yellow().bold(),
            unresolved.len()
        );
        for key in unresolved {
            println!("    ${{{}}}", key);
        }
        std::process::exit(1);
    }
    Ok(())
}
