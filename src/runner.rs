//! Captured-output execution of external tools
//!
//! All external commands in the pipeline (iproute2, nmap, ping, getent,
//! smbclient, showmount, op) go through `run_command` so that every
//! invocation is logged uniformly and its output captured rather than
//! inherited. Commands here are short-lived queries; nothing long-running
//! is spawned.

use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use tracing::debug;

/// Longest stdout/stderr prefix echoed into the debug log.
const LOG_TRUNCATE: usize = 500;

/// Captured result of an external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl CommandOutput {
    /// Lines of stdout with trailing whitespace removed, empties skipped.
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
    }
}

/// Execute a command and capture its output.
///
/// Spawn failure (binary missing, not executable) is an error; a non-zero
/// exit is NOT; callers inspect `success`/`exit_code` because for most of
/// the tools here a non-zero exit is an expected, meaningful outcome
/// (unreachable host, denied share list).
pub fn run_command(program: &str, args: &[&str]) -> Result<CommandOutput> {
    debug!("Executing command: {} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Failed to spawn '{}'", program))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code();

    debug!(
        "Command '{}' exited with {:?}; stdout: {}; stderr: {}",
        program,
        exit_code,
        truncated(&stdout),
        truncated(&stderr)
    );

    Ok(CommandOutput {
        stdout,
        stderr,
        exit_code,
        success: output.status.success(),
    })
}

/// Check if a binary is available in PATH.
pub fn binary_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn truncated(text: &str) -> String {
    if text.len() > LOG_TRUNCATE {
        let cut = text
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|&i| i <= LOG_TRUNCATE)
            .last()
            .unwrap_or(0);
        format!("{}... [truncated]", &text[..cut])
    } else {
        text.trim_end().to_string()
    }
}
