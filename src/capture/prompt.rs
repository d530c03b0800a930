//! Operator prompting seam
//!
//! `Prompter` is the trait boundary around raw line I/O so the capture
//! session can be driven by a real terminal in production and by a
//! scripted transcript in tests. The menu contract itself (numbered
//! options, bounds re-validation, re-prompt on invalid input) lives in
//! the free functions here, on top of the raw primitives, so both
//! implementations get identical behavior.

// Library API - the scripted prompter is consumed by the test suite
#![allow(dead_code)]

use console::{style, Term};
use std::collections::VecDeque;

use crate::error::{Result, SeedForgeError};

/// Raw line I/O primitives. `None` from a read means the operator
/// aborted (EOF / closed terminal).
pub trait Prompter {
    /// Print a line to the operator.
    fn say(&mut self, text: &str);

    /// Prompt and read one line, trimmed.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Prompt and read one line without echo.
    fn read_secret(&mut self, prompt: &str) -> Result<Option<String>>;
}

// ============================================================================
// Menu contract
// ============================================================================

/// Present a numbered menu and return the selected index in `1..=len`.
///
/// Invalid input (non-numeric, out of bounds) re-prompts indefinitely;
/// there is no silent fallback to a default. Abort surfaces as
/// `Aborted`; an empty option list is a caller bug surfaced as `Invalid`.
pub fn select(prompter: &mut dyn Prompter, title: &str, options: &[String]) -> Result<usize> {
    if options.is_empty() {
        return Err(SeedForgeError::invalid(format!(
            "menu '{}' offered no options",
            title
        )));
    }
    prompter.say("");
    prompter.say(title);
    for (idx, option) in options.iter().enumerate() {
        prompter.say(&format!("{}) {}", idx + 1, option));
    }
    loop {
        let Some(line) = prompter.read_line("Your selection: ")? else {
            return Err(SeedForgeError::Aborted);
        };
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(n),
            _ => prompter.say(&format!(
                "Invalid selection; enter a number between 1 and {}.",
                options.len()
            )),
        }
    }
}

/// Read a non-empty line, re-prompting on empty input.
pub fn input_required(prompter: &mut dyn Prompter, prompt: &str) -> Result<String> {
    loop {
        let Some(line) = prompter.read_line(prompt)? else {
            return Err(SeedForgeError::Aborted);
        };
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
        prompter.say("A value is required.");
    }
}

/// Read an optional line; empty input means "none".
pub fn input_optional(prompter: &mut dyn Prompter, prompt: &str) -> Result<Option<String>> {
    let Some(line) = prompter.read_line(prompt)? else {
        return Err(SeedForgeError::Aborted);
    };
    let trimmed = line.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Read a non-empty secret without echo, re-prompting on empty input.
pub fn secret_required(prompter: &mut dyn Prompter, prompt: &str) -> Result<String> {
    loop {
        let Some(line) = prompter.read_secret(prompt)? else {
            return Err(SeedForgeError::Aborted);
        };
        if !line.is_empty() {
            return Ok(line);
        }
        prompter.say("A value is required.");
    }
}

/// Yes/no question with a default.
pub fn confirm(prompter: &mut dyn Prompter, prompt: &str, default: bool) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    loop {
        let Some(line) = prompter.read_line(&format!("{} {} ", prompt, hint))? else {
            return Err(SeedForgeError::Aborted);
        };
        match line.trim().to_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => prompter.say("Please answer y or n."),
        }
    }
}

// ============================================================================
// Terminal prompter
// ============================================================================

/// Production prompter over the attached terminal.
pub struct TermPrompter {
    term: Term,
}

impl TermPrompter {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

impl Default for TermPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TermPrompter {
    fn say(&mut self, text: &str) {
        let _ = self.term.write_line(text);
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let _ = self
            .term
            .write_str(&format!("{}", style(prompt).cyan().bold()));
        match self.term.read_line() {
            Ok(line) => Ok(Some(line)),
            // Closed terminal / EOF is an operator abort, not an IO bug.
            Err(_) => Ok(None),
        }
    }

    fn read_secret(&mut self, prompt: &str) -> Result<Option<String>> {
        let _ = self
            .term
            .write_str(&format!("{}", style(prompt).cyan().bold()));
        match self.term.read_secure_line() {
            Ok(line) => Ok(Some(line)),
            Err(_) => Ok(None),
        }
    }
}

// ============================================================================
// Scripted prompter
// ============================================================================

/// Test prompter fed from a fixed transcript. Reads pop from the front;
/// an exhausted transcript reads as operator abort. Everything said to
/// the operator is recorded for assertions.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub transcript: Vec<String>,
}

impl ScriptedPrompter {
    pub fn with_answers(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|s| s.to_string()).collect(),
            transcript: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn say(&mut self, text: &str) {
        self.transcript.push(text.to_string());
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.transcript.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }

    fn read_secret(&mut self, prompt: &str) -> Result<Option<String>> {
        self.read_line(prompt)
    }
}
