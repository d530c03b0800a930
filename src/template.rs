//! Answer-file rendering and environment-file generation
//!
//! Placeholder syntax is `${key}`; indexed keys (`${share1}`,
//! `${share1_username}`) are produced by the key builders in
//! `crate::resolved`; the renderer itself only ever does flat lookups.
//!
//! Substitution is literal: a resolved value is spliced into the output
//! verbatim, so values containing `$`, `&`, `\` or path separators can
//! never corrupt the output or re-enter the pattern language. A
//! placeholder with no corresponding key is left untouched, which keeps
//! partially-configured templates valid for manual completion.

use std::fmt::Write as _;

use crate::resolved::ResolvedConfig;

/// Render a template against the resolved configuration.
pub fn render(template: &str, config: &ResolvedConfig) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match config.get(key) {
                    Some(value) => out.push_str(value),
                    // Unknown key: pass the placeholder through unchanged.
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            // Unterminated opener, emit literally and stop scanning.
            None => {
                out.push_str("${");
                rest = after;
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Keys referenced by `template` that the configuration cannot supply.
///
/// Order of first appearance, deduplicated. Used by `validate` to report
/// what a build would leave behind for manual completion.
pub fn unresolved_keys(template: &str, config: &ResolvedConfig) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else { break };
        let key = &after[..end];
        if config.get(key).is_none() && !missing.iter().any(|k| k == key) {
            missing.push(key.to_string());
        }
        rest = &after[end + 1..];
    }
    missing
}

/// Generate the flat environment document enumerating every resolved
/// value for later provisioning steps.
///
/// One `KEY='value'` line per entry, keys uppercased and sorted, values
/// single-quote escaped so the file sources cleanly regardless of what
/// characters a password contains.
pub fn render_env(config: &ResolvedConfig) -> String {
    let mut out = String::from("# Generated by seedforge; sourced by provisioning steps.\n");
    for (key, value) in config.entries() {
        let _ = writeln!(
            out,
            "{}='{}'",
            key.to_uppercase(),
            value.replace('\'', r"'\''")
        );
    }
    out
}
