//! Build-time orchestration
//!
//! One build run: read the three logical items from the secret store,
//! resolve every field, render the answer-file and the generated
//! environment document, and patch the boot menu in the extracted image
//! tree. Everything is re-resolved from the store on every run; there is
//! no caching between builds.
//!
//! Fatal resolution failures (missing or concealed credentials) abort
//! before the first artifact is written.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::bootmenu;
use crate::error::SeedForgeError;
use crate::resolved::ResolvedConfig;
use crate::secrets::labels;
use crate::secrets::store::{SecretStore, VaultItem};
use crate::template;

/// Title of the boot entry the patcher maintains; doubles as its anchor.
pub const AUTOMATED_ENTRY_TITLE: &str = "Automated install";

/// Boot timeout after patching, seconds.
pub const BOOT_TIMEOUT_SECS: u32 = 5;

/// The GRUB entry inserted into the installer image's menu. The preseed
/// path matches where the image-assembly step places the rendered
/// answer-file.
pub const AUTOMATED_ENTRY: &str = "\
menuentry \"Automated install\" {\n\
\tset gfxpayload=keep\n\
\tlinux  /install.amd/vmlinuz auto=true priority=critical preseed/file=/cdrom/preseed.cfg ---\n\
\tinitrd /install.amd/initrd.gz\n\
}";

/// File name of the rendered answer-file.
pub const ANSWER_FILE: &str = "preseed.cfg";

/// File name of the generated environment document.
pub const ENV_FILE: &str = "seedforge.env";

/// Inputs of one build run.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Answer-file template with `${key}` placeholders.
    pub template: PathBuf,
    /// Boot menu inside the externally extracted image tree; `None`
    /// skips patching (template-only runs).
    pub menu: Option<PathBuf>,
    /// Directory receiving the rendered artifacts.
    pub output_dir: PathBuf,
    pub vault: String,
}

/// What a build run produced.
#[derive(Debug)]
pub struct BuildReport {
    pub answer_file: PathBuf,
    pub env_file: PathBuf,
    pub menu_patched: bool,
    /// Placeholders the template still carries (left for manual
    /// completion; not an error).
    pub unresolved: Vec<String>,
}

/// Load the three logical items and assemble the resolved configuration.
///
/// The primary-credentials item is mandatory; missing shares/hosts items
/// degrade to empty collections.
pub fn resolve_from_store(store: &dyn SecretStore, vault: &str) -> Result<ResolvedConfig> {
    let primary = store
        .get_item(labels::PRIMARY_ITEM, vault)
        .with_context(|| format!("Primary credentials are required in vault '{}'", vault))?;
    let shares = optional_item(store, labels::SHARES_ITEM, vault)?;
    let hosts = optional_item(store, labels::HOSTS_ITEM, vault)?;
    let config = ResolvedConfig::from_items(&primary, shares.as_ref(), hosts.as_ref())?;
    Ok(config)
}

fn optional_item(store: &dyn SecretStore, title: &str, vault: &str) -> Result<Option<VaultItem>> {
    match store.get_item(title, vault) {
        Ok(item) => Ok(Some(item)),
        Err(SeedForgeError::NotFound(_)) => {
            debug!("Item '{}' absent in vault '{}'", title, vault);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Execute a build run.
pub fn run_build(store: &dyn SecretStore, plan: &BuildPlan) -> Result<BuildReport> {
    let template_text = fs::read_to_string(&plan.template)
        .with_context(|| format!("Failed to read template {:?}", plan.template))?;

    // Resolve everything before touching the filesystem.
    let config = resolve_from_store(store, &plan.vault)?;
    let rendered = template::render(&template_text, &config);
    let unresolved = template::unresolved_keys(&template_text, &config);
    let env_text = template::render_env(&config);

    fs::create_dir_all(&plan.output_dir)
        .with_context(|| format!("Failed to create output dir {:?}", plan.output_dir))?;

    let answer_file = plan.output_dir.join(ANSWER_FILE);
    fs::write(&answer_file, rendered)
        .with_context(|| format!("Failed to write answer file {:?}", answer_file))?;
    info!("Wrote answer file {:?}", answer_file);

    let env_file = plan.output_dir.join(ENV_FILE);
    fs::write(&env_file, env_text)
        .with_context(|| format!("Failed to write environment file {:?}", env_file))?;
    info!("Wrote environment file {:?}", env_file);

    let menu_patched = match &plan.menu {
        Some(menu) => {
            patch_menu(menu)?;
            true
        }
        None => false,
    };

    Ok(BuildReport {
        answer_file,
        env_file,
        menu_patched,
        unresolved,
    })
}

/// Patch the boot menu of an extracted image tree.
pub fn patch_menu(menu: &Path) -> Result<()> {
    bootmenu::patch_file(
        menu,
        AUTOMATED_ENTRY,
        AUTOMATED_ENTRY_TITLE,
        AUTOMATED_ENTRY_TITLE,
        BOOT_TIMEOUT_SECS,
    )
}

/// Report which template placeholders a build would leave unresolved.
pub fn validate_template(
    store: &dyn SecretStore,
    vault: &str,
    template: &Path,
) -> Result<Vec<String>> {
    let template_text = fs::read_to_string(template)
        .with_context(|| format!("Failed to read template {:?}", template))?;
    let config = resolve_from_store(store, vault)?;
    Ok(template::unresolved_keys(&template_text, &config))
}
