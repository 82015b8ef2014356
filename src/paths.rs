//! Settings file path resolution
//!
//! # Resolution Priority
//!
//! 1. `--config` flag (or `BERKS_DEPLOY_CONFIG`, read by the CLI parser)
//! 2. `XDG_CONFIG_HOME/berks-deploy/settings.toml`, if it exists
//! 3. `~/.config/berks-deploy/settings.toml`, if it exists
//! 4. `/etc/berks-deploy/settings.toml`

use std::path::{Path, PathBuf};

/// Environment variable for the settings file override
pub const ENV_CONFIG: &str = "BERKS_DEPLOY_CONFIG";

/// System-wide settings file
pub const SYSTEM_SETTINGS: &str = "/etc/berks-deploy/settings.toml";

const SETTINGS_FILE: &str = "settings.toml";
const APP_DIR: &str = "berks-deploy";

/// Resolve the settings file to load
pub fn settings_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        let path = expand(&path.to_string_lossy());
        log::debug!("Using settings from command line: {}", path.display());
        return path;
    }

    for candidate in user_candidates() {
        if candidate.exists() {
            log::debug!("Using user settings: {}", candidate.display());
            return candidate;
        }
    }

    log::debug!("Using system settings: {SYSTEM_SETTINGS}");
    PathBuf::from(SYSTEM_SETTINGS)
}

/// Per-user settings locations, most specific first
fn user_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        candidates.push(PathBuf::from(xdg_config).join(APP_DIR).join(SETTINGS_FILE));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".config").join(APP_DIR).join(SETTINGS_FILE));
    }
    candidates
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

/// [`expand`] for a path already parsed from settings
pub fn expand_path(path: &Path) -> PathBuf {
    expand(&path.to_string_lossy())
}

// ============================================================================
// Tests
// ============================================================================
