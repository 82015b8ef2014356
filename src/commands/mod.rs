pub mod check;
pub mod converge;
pub mod diff;
pub mod doctor;
pub mod render;

use anyhow::Result;
use std::path::Path;

use crate::Context;
use crate::descriptor::ServerDescriptor;
use crate::paths;
use crate::schema::Settings;

/// Load the settings file selected by the global flags
pub fn load_settings(ctx: &Context) -> Result<Settings> {
    let path = paths::settings_path(ctx.config.as_deref());
    log::info!("Loading settings from {}", path.display());
    Settings::load(&path)
}

/// Resolve the servers a command should act on
pub fn load_servers(ctx: &Context, only: Option<&Path>) -> Result<Vec<ServerDescriptor>> {
    let settings = load_settings(ctx)?;
    let servers = ServerDescriptor::resolve_all(&settings, only)?;
    if servers.is_empty() {
        log::warn!("No servers declared in settings");
    }
    Ok(servers)
}
