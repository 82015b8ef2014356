//! `check` - validate settings and show resolved servers

use anyhow::Result;

use crate::Context;
use crate::descriptor::ServerDescriptor;
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let path = paths::settings_path(ctx.config.as_deref());
    let settings = super::load_settings(ctx)?;
    let servers = ServerDescriptor::resolve_all(&settings, None)?;

    ui::success(&format!("{} is valid", path.display()));
    if servers.is_empty() {
        ui::warn("No servers declared");
        return Ok(());
    }

    for server in &servers {
        print_server(server);
    }
    Ok(())
}

fn print_server(server: &ServerDescriptor) {
    ui::section(&server.path.display().to_string());
    ui::kv("version", &server.version);
    ui::kv(
        "install",
        &if server.install_from_source {
            format!(
                "from source ({} into {})",
                server.source_repository,
                server.install_path.display()
            )
        } else {
            "gem".to_string()
        },
    );
    ui::kv("port", &server.port.to_string());
    ui::kv("account", &format!("{}:{}", server.user, server.group));
    ui::kv("ruby", &server.ruby_version);
    ui::kv("service", &server.service_name);
    ui::kv("binary", &server.server_binary());

    let enabled = server.endpoints.iter().filter(|e| e.enabled).count();
    ui::kv(
        "endpoints",
        &format!("{enabled} enabled of {}", server.endpoints.len()),
    );
    for endpoint in &server.endpoints {
        let name = endpoint.kind.name();
        if endpoint.enabled {
            ui::dim(&format!("  • {name}"));
        } else {
            ui::dim(&format!("  • {name} (disabled)"));
        }
    }
}
