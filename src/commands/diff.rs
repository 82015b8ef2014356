//! `diff` - preview what install would change

use anyhow::Result;
use colored::Colorize;
use declarative::{ApplyContext, compute_diffs};
use std::fs;
use std::path::Path;

use crate::Context;
use crate::cli::ServerArgs;
use crate::engine::{differ, install_plan};
use crate::platform::OS_RELEASE;
use crate::runner::SystemRunner;

pub fn run(ctx: &Context, args: &ServerArgs) -> Result<()> {
    let servers = super::load_servers(ctx, args.server.as_deref())?;
    let apply_ctx = ApplyContext::new(true, ctx.verbose > 0, &SystemRunner);

    for server in &servers {
        let plan = install_plan(server, Path::new(OS_RELEASE))?;
        differ::display_diff(&plan.name, &compute_diffs(&plan.steps, &apply_ctx));

        let config_path = server.config_path();
        println!();
        println!("  {} {}", "config:".dimmed(), config_path.display());
        let current = fs::read_to_string(&config_path).ok();
        if current.is_none() {
            log::debug!("{} not readable; diffing against empty", config_path.display());
        }
        differ::show_text_diff(current.as_deref(), &server.render_config()?);
    }
    Ok(())
}
