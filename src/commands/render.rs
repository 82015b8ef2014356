//! `render` - print the assembled config.json

use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::cli::ServerArgs;

pub fn run(ctx: &Context, args: &ServerArgs) -> Result<()> {
    let servers = super::load_servers(ctx, args.server.as_deref())?;
    let many = servers.len() > 1;

    for server in &servers {
        if many && !ctx.quiet {
            eprintln!("{}", format!("# {}", server.config_path().display()).dimmed());
        }
        print!("{}", server.render_config()?);
    }
    Ok(())
}
