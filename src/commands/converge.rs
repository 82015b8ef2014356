//! `install` and `uninstall`

use anyhow::{Result, bail};
use declarative::ExecutionPlan;
use std::path::Path;

use crate::Context;
use crate::cli::ConvergeArgs;
use crate::descriptor::ServerDescriptor;
use crate::engine::{self, RunOptions};
use crate::platform::OS_RELEASE;
use crate::runner::{self, SystemRunner};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Uninstall,
}

pub fn install(ctx: &Context, args: &ConvergeArgs) -> Result<()> {
    run(ctx, args, Action::Install)
}

pub fn uninstall(ctx: &Context, args: &ConvergeArgs) -> Result<()> {
    run(ctx, args, Action::Uninstall)
}

fn run(ctx: &Context, args: &ConvergeArgs, action: Action) -> Result<()> {
    if !args.dry_run && !runner::is_root() {
        bail!("Converging a server requires root; re-run with sudo or use --dry-run");
    }

    let servers = super::load_servers(ctx, args.target.server.as_deref())?;
    let opts = RunOptions {
        dry_run: args.dry_run,
        yes: args.yes,
        verbose: ctx.verbose > 0,
    };

    let total = servers.len();
    for (i, server) in servers.iter().enumerate() {
        if !ctx.quiet {
            ui::step(i + 1, total, &server.path.display().to_string());
        }
        let plan = build_plan(server, action, Path::new(OS_RELEASE))?;
        engine::run(&plan, &opts, &SystemRunner)?;
    }

    if total > 0 && !ctx.quiet && !args.dry_run {
        ui::success(match action {
            Action::Install => "All servers installed",
            Action::Uninstall => "All servers uninstalled",
        });
    }
    Ok(())
}

/// Plan for one server and action
pub fn build_plan(
    server: &ServerDescriptor,
    action: Action,
    os_release: &Path,
) -> Result<ExecutionPlan> {
    match action {
        Action::Install => engine::install_plan(server, os_release),
        Action::Uninstall => Ok(engine::uninstall_plan(server)),
    }
}
