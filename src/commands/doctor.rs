use anyhow::Result;
use colored::Colorize;
use declarative::ApplyContext;
use std::path::Path;

use crate::Context;
use crate::descriptor::ServerDescriptor;
use crate::platform::{self, OS_RELEASE};
use crate::resource::Ownership;
use crate::runner::{self, SystemRunner};
use crate::ui;

struct Issue {
    category: &'static str,
    summary: String,
    detail: Option<String>,
    fix: Option<String>,
}

pub fn run(ctx: &Context) -> Result<()> {
    ui::header("System Health Check");

    let mut issues: Vec<Issue> = Vec::new();

    check_platform(&mut issues);
    check_commands(&mut issues);
    check_settings(ctx, &mut issues);

    println!();
    if issues.is_empty() {
        ui::success("Ready to install");
    } else {
        print_issue_summary(&issues);
    }

    Ok(())
}

fn print_issue_summary(issues: &[Issue]) {
    let count = issues.len();
    let label = if count == 1 { "Issue" } else { "Issues" };
    ui::header(&format!("{count} {label} Found"));

    for (i, issue) in issues.iter().enumerate() {
        let num = i + 1;
        println!(
            "  {}  {} {}",
            format!("{num}.").bold(),
            issue.summary,
            format!("[{}]", issue.category).dimmed()
        );
        if let Some(detail) = &issue.detail {
            for line in detail.lines() {
                println!("      {}", line.dimmed());
            }
        }
        if let Some(fix) = &issue.fix {
            println!("      {} {}", "Fix:".cyan(), fix);
        }
        println!();
    }
}

fn check_platform(issues: &mut Vec<Issue>) {
    ui::section("Platform");

    match platform::detect(Path::new(OS_RELEASE)) {
        Ok(family) => println!(
            "  {} {} - installs {}",
            "✓".green(),
            family,
            family.libarchive_package().dimmed()
        ),
        Err(e) => {
            println!("  {} {}", "✗".red(), e);
            issues.push(Issue {
                category: "Platform",
                summary: "Package family not supported".to_string(),
                detail: Some(e.to_string()),
                fix: Some("Install on a Debian or RHEL family host".to_string()),
            });
        }
    }
}

fn check_commands(issues: &mut Vec<Issue>) {
    ui::section("Required Commands");

    let commands = [
        ("getent", "Account lookup"),
        ("groupadd", "Group management"),
        ("useradd", "User management"),
        ("stat", "File ownership probe"),
        ("git", "Source checkouts"),
        ("systemctl", "Service supervision"),
    ];

    for (cmd, desc) in commands {
        if runner::command_exists(cmd) {
            println!("  {} {} - {}", "✓".green(), cmd, desc.dimmed());
        } else {
            println!("  {} {} - {} {}", "✗".red(), cmd, desc, "(missing)".red());
            issues.push(Issue {
                category: "Required Commands",
                summary: format!("{cmd} is not installed"),
                detail: Some(format!("{desc} - required to converge a server")),
                fix: None,
            });
        }
    }
}

fn check_settings(ctx: &Context, issues: &mut Vec<Issue>) {
    ui::section("Settings");

    let settings = match super::load_settings(ctx) {
        Ok(settings) => settings,
        Err(e) => {
            println!("  {} {}", "✗".red(), e);
            issues.push(Issue {
                category: "Settings",
                summary: "Settings could not be loaded".to_string(),
                detail: Some(format!("{e:#}")),
                fix: Some("Run `berks-deploy check` after fixing the file".to_string()),
            });
            return;
        }
    };

    let servers = match ServerDescriptor::resolve_all(&settings, None) {
        Ok(servers) => servers,
        Err(e) => {
            println!("  {} {}", "✗".red(), e);
            issues.push(Issue {
                category: "Settings",
                summary: "A declared server is invalid".to_string(),
                detail: Some(format!("{e:#}")),
                fix: None,
            });
            return;
        }
    };
    println!("  {} {} server(s) declared", "✓".green(), servers.len());

    for server in &servers {
        check_config_ownership(server, issues);

        let rbenv = server.rbenv_root.join("bin").join("rbenv");
        if rbenv.exists() {
            println!("  {} rbenv at {}", "✓".green(), rbenv.display());
        } else {
            println!("  {} rbenv at {} {}", "✗".red(), rbenv.display(), "(missing)".red());
            issues.push(Issue {
                category: "Ruby",
                summary: format!("rbenv not found under {}", server.rbenv_root.display()),
                detail: Some("Ruby builds and gem installs run through rbenv".to_string()),
                fix: Some(format!(
                    "git clone https://github.com/rbenv/rbenv.git {} && git clone https://github.com/rbenv/ruby-build.git {}/plugins/ruby-build",
                    server.rbenv_root.display(),
                    server.rbenv_root.display()
                )),
            });
        }
    }
}

fn check_config_ownership(server: &ServerDescriptor, issues: &mut Vec<Issue>) {
    let path = server.config_path();
    if !path.exists() {
        return;
    }
    let ctx = ApplyContext::new(true, false, &SystemRunner);
    let ownership = match Ownership::probe(&ctx, &path) {
        Ok(ownership) => ownership,
        Err(e) => {
            log::debug!("{e:#}");
            return;
        }
    };

    if ownership.owner == server.user || ownership.world_accessible() {
        println!("  {} {} is {}", "✗".red(), path.display(), ownership);
        issues.push(Issue {
            category: "Config",
            summary: format!("{} is writable by the service or readable by anyone", path.display()),
            detail: Some(format!("expected {}:{} 640", server.config_owner, server.group)),
            fix: Some("Run `berks-deploy install` to restore ownership".to_string()),
        });
    } else {
        println!("  {} {} is {}", "✓".green(), path.display(), ownership);
    }
}
