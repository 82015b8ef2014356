//! Planner - turns a server descriptor into an ordered plan of steps

use anyhow::Result;
use declarative::ExecutionPlan;
use std::path::Path;

use crate::descriptor::{SERVER_GEM, ServerDescriptor};
use crate::resource::{
    BundleInstall, ConfigFile, Directory, GemPackage, GitCheckout, NativePackage, Ownership,
    RestartTrigger, RubyEnv, RubyRuntime, ServiceUnit, SystemGroup, SystemUser,
};

/// Mode of the server's home directory
const HOME_MODE: u32 = 0o755;

/// Mode of config.json: owner read/write, group read
const CONFIG_MODE: u32 = 0o640;

/// Build the install plan for one server
///
/// Step order: group, user, runtime, home directory, native dependency,
/// application (gem, or checkout + bundler + bundle), config file, service.
pub fn install_plan(server: &ServerDescriptor, os_release: &Path) -> Result<ExecutionPlan> {
    let ruby = RubyEnv::new(&server.rbenv_root, &server.ruby_version);
    let mut plan = ExecutionPlan::new(format!("install {}", server.path.display()));

    plan.push(Box::new(SystemGroup::present(&server.group)));
    plan.push(Box::new(SystemUser::present(
        &server.user,
        &server.group,
        &server.path,
    )));
    plan.push(Box::new(RubyRuntime::new(ruby.clone())));
    plan.push(Box::new(Directory::new(
        &server.path,
        Ownership::new(&server.user, &server.group, HOME_MODE),
    )));
    plan.push(Box::new(NativePackage::new(os_release)));

    if server.install_from_source {
        plan.push(Box::new(GitCheckout::new(
            &server.source_repository,
            &server.version,
            &server.install_path,
        )));
        plan.push(Box::new(GemPackage::new(ruby.clone(), "bundler").rehash()));
        plan.push(Box::new(BundleInstall::new(ruby, &server.install_path)));
    } else {
        plan.push(Box::new(
            GemPackage::new(ruby, SERVER_GEM)
                .version(&server.version)
                .rehash(),
        ));
    }

    let config = server.render_config()?;
    plan.push(Box::new(ConfigFile::new(
        &server.config_path(),
        config.clone(),
        Ownership::new(&server.config_owner, &server.group, CONFIG_MODE),
    )));

    let mut service =
        ServiceUnit::new(&server.service_name, &server.unit_dir, render_unit(server))
            .restart_on(RestartTrigger::Value(config))
            .restart_on(RestartTrigger::Value(server.version.clone()));
    if server.install_from_source {
        service = service.restart_on(RestartTrigger::Checkout(server.install_path.clone()));
    }
    plan.push(Box::new(service));

    Ok(plan)
}

/// Build the uninstall plan for one server
///
/// Only the service account and its group are removed. The notes list what
/// stays on disk.
pub fn uninstall_plan(server: &ServerDescriptor) -> ExecutionPlan {
    let mut plan = ExecutionPlan::new(format!("uninstall {}", server.path.display()));
    plan.push(Box::new(SystemUser::absent(&server.user)));
    plan.push(Box::new(SystemGroup::absent(&server.group)));

    plan.add_note(format!(
        "service {} is left registered ({})",
        server.service_name,
        server
            .unit_dir
            .join(format!("{}.service", server.service_name))
            .display()
    ));
    plan.add_note(format!("{} is left in place", server.config_path().display()));
    if server.install_from_source {
        plan.add_note(format!(
            "source checkout {} is left in place",
            server.install_path.display()
        ));
    } else {
        plan.add_note(format!(
            "gem {SERVER_GEM} {} stays installed under Ruby {}",
            server.version, server.ruby_version
        ));
    }
    plan
}

/// systemd unit for the server
pub fn render_unit(server: &ServerDescriptor) -> String {
    let rbenv = server.rbenv_root.join("bin").join("rbenv");
    format!(
        "[Unit]
Description=Berkshelf API server ({path})
After=network.target

[Service]
Type=simple
User={user}
Group={group}
WorkingDirectory={workdir}
Environment=RBENV_ROOT={rbenv_root}
Environment=RBENV_VERSION={ruby}
ExecStart={rbenv} exec {binary} -c {config} -p {port}
Restart=on-failure

[Install]
WantedBy=multi-user.target
",
        path = server.path.display(),
        user = server.user,
        group = server.group,
        workdir = server.working_dir().display(),
        rbenv_root = server.rbenv_root.display(),
        ruby = server.ruby_version,
        rbenv = rbenv.display(),
        binary = server.server_binary(),
        config = server.config_path().display(),
        port = server.port,
    )
}
