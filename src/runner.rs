use anyhow::{Context, Result};
use declarative::{CommandOutput, CommandRunner, CommandSpec};
use std::process::{Command, Stdio};

/// Runs commands on the local machine
pub struct SystemRunner;

impl SystemRunner {
    fn build(spec: &CommandSpec) -> Command {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        for (key, value) in &spec.env {
            command.env(key, value);
        }
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }
        command.stdin(Stdio::null());
        command
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let output = Self::build(spec)
            .output()
            .with_context(|| format!("Failed to execute: {spec}"))?;
        Ok(output.into())
    }
}

/// Check if a command exists on PATH
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Whether the process runs with root privileges
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}
