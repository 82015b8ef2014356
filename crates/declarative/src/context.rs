//! Apply context and provider traits
//!
//! These traits allow the declarative crate to be used without
//! depending on specific implementations of process spawning, progress, etc.

use crate::types::{ApplyResult, CommandOutput, CommandSpec};
use anyhow::Result;

/// Runner for external commands
///
/// Implement this trait to execute commands on the target system.
/// Tests substitute a scripted implementation.
pub trait CommandRunner: Send + Sync {
    /// Run a command and return its raw output
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput>;

    /// Run a command and return just success/failure
    fn run_status(&self, cmd: &CommandSpec) -> Result<bool> {
        Ok(self.run(cmd)?.success)
    }

    /// Run a command and capture stdout
    fn run_capture(&self, cmd: &CommandSpec) -> Result<String> {
        let output = self.run(cmd)?;
        if !output.success {
            anyhow::bail!(
                "Command failed: {}: {}",
                cmd.command_line(),
                output.stderr_str().trim()
            );
        }
        Ok(output.stdout_str())
    }

    /// Run a command, failing if it exits unsuccessfully
    fn run_checked(&self, cmd: &CommandSpec) -> Result<()> {
        self.run_capture(cmd).map(|_| ())
    }
}

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called when starting to apply a single resource
    fn on_resource_start(&mut self, id: &str, description: &str);

    /// Called when a resource application completes
    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult);

    /// Called when a resource fails and the run is aborted
    fn on_resource_failed(&mut self, _id: &str, _error: &anyhow::Error) {}
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_resource_start(&mut self, _id: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _id: &str, _result: &ApplyResult) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Context passed to resource state detection and apply operations
pub struct ApplyContext<'a> {
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Whether to output verbose information
    pub verbose: bool,
    /// Runner used for every external command
    pub runner: &'a dyn CommandRunner,
}

impl<'a> ApplyContext<'a> {
    /// Create a new apply context
    pub fn new(dry_run: bool, verbose: bool, runner: &'a dyn CommandRunner) -> Self {
        Self {
            dry_run,
            verbose,
            runner,
        }
    }

    /// Run a command through the context's runner, failing on non-zero exit
    pub fn run(&self, cmd: &CommandSpec) -> Result<()> {
        log::debug!("$ {cmd}");
        self.runner.run_checked(cmd)
    }

    /// Run a command and capture its stdout
    pub fn capture(&self, cmd: &CommandSpec) -> Result<String> {
        log::debug!("$ {cmd}");
        self.runner.run_capture(cmd)
    }

    /// Run a probe command, treating non-zero exit as `false`
    pub fn probe(&self, cmd: &CommandSpec) -> Result<bool> {
        log::trace!("? {cmd}");
        self.runner.run_status(cmd)
    }
}
