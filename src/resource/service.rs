//! Service resource - a systemd unit, enabled and running
//!
//! Besides the unit text itself, a service can track restart triggers: the
//! config it reads, the application version, the checked-out commit. Their
//! combined fingerprint is written into the unit as `X-Revision=`, so any
//! change rewrites the unit and restarts a running service.

use anyhow::{Context, Result};
use declarative::{ApplyContext, CommandSpec};
use std::fs;
use std::path::{Path, PathBuf};

use super::{ApplyResult, Resource, ResourceState, compare, fingerprint};

/// Input whose change must restart the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartTrigger {
    /// A value known when planning
    Value(String),
    /// Commit checked out in a git working tree
    Checkout(PathBuf),
}

/// A supervised service defined by a unit file
#[derive(Debug, Clone)]
pub struct ServiceUnit {
    pub name: String,
    pub unit_path: PathBuf,
    pub content: String,
    pub triggers: Vec<RestartTrigger>,
}

impl ServiceUnit {
    pub fn new(name: &str, unit_dir: &Path, content: String) -> Self {
        Self {
            name: name.to_string(),
            unit_path: unit_dir.join(format!("{name}.service")),
            content,
            triggers: Vec::new(),
        }
    }

    pub fn restart_on(mut self, trigger: RestartTrigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    fn systemctl(&self, action: &str) -> CommandSpec {
        CommandSpec::new("systemctl").args([action, "--quiet", self.name.as_str()])
    }

    /// Fingerprint of the restart triggers as they are on the host right now
    fn revision(&self, ctx: &ApplyContext) -> Result<Option<String>> {
        if self.triggers.is_empty() {
            return Ok(None);
        }
        let mut inputs = Vec::new();
        for trigger in &self.triggers {
            match trigger {
                RestartTrigger::Value(value) => inputs.extend_from_slice(value.as_bytes()),
                RestartTrigger::Checkout(dir) if dir.join(".git").exists() => {
                    let head = ctx.capture(
                        &CommandSpec::new("git").args(["rev-parse", "HEAD"]).cwd(dir),
                    )?;
                    inputs.extend_from_slice(head.trim().as_bytes());
                }
                RestartTrigger::Checkout(_) => {}
            }
            inputs.push(0);
        }
        Ok(Some(fingerprint(&inputs)))
    }

    /// Unit text to install, revision included
    fn rendered(&self, ctx: &ApplyContext) -> Result<String> {
        Ok(match self.revision(ctx)? {
            Some(revision) => with_revision(&self.content, &revision),
            None => self.content.clone(),
        })
    }

    fn unit_matches(&self, rendered: &str) -> bool {
        fs::read(&self.unit_path)
            .map(|existing| fingerprint(&existing) == fingerprint(rendered.as_bytes()))
            .unwrap_or(false)
    }

    fn running(&self, ctx: &ApplyContext) -> Result<bool> {
        Ok(ctx.probe(&self.systemctl("is-enabled"))? && ctx.probe(&self.systemctl("is-active"))?)
    }

    fn summary(current: bool, running: bool) -> String {
        format!(
            "unit {}, {}",
            if current { "current" } else { "outdated" },
            if running { "running" } else { "stopped" }
        )
    }
}

/// Insert `X-Revision=` at the top of the `[Unit]` section
fn with_revision(content: &str, revision: &str) -> String {
    let line = format!("X-Revision={revision}\n");
    match content.find("[Unit]\n") {
        Some(at) => {
            let split = at + "[Unit]\n".len();
            format!("{}{line}{}", &content[..split], &content[split..])
        }
        None => format!("[Unit]\n{line}\n{content}"),
    }
}

impl Resource for ServiceUnit {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("Register service {}", self.name)
    }

    fn resource_type(&self) -> &'static str {
        "service"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        if !self.unit_path.exists() {
            return Ok(ResourceState::Absent);
        }
        let rendered = self.rendered(ctx)?;
        Ok(compare(
            Self::summary(self.unit_matches(&rendered), self.running(ctx)?),
            Self::summary(true, true),
        ))
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::present_with(Self::summary(true, true))
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let created = !self.unit_path.exists();
        let rendered = self.rendered(ctx)?;
        let rewritten = !self.unit_matches(&rendered);
        if rewritten {
            if let Some(parent) = self.unit_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&self.unit_path, &rendered)
                .with_context(|| format!("Failed to write {}", self.unit_path.display()))?;
            ctx.run(&CommandSpec::new("systemctl").arg("daemon-reload"))?;
        }

        let was_active = ctx.probe(&self.systemctl("is-active"))?;
        ctx.run(&CommandSpec::new("systemctl").args(["enable", "--now", self.name.as_str()]))?;
        if rewritten && was_active && !created {
            ctx.run(&CommandSpec::new("systemctl").args(["restart", self.name.as_str()]))?;
        }

        Ok(if created {
            ApplyResult::Created
        } else {
            ApplyResult::Modified
        })
    }
}
