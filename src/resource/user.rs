//! System user resource

use anyhow::Result;
use declarative::{ApplyContext, CommandSpec};
use std::path::{Path, PathBuf};

use super::{ApplyResult, Ensure, Resource, ResourceState};

/// Login shell for the service account
const NO_LOGIN_SHELL: &str = "/bin/false";

/// A system account the service runs as
#[derive(Debug, Clone)]
pub struct SystemUser {
    pub name: String,
    /// Primary group (ignored when removing)
    pub group: String,
    pub home: PathBuf,
    pub ensure: Ensure,
}

impl SystemUser {
    pub fn present(name: &str, group: &str, home: &Path) -> Self {
        Self {
            name: name.to_string(),
            group: group.to_string(),
            home: home.to_path_buf(),
            ensure: Ensure::Present,
        }
    }

    pub fn absent(name: &str) -> Self {
        Self {
            name: name.to_string(),
            group: String::new(),
            home: PathBuf::new(),
            ensure: Ensure::Absent,
        }
    }
}

impl Resource for SystemUser {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        match self.ensure {
            Ensure::Present => format!("Create user {}", self.name),
            Ensure::Absent => format!("Remove user {}", self.name),
        }
    }

    fn resource_type(&self) -> &'static str {
        "user"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        let exists = ctx.probe(&CommandSpec::new("getent").args(["passwd", self.name.as_str()]))?;
        Ok(if exists {
            ResourceState::present()
        } else {
            ResourceState::Absent
        })
    }

    fn desired_state(&self) -> ResourceState {
        self.ensure.desired_state()
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        match self.ensure {
            Ensure::Present => {
                let cmd = CommandSpec::new("useradd")
                    .args(["--system", "--gid", self.group.as_str(), "--home-dir"])
                    .arg(self.home.to_string_lossy())
                    .args(["--shell", NO_LOGIN_SHELL, self.name.as_str()]);
                ctx.run(&cmd)?;
                Ok(ApplyResult::Created)
            }
            Ensure::Absent => {
                ctx.run(&CommandSpec::new("userdel").arg(&self.name))?;
                Ok(ApplyResult::Removed)
            }
        }
    }
}
