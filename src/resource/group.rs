//! System group resource

use anyhow::Result;
use declarative::{ApplyContext, CommandSpec};

use super::{ApplyResult, Ensure, Resource, ResourceState};

/// A system group the service runs under
#[derive(Debug, Clone)]
pub struct SystemGroup {
    pub name: String,
    pub ensure: Ensure,
}

impl SystemGroup {
    pub fn present(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ensure: Ensure::Present,
        }
    }

    pub fn absent(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ensure: Ensure::Absent,
        }
    }
}

impl Resource for SystemGroup {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        match self.ensure {
            Ensure::Present => format!("Create group {}", self.name),
            Ensure::Absent => format!("Remove group {}", self.name),
        }
    }

    fn resource_type(&self) -> &'static str {
        "group"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        let exists = ctx.probe(&CommandSpec::new("getent").args(["group", self.name.as_str()]))?;
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
                ctx.run(&CommandSpec::new("groupadd").args(["--system", self.name.as_str()]))?;
                Ok(ApplyResult::Created)
            }
            Ensure::Absent => {
                ctx.run(&CommandSpec::new("groupdel").arg(&self.name))?;
                Ok(ApplyResult::Removed)
            }
        }
    }
}
