//! Owned directory resource

use anyhow::{Context, Result};
use declarative::ApplyContext;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ApplyResult, Ownership, Resource, ResourceState, compare};

/// A directory with fixed ownership and mode
#[derive(Debug, Clone)]
pub struct Directory {
    pub path: PathBuf,
    pub ownership: Ownership,
}

impl Directory {
    pub fn new(path: &Path, ownership: Ownership) -> Self {
        Self {
            path: path.to_path_buf(),
            ownership,
        }
    }
}

impl Resource for Directory {
    fn id(&self) -> String {
        self.path.display().to_string()
    }

    fn description(&self) -> String {
        format!("Create directory {}", self.path.display())
    }

    fn resource_type(&self) -> &'static str {
        "directory"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        if !self.path.is_dir() {
            return Ok(ResourceState::Absent);
        }
        let actual = Ownership::probe(ctx, &self.path)?;
        Ok(compare(actual.to_string(), self.ownership.to_string()))
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::present_with(self.ownership.to_string())
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let created = !self.path.is_dir();
        let current = if created {
            fs::create_dir_all(&self.path)
                .with_context(|| format!("Failed to create {}", self.path.display()))?;
            None
        } else {
            Some(Ownership::probe(ctx, &self.path)?)
        };
        self.ownership.enforce(ctx, &self.path, current.as_ref())?;

        Ok(if created {
            ApplyResult::Created
        } else {
            ApplyResult::Modified
        })
    }
}
