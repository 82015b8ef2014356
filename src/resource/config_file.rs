//! Config file resource
//!
//! Writes rendered content to a path and pins its ownership. Content is
//! compared by blake3 hash so an unchanged document is never rewritten.

use anyhow::{Context, Result};
use declarative::ApplyContext;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use super::{ApplyResult, Ownership, Resource, ResourceState, compare, fingerprint};

/// A file with fixed content, owner, group and mode
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub content: String,
    pub ownership: Ownership,
}

impl ConfigFile {
    pub fn new(path: &Path, content: String, ownership: Ownership) -> Self {
        Self {
            path: path.to_path_buf(),
            content,
            ownership,
        }
    }

    fn desired_summary(&self) -> String {
        format!("{} {}", fingerprint(self.content.as_bytes()), self.ownership)
    }

    fn content_matches(&self) -> Result<bool> {
        let existing = fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(fingerprint(&existing) == fingerprint(self.content.as_bytes()))
    }

    /// Write the content; a new file is created with the target mode
    /// so it is never briefly readable by others
    fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(self.ownership.mode)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(self.content.as_bytes())
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl Resource for ConfigFile {
    fn id(&self) -> String {
        self.path.display().to_string()
    }

    fn description(&self) -> String {
        format!("Write {}", self.path.display())
    }

    fn resource_type(&self) -> &'static str {
        "file"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        if !self.path.exists() {
            return Ok(ResourceState::Absent);
        }
        let existing = fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let ownership = Ownership::probe(ctx, &self.path)?;
        let actual = format!("{} {ownership}", fingerprint(&existing));
        Ok(compare(actual, self.desired_summary()))
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::present_with(self.desired_summary())
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let created = !self.path.exists();
        let current = if created {
            None
        } else {
            Some(Ownership::probe(ctx, &self.path)?)
        };

        if created || !self.content_matches()? {
            log::debug!("Writing {} ({} bytes)", self.path.display(), self.content.len());
            self.write()?;
        }
        self.ownership.enforce(ctx, &self.path, current.as_ref())?;

        Ok(if created {
            ApplyResult::Created
        } else {
            ApplyResult::Modified
        })
    }
}
