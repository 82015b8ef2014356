//! Bundle install resource
//!
//! Runs `bundle install` for a source checkout, but only when `Gemfile.lock`
//! is missing or was last written before the `Gemfile`.
//!
//! Deployment mode needs a lockfile, so a checkout without one is bundled
//! normally to resolve it first. Bundler leaves an up-to-date lockfile
//! untouched, so its mtime is bumped after every successful run.

use anyhow::{Context, Result};
use apiconfig::Staleness;
use chrono::{DateTime, Local};
use declarative::ApplyContext;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{ApplyResult, Resource, ResourceState, RubyEnv};

pub const MANIFEST: &str = "Gemfile";
pub const LOCKFILE: &str = "Gemfile.lock";

/// Vendored gem dependencies of a source checkout
#[derive(Debug, Clone)]
pub struct BundleInstall {
    pub env: RubyEnv,
    pub dir: PathBuf,
}

impl BundleInstall {
    pub fn new(env: RubyEnv, dir: &Path) -> Self {
        Self {
            env,
            dir: dir.to_path_buf(),
        }
    }

    fn manifest(&self) -> PathBuf {
        self.dir.join(MANIFEST)
    }

    fn lockfile(&self) -> PathBuf {
        self.dir.join(LOCKFILE)
    }

    fn touch_lockfile(&self) -> Result<()> {
        let lockfile = self.lockfile();
        File::options()
            .write(true)
            .open(&lockfile)
            .and_then(|f| f.set_modified(SystemTime::now()))
            .with_context(|| format!("bundle install left no usable {}", lockfile.display()))
    }

    /// Staleness of the lockfile, or `None` before the checkout exists
    fn staleness(&self) -> Result<Option<Staleness>> {
        if !self.manifest().exists() {
            return Ok(None);
        }
        Ok(Some(apiconfig::staleness::check(
            &self.manifest(),
            &self.lockfile(),
        )?))
    }
}

fn timestamp(t: SystemTime) -> String {
    DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string()
}

impl Resource for BundleInstall {
    fn id(&self) -> String {
        self.dir.display().to_string()
    }

    fn description(&self) -> String {
        format!("Bundle dependencies in {}", self.dir.display())
    }

    fn resource_type(&self) -> &'static str {
        "bundle"
    }

    fn current_state(&self, _ctx: &ApplyContext) -> Result<ResourceState> {
        Ok(match self.staleness()? {
            None | Some(Staleness::MissingLockfile) => ResourceState::Absent,
            Some(Staleness::OlderThanManifest { lockfile, manifest }) => ResourceState::Modified {
                from: format!("{LOCKFILE} {}", timestamp(lockfile)),
                to: format!("{MANIFEST} {}", timestamp(manifest)),
            },
            Some(Staleness::Fresh) => ResourceState::present(),
        })
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::present()
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let staleness = self.staleness()?;
        match staleness {
            Some(Staleness::OlderThanManifest { lockfile, manifest }) => log::info!(
                "{LOCKFILE} ({}) is older than {MANIFEST} ({}); rebundling",
                timestamp(lockfile),
                timestamp(manifest)
            ),
            _ => log::info!("No {LOCKFILE} in {}; bundling", self.dir.display()),
        }

        let mut args = vec!["install"];
        if matches!(staleness, Some(Staleness::OlderThanManifest { .. })) {
            args.push("--deployment");
        }
        args.extend(["--path", "vendor/bundle", "--binstubs", "vendor/bin"]);
        ctx.run(&self.env.exec("bundle", args).cwd(&self.dir))?;
        self.touch_lockfile()?;

        Ok(if matches!(staleness, Some(Staleness::OlderThanManifest { .. })) {
            ApplyResult::Modified
        } else {
            ApplyResult::Created
        })
    }
}
