//! Concrete convergence steps for a Berkshelf API server
//!
//! Every step is a [`declarative::Resource`]: it probes the host through the
//! context's command runner and converges only what differs.

use anyhow::{Context, Result, bail};
use declarative::{ApplyContext, CommandSpec, ResourceState};
use std::fmt;
use std::path::{Path, PathBuf};

pub use declarative::{ApplyResult, Resource};

pub mod bundler;
pub mod config_file;
pub mod directory;
pub mod gem_package;
pub mod git_checkout;
pub mod group;
pub mod native_package;
pub mod ruby_runtime;
pub mod service;
pub mod user;

pub use bundler::BundleInstall;
pub use config_file::ConfigFile;
pub use directory::Directory;
pub use gem_package::GemPackage;
pub use git_checkout::GitCheckout;
pub use group::SystemGroup;
pub use native_package::NativePackage;
pub use ruby_runtime::RubyRuntime;
pub use service::{RestartTrigger, ServiceUnit};
pub use user::SystemUser;

/// Whether an account-style resource should exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensure {
    Present,
    Absent,
}

impl Ensure {
    pub fn desired_state(self) -> ResourceState {
        match self {
            Self::Present => ResourceState::present(),
            Self::Absent => ResourceState::Absent,
        }
    }
}

/// A pinned rbenv installation
///
/// Gem and bundle commands run as `rbenv exec` so they resolve against the
/// requested Ruby rather than whatever is first on PATH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubyEnv {
    pub rbenv_root: PathBuf,
    pub version: String,
}

impl RubyEnv {
    pub fn new(rbenv_root: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            rbenv_root: rbenv_root.into(),
            version: version.into(),
        }
    }

    /// Path of the rbenv executable
    pub fn rbenv_bin(&self) -> String {
        self.rbenv_root
            .join("bin")
            .join("rbenv")
            .to_string_lossy()
            .to_string()
    }

    /// An rbenv subcommand
    pub fn rbenv<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(self.rbenv_bin())
            .args(args)
            .env("RBENV_ROOT", self.rbenv_root.to_string_lossy())
            .env("RBENV_VERSION", &self.version)
    }

    /// A program run inside the pinned runtime
    pub fn exec<I, S>(&self, program: &str, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rbenv(["exec", program]).args(args)
    }
}

/// Owner, group and permission bits of a filesystem path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    pub owner: String,
    pub group: String,
    pub mode: u32,
}

impl Ownership {
    pub fn new(owner: impl Into<String>, group: impl Into<String>, mode: u32) -> Self {
        Self {
            owner: owner.into(),
            group: group.into(),
            mode,
        }
    }

    /// Read the ownership of `path` with `stat`
    pub fn probe(ctx: &ApplyContext, path: &Path) -> Result<Self> {
        let cmd = CommandSpec::new("stat").args(["-c", "%U:%G:%a"]).arg(path.to_string_lossy());
        let out = ctx
            .runner
            .run_capture(&cmd)
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        Self::parse(out.trim())
    }

    /// Parse `owner:group:octal-mode`
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let (Some(owner), Some(group), Some(mode)) = (parts.next(), parts.next(), parts.next())
        else {
            bail!("Unexpected stat output: {s}");
        };
        let mode = u32::from_str_radix(mode, 8).with_context(|| format!("Invalid mode: {mode}"))?;
        Ok(Self::new(owner, group, mode))
    }

    /// Converge `path` to this ownership, touching only what differs
    pub fn enforce(&self, ctx: &ApplyContext, path: &Path, current: Option<&Self>) -> Result<()> {
        let target = path.to_string_lossy();
        if current.is_none_or(|c| c.owner != self.owner || c.group != self.group) {
            ctx.run(
                &CommandSpec::new("chown")
                    .arg(format!("{}:{}", self.owner, self.group))
                    .arg(target.as_ref()),
            )?;
        }
        if current.is_none_or(|c| c.mode != self.mode) {
            ctx.run(
                &CommandSpec::new("chmod")
                    .arg(format!("{:o}", self.mode))
                    .arg(target.as_ref()),
            )?;
        }
        Ok(())
    }

    /// Whether any permission bit is granted to other users
    pub fn world_accessible(&self) -> bool {
        self.mode & 0o007 != 0
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {:o}", self.owner, self.group, self.mode)
    }
}

/// Present when `actual` matches `desired`, otherwise a modification
pub(crate) fn compare(actual: String, desired: String) -> ResourceState {
    if actual == desired {
        ResourceState::present_with(desired)
    } else {
        ResourceState::Modified {
            from: actual,
            to: desired,
        }
    }
}

/// Short blake3 fingerprint of file contents
pub(crate) fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex()[..12].to_string()
}
