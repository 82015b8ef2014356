//! Ruby gem resource

use anyhow::Result;
use declarative::ApplyContext;

use super::{ApplyResult, Resource, ResourceState, RubyEnv};

/// A gem installed into the pinned Ruby runtime
#[derive(Debug, Clone)]
pub struct GemPackage {
    pub env: RubyEnv,
    pub name: String,
    /// Exact version, or any version when unset
    pub version: Option<String>,
    /// Regenerate rbenv shims after installing, for gems that ship binaries
    pub rehash: bool,
}

impl GemPackage {
    pub fn new(env: RubyEnv, name: &str) -> Self {
        Self {
            env,
            name: name.to_string(),
            version: None,
            rehash: false,
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn rehash(mut self) -> Self {
        self.rehash = true;
        self
    }

    fn version_args(&self) -> Vec<String> {
        match &self.version {
            Some(v) => vec!["-v".to_string(), v.clone()],
            None => Vec::new(),
        }
    }
}

impl Resource for GemPackage {
    fn id(&self) -> String {
        match &self.version {
            Some(v) => format!("{}@{v}", self.name),
            None => self.name.clone(),
        }
    }

    fn description(&self) -> String {
        match &self.version {
            Some(v) => format!("Install gem {} {v}", self.name),
            None => format!("Install gem {}", self.name),
        }
    }

    fn resource_type(&self) -> &'static str {
        "gem"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        let cmd = self
            .env
            .exec("gem", ["list", "-i", self.name.as_str()])
            .args(self.version_args());
        if ctx.probe(&cmd)? {
            Ok(ResourceState::present())
        } else {
            Ok(ResourceState::Absent)
        }
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

        let cmd = self
            .env
            .exec("gem", ["install", self.name.as_str()])
            .args(self.version_args())
            .arg("--no-document");
        ctx.run(&cmd)?;

        if self.rehash {
            ctx.run(&self.env.rbenv(["rehash"]))?;
        }
        Ok(ApplyResult::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;

    fn env() -> RubyEnv {
        RubyEnv::new("/opt/rbenv", "2.3.1")
    }

    #[test]
    fn test_installs_pinned_version_and_rehashes() {
        let host = FakeHost::new();
        let ctx = ApplyContext::new(false, false, &host);
        let gem = GemPackage::new(env(), "berkshelf-api").version("2.2.0").rehash();

        assert_eq!(gem.id(), "berkshelf-api@2.2.0");
        assert!(gem.needs_apply(&ctx).unwrap());
        gem.apply(&ctx).unwrap();

        assert!(host.ran(
            "/opt/rbenv/bin/rbenv exec gem install berkshelf-api -v 2.2.0 --no-document"
        ));
        assert!(host.ran("/opt/rbenv/bin/rbenv rehash"));
        assert!(!gem.needs_apply(&ctx).unwrap());
    }

    #[test]
    fn test_other_version_does_not_satisfy_pin() {
        let host = FakeHost::new().with_gem("berkshelf-api", "2.1.0");
        let ctx = ApplyContext::new(false, false, &host);
        let gem = GemPackage::new(env(), "berkshelf-api").version("2.2.0");
        assert!(gem.needs_apply(&ctx).unwrap());
    }

    #[test]
    fn test_unpinned_gem_accepts_any_version() {
        let host = FakeHost::new().with_gem("bundler", "1.17.3");
        let ctx = ApplyContext::new(false, false, &host);
        let gem = GemPackage::new(env(), "bundler");
        assert!(!gem.needs_apply(&ctx).unwrap());
    }
}
