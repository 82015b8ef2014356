//! Ruby runtime resource (rbenv + ruby-build)

use anyhow::Result;
use declarative::ApplyContext;

use super::{ApplyResult, Resource, ResourceState, RubyEnv};

/// A Ruby version installed under rbenv
#[derive(Debug, Clone)]
pub struct RubyRuntime {
    pub env: RubyEnv,
}

impl RubyRuntime {
    pub fn new(env: RubyEnv) -> Self {
        Self { env }
    }

    fn installed_versions(&self, ctx: &ApplyContext) -> Result<Vec<String>> {
        let out = ctx.capture(&self.env.rbenv(["versions", "--bare"]))?;
        Ok(out.lines().map(|l| l.trim().to_string()).collect())
    }
}

impl Resource for RubyRuntime {
    fn id(&self) -> String {
        self.env.version.clone()
    }

    fn description(&self) -> String {
        format!("Install Ruby {}", self.env.version)
    }

    fn resource_type(&self) -> &'static str {
        "ruby"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        if self.installed_versions(ctx)?.contains(&self.env.version) {
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

        log::info!("Building Ruby {}; this can take a while", self.env.version);
        ctx.run(&self.env.rbenv(["install", "--skip-existing", self.env.version.as_str()]))?;
        Ok(ApplyResult::Created)
    }
}
