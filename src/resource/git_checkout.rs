//! Git checkout resource

use anyhow::{Context, Result};
use declarative::{ApplyContext, CommandSpec};
use std::path::{Path, PathBuf};

use super::{ApplyResult, Resource, ResourceState};

/// A working tree checked out at a given revision
#[derive(Debug, Clone)]
pub struct GitCheckout {
    pub repository: String,
    /// Branch, tag or commit
    pub revision: String,
    pub destination: PathBuf,
}

impl GitCheckout {
    pub fn new(repository: &str, revision: &str, destination: &Path) -> Self {
        Self {
            repository: repository.to_string(),
            revision: revision.to_string(),
            destination: destination.to_path_buf(),
        }
    }

    fn git<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new("git").args(args).cwd(&self.destination)
    }

    fn is_checkout(&self) -> bool {
        self.destination.join(".git").exists()
    }

    /// Resolve a revision to a commit, if it is known locally
    fn resolve(&self, ctx: &ApplyContext, rev: &str) -> Result<Option<String>> {
        let cmd = self.git(["rev-parse", "--verify", "--quiet"]).arg(format!("{rev}^{{commit}}"));
        let out = ctx.runner.run(&cmd)?;
        Ok(out.success.then(|| out.stdout_str().trim().to_string()))
    }

    /// Commit the upstream branch or tag currently points at
    ///
    /// Asks the remote directly so a branch that moved since the last fetch
    /// is seen as moved. Returns `None` when the revision is not a ref there.
    fn remote_commit(&self, ctx: &ApplyContext) -> Result<Option<String>> {
        let peeled = format!("{}^{{}}", self.revision);
        let list = self.git(["ls-remote", "origin", self.revision.as_str(), peeled.as_str()]);
        let refs = ctx.capture(&list)?;
        Ok(pick_remote_ref(&refs, &self.revision))
    }

    /// Commit the revision should be at: the upstream ref when the revision
    /// names a branch or tag, otherwise the revision itself
    fn target_commit(&self, ctx: &ApplyContext) -> Result<Option<String>> {
        match self.remote_commit(ctx)? {
            Some(commit) => Ok(Some(commit)),
            None => self.resolve(ctx, &self.revision),
        }
    }

    fn head(&self, ctx: &ApplyContext) -> Result<String> {
        Ok(ctx.capture(&self.git(["rev-parse", "HEAD"]))?.trim().to_string())
    }

    fn checkout(&self, ctx: &ApplyContext) -> Result<()> {
        ctx.run(&self.git(["checkout", "--force", self.revision.as_str()]))?;
        let tracking = format!("origin/{}", self.revision);
        if self.resolve(ctx, &tracking)?.is_some() {
            ctx.run(&self.git(["reset", "--hard", tracking.as_str()]))?;
        }
        Ok(())
    }
}

/// Pick the commit for `rev` out of `git ls-remote` output
///
/// A branch wins over a tag, and a peeled tag over the tag object.
fn pick_remote_ref(output: &str, rev: &str) -> Option<String> {
    let wanted = [
        format!("refs/heads/{rev}"),
        format!("refs/tags/{rev}^{{}}"),
        format!("refs/tags/{rev}"),
    ];
    let refs: Vec<(&str, &str)> = output
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .collect();
    wanted.iter().find_map(|name| {
        refs.iter()
            .find(|(_, r)| *r == name.as_str())
            .map(|(commit, _)| (*commit).to_string())
    })
}

impl Resource for GitCheckout {
    fn id(&self) -> String {
        self.destination.display().to_string()
    }

    fn description(&self) -> String {
        format!(
            "Check out {} at {} into {}",
            self.repository,
            self.revision,
            self.destination.display()
        )
    }

    fn resource_type(&self) -> &'static str {
        "git"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        if !self.is_checkout() {
            return Ok(ResourceState::Absent);
        }
        let head = self.head(ctx)?;
        match self.target_commit(ctx)? {
            Some(target) if target == head => Ok(self.desired_state()),
            _ => Ok(ResourceState::Modified {
                from: head.chars().take(12).collect(),
                to: self.revision.clone(),
            }),
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::present_with(&self.revision)
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        if self.is_checkout() {
            ctx.run(&self.git(["fetch", "--tags", "origin"]))?;
            self.checkout(ctx)?;
            return Ok(ApplyResult::Modified);
        }

        if let Some(parent) = self.destination.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        ctx.run(
            &CommandSpec::new("git")
                .args(["clone", self.repository.as_str()])
                .arg(self.destination.to_string_lossy()),
        )?;
        self.checkout(ctx)?;
        Ok(ApplyResult::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use tempfile::TempDir;

    const REPO: &str = "https://github.com/berkshelf/berkshelf-api.git";

    #[test]
    fn test_clones_missing_checkout() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("src");
        let host = FakeHost::new();
        let ctx = ApplyContext::new(false, false, &host);
        let git = GitCheckout::new(REPO, "master", &dest);

        assert_eq!(git.current_state(&ctx).unwrap(), ResourceState::Absent);
        assert_eq!(git.apply(&ctx).unwrap(), ApplyResult::Created);
        assert!(host.ran(&format!("git clone {REPO} {}", dest.display())));
        assert!(host.ran("git checkout --force master"));
        assert!(!git.needs_apply(&ctx).unwrap());
    }

    #[test]
    fn test_moves_existing_checkout_to_new_revision() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("src");
        let host = FakeHost::new();
        let ctx = ApplyContext::new(false, false, &host);

        GitCheckout::new(REPO, "v2.1.0", &dest).apply(&ctx).unwrap();
        let git = GitCheckout::new(REPO, "v2.2.0", &dest);

        assert!(matches!(
            git.current_state(&ctx).unwrap(),
            ResourceState::Modified { .. }
        ));
        assert_eq!(git.apply(&ctx).unwrap(), ApplyResult::Modified);
        assert!(host.ran("git fetch --tags origin"));
        assert!(!git.needs_apply(&ctx).unwrap());
    }

    #[test]
    fn test_branch_follows_upstream() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("src");
        let host = FakeHost::new();
        let ctx = ApplyContext::new(false, false, &host);
        let git = GitCheckout::new(REPO, "master", &dest);
        git.apply(&ctx).unwrap();

        host.push_upstream("master", "sha-next");
        assert_eq!(
            git.current_state(&ctx).unwrap(),
            ResourceState::Modified {
                from: "sha-master".to_string(),
                to: "master".to_string(),
            }
        );
        assert_eq!(git.apply(&ctx).unwrap(), ApplyResult::Modified);
        assert!(host.ran("git reset --hard origin/master"));
        assert!(!git.needs_apply(&ctx).unwrap());
    }

    #[test]
    fn test_pick_remote_ref() {
        let listing = "aaa\trefs/tags/v1\nbbb\trefs/tags/v1^{}\nccc\trefs/heads/v1-fix\n";
        assert_eq!(pick_remote_ref(listing, "v1").as_deref(), Some("bbb"));
        assert_eq!(pick_remote_ref("ddd\trefs/heads/main\n", "main").as_deref(), Some("ddd"));
        assert_eq!(pick_remote_ref(listing, "v2"), None);
        assert_eq!(pick_remote_ref("", "0123abc"), None);
    }

    fn git_in(dir: &Path, args: &[&str]) -> String {
        let out = std::process::Command::new("git")
            .args(["-c", "user.name=Berks", "-c", "user.email=berks@example.com"])
            .args(["-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    #[test]
    fn test_real_branch_checkout_tracks_new_commits() {
        if !crate::runner::command_exists("git") {
            return;
        }
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        std::fs::create_dir(&upstream).unwrap();
        git_in(&upstream, &["init", "--quiet"]);
        git_in(&upstream, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        git_in(&upstream, &["commit", "--quiet", "--allow-empty", "-m", "first"]);

        let runner = crate::runner::SystemRunner;
        let ctx = ApplyContext::new(false, false, &runner);
        let dest = temp.path().join("src");
        let git = GitCheckout::new(&upstream.to_string_lossy(), "master", &dest);
        assert_eq!(git.apply(&ctx).unwrap(), ApplyResult::Created);
        assert!(!git.needs_apply(&ctx).unwrap());

        git_in(&upstream, &["commit", "--quiet", "--allow-empty", "-m", "second"]);
        let tip = git_in(&upstream, &["rev-parse", "HEAD"]);
        assert!(git.needs_apply(&ctx).unwrap());

        assert_eq!(git.apply(&ctx).unwrap(), ApplyResult::Modified);
        assert_eq!(git_in(&dest, &["rev-parse", "HEAD"]), tip);
        assert!(!git.needs_apply(&ctx).unwrap());
    }
}
