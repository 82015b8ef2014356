//! In-memory stand-in for the target host
//!
//! `FakeHost` answers the commands the convergence steps issue, keeping
//! accounts, packages, gems, checkouts, file ownership and unit state in
//! memory. Filesystem effects that later probes read back (a clone's
//! `Gemfile`, a bundle's `Gemfile.lock`) are written for real, so tests
//! point every path at a temporary directory.

use anyhow::{Result, bail};
use declarative::{CommandOutput, CommandRunner, CommandSpec};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::resource::Ownership;

#[derive(Debug, Default)]
struct HostState {
    groups: BTreeSet<String>,
    users: BTreeSet<String>,
    rubies: Vec<String>,
    packages: BTreeSet<String>,
    gems: BTreeSet<(String, String)>,
    ownership: BTreeMap<PathBuf, Ownership>,
    heads: BTreeMap<PathBuf, String>,
    upstream: BTreeMap<String, String>,
    enabled: BTreeSet<String>,
    active: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
    log: Mutex<Vec<String>>,
    fail_prefix: Option<String>,
}

fn ok() -> CommandOutput {
    status(true)
}

fn status(success: bool) -> CommandOutput {
    CommandOutput {
        success,
        ..Default::default()
    }
}

fn stdout(text: impl Into<String>) -> CommandOutput {
    CommandOutput {
        stdout: text.into().into_bytes(),
        stderr: Vec::new(),
        success: true,
    }
}

fn failure(message: &str) -> CommandOutput {
    CommandOutput {
        stdout: Vec::new(),
        stderr: message.as_bytes().to_vec(),
        success: false,
    }
}

fn sha(rev: &str) -> String {
    format!("sha-{rev}")
}

/// Commit a revision names: remote-tracking refs follow the upstream
/// branches, anything else is taken as known locally
fn resolve(state: &HostState, rev: &str) -> Option<String> {
    let rev = rev.strip_suffix("^{commit}").unwrap_or(rev);
    match rev.strip_prefix("origin/") {
        Some(branch) => state.upstream.get(branch).cloned(),
        None => Some(sha(rev)),
    }
}

impl FakeHost {
    pub fn new() -> Self {
        let host = Self::default();
        host.push_upstream("master", &sha("master"));
        host
    }

    /// Move an upstream branch to a new commit
    pub fn push_upstream(&self, branch: &str, commit: &str) {
        self.state()
            .upstream
            .insert(branch.to_string(), commit.to_string());
    }

    pub fn with_group(self, name: &str) -> Self {
        self.state().groups.insert(name.to_string());
        self
    }

    pub fn with_user(self, name: &str) -> Self {
        self.state().users.insert(name.to_string());
        self
    }

    pub fn with_ruby(self, version: &str) -> Self {
        self.state().rubies.push(version.to_string());
        self
    }

    pub fn with_gem(self, name: &str, version: &str) -> Self {
        self.state()
            .gems
            .insert((name.to_string(), version.to_string()));
        self
    }

    pub fn with_ownership(self, path: &Path, owner: &str, group: &str, mode: u32) -> Self {
        self.state()
            .ownership
            .insert(path.to_path_buf(), Ownership::new(owner, group, mode));
        self
    }

    /// Fail every command whose command line starts with `prefix`
    pub fn failing(mut self, prefix: &str) -> Self {
        self.fail_prefix = Some(prefix.to_string());
        self
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.state().groups.contains(name)
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.state().users.contains(name)
    }

    pub fn has_package(&self, name: &str) -> bool {
        self.state().packages.contains(name)
    }

    pub fn ownership(&self, path: &Path) -> Option<Ownership> {
        self.state().ownership.get(path).cloned()
    }

    pub fn is_running(&self, service: &str) -> bool {
        let state = self.state();
        state.enabled.contains(service) && state.active.contains(service)
    }

    pub fn stop_service(&self, service: &str) {
        self.state().active.remove(service);
    }

    /// Every command line issued so far, probes included
    pub fn commands(&self) -> Vec<String> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn ran(&self, command_line: &str) -> bool {
        self.commands().iter().any(|c| c == command_line)
    }

    pub fn ran_prefix(&self, prefix: &str) -> bool {
        self.commands().iter().any(|c| c.starts_with(prefix))
    }

    fn state(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn disk_ownership(path: &Path) -> Option<Ownership> {
        let meta = fs::metadata(path).ok()?;
        Some(Ownership::new("root", "root", meta.permissions().mode() & 0o777))
    }

    fn ruby(state: &mut HostState, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput> {
        Ok(match args {
            ["gem", "list", "-i", name] => status(state.gems.iter().any(|(n, _)| n == *name)),
            ["gem", "list", "-i", name, "-v", version] => status(
                state
                    .gems
                    .contains(&((*name).to_string(), (*version).to_string())),
            ),
            ["gem", "install", name, "-v", version, "--no-document"] => {
                state
                    .gems
                    .insert(((*name).to_string(), (*version).to_string()));
                ok()
            }
            ["gem", "install", name, "--no-document"] => {
                state.gems.insert(((*name).to_string(), "latest".to_string()));
                ok()
            }
            ["bundle", "install", flags @ ..] => {
                let Some(dir) = cwd else {
                    bail!("bundle install without a working directory");
                };
                let lockfile = dir.join("Gemfile.lock");
                if flags.contains(&"--deployment") {
                    if !lockfile.exists() {
                        return Ok(failure("The --deployment flag requires a Gemfile.lock"));
                    }
                } else if !lockfile.exists() {
                    fs::write(lockfile, "GEM\n")?;
                }
                ok()
            }
            _ => bail!("unexpected ruby command: {}", args.join(" ")),
        })
    }

    fn git(state: &mut HostState, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput> {
        if let ["clone", _repo, dest] = args {
            let dest = PathBuf::from(dest);
            fs::create_dir_all(dest.join(".git"))?;
            fs::write(dest.join("Gemfile"), "source 'https://rubygems.org'\n")?;
            state.heads.insert(dest, sha("default"));
            return Ok(ok());
        }

        let Some(dir) = cwd else {
            bail!("git {} without a working directory", args.join(" "));
        };
        if !state.heads.contains_key(dir) {
            return Ok(failure("not a git repository"));
        }
        Ok(match args {
            ["rev-parse", "HEAD"] => stdout(format!("{}\n", state.heads[dir])),
            ["rev-parse", "--verify", "--quiet", rev] => match resolve(state, rev) {
                Some(commit) => stdout(format!("{commit}\n")),
                None => status(false),
            },
            ["ls-remote", "origin", rev, ..] => match state.upstream.get(*rev) {
                Some(commit) => stdout(format!("{commit}\trefs/heads/{rev}\n")),
                None => stdout(""),
            },
            ["checkout", "--force", rev] | ["reset", "--hard", rev] => match resolve(state, rev) {
                Some(commit) => {
                    state.heads.insert(dir.to_path_buf(), commit);
                    ok()
                }
                None => failure("unknown revision"),
            },
            ["fetch", ..] => ok(),
            _ => bail!("unexpected git command: {}", args.join(" ")),
        })
    }
}

impl CommandRunner for FakeHost {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let line = spec.command_line();
        if let Ok(mut log) = self.log.lock() {
            log.push(line.clone());
        }
        if self
            .fail_prefix
            .as_deref()
            .is_some_and(|prefix| line.starts_with(prefix))
        {
            return Ok(failure("simulated failure"));
        }

        let program = spec.program.rsplit('/').next().unwrap_or(&spec.program);
        let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();
        let cwd = spec.cwd.as_deref();
        let mut state = self.state();

        Ok(match (program, args.as_slice()) {
            ("getent", ["group", name]) => status(state.groups.contains(*name)),
            ("getent", ["passwd", name]) => status(state.users.contains(*name)),
            ("groupadd", [.., name]) => status(state.groups.insert((*name).to_string())),
            ("groupdel", [name]) => status(state.groups.remove(*name)),
            ("useradd", [.., name]) => status(state.users.insert((*name).to_string())),
            ("userdel", [name]) => status(state.users.remove(*name)),

            ("rbenv", ["versions", "--bare"]) => stdout(state.rubies.join("\n")),
            ("rbenv", ["install", "--skip-existing", version]) => {
                if !state.rubies.iter().any(|v| v == version) {
                    state.rubies.push((*version).to_string());
                }
                ok()
            }
            ("rbenv", ["rehash"]) => ok(),
            ("rbenv", ["exec", rest @ ..]) => Self::ruby(&mut state, rest, cwd)?,

            ("dpkg", ["-s", package]) | ("rpm", ["-q", package]) => {
                status(state.packages.contains(*package))
            }
            ("apt-get" | "yum", ["install", "-y", package]) => {
                state.packages.insert((*package).to_string());
                ok()
            }

            ("stat", ["-c", _, path]) => {
                let path = Path::new(path);
                match state
                    .ownership
                    .get(path)
                    .cloned()
                    .or_else(|| Self::disk_ownership(path))
                {
                    Some(own) => stdout(format!("{}:{}:{:o}\n", own.owner, own.group, own.mode)),
                    None => failure("No such file or directory"),
                }
            }
            ("chown", [owner_group, path]) => {
                let path = Path::new(path);
                let Some(base) = state.ownership.get(path).cloned().or_else(|| Self::disk_ownership(path))
                else {
                    return Ok(failure("No such file or directory"));
                };
                let (owner, group) = owner_group.split_once(':').unwrap_or((*owner_group, ""));
                state
                    .ownership
                    .insert(path.to_path_buf(), Ownership::new(owner, group, base.mode));
                ok()
            }
            ("chmod", [mode, path]) => {
                let path = Path::new(path);
                let Some(mut own) = state.ownership.get(path).cloned().or_else(|| Self::disk_ownership(path))
                else {
                    return Ok(failure("No such file or directory"));
                };
                own.mode = u32::from_str_radix(mode, 8)?;
                state.ownership.insert(path.to_path_buf(), own);
                ok()
            }

            ("git", args) => Self::git(&mut state, args, cwd)?,

            ("systemctl", ["is-enabled", "--quiet", name]) => status(state.enabled.contains(*name)),
            ("systemctl", ["is-active", "--quiet", name]) => status(state.active.contains(*name)),
            ("systemctl", ["daemon-reload"]) => ok(),
            ("systemctl", ["enable", "--now", name]) => {
                state.enabled.insert((*name).to_string());
                state.active.insert((*name).to_string());
                ok()
            }
            ("systemctl", ["restart", name]) => {
                state.active.insert((*name).to_string());
                ok()
            }

            _ => bail!("unexpected command: {line}"),
        })
    }
}
