//! Native (OS) package resource

use anyhow::Result;
use declarative::{ApplyContext, CommandSpec};
use std::path::PathBuf;

use super::{ApplyResult, Resource, ResourceState};
use crate::platform::{self, PackageFamily};

/// The libarchive development package, named per package family
///
/// The family is detected from os-release when the step runs, so an
/// unsupported platform aborts the run at this step.
#[derive(Debug, Clone)]
pub struct NativePackage {
    pub os_release: PathBuf,
}

impl NativePackage {
    pub fn new(os_release: impl Into<PathBuf>) -> Self {
        Self {
            os_release: os_release.into(),
        }
    }

    fn family(&self) -> Result<PackageFamily> {
        Ok(platform::detect(&self.os_release)?)
    }

    fn installed(ctx: &ApplyContext, family: PackageFamily) -> Result<bool> {
        let name = family.libarchive_package();
        let probe = match family {
            PackageFamily::Debian => CommandSpec::new("dpkg").args(["-s", name]),
            PackageFamily::Rhel => CommandSpec::new("rpm").args(["-q", name]),
        };
        ctx.probe(&probe)
    }

    fn install_command(family: PackageFamily) -> CommandSpec {
        let name = family.libarchive_package();
        match family {
            PackageFamily::Debian => CommandSpec::new("apt-get")
                .args(["install", "-y", name])
                .env("DEBIAN_FRONTEND", "noninteractive"),
            PackageFamily::Rhel => CommandSpec::new("yum").args(["install", "-y", name]),
        }
    }
}

impl Resource for NativePackage {
    fn id(&self) -> String {
        "libarchive".to_string()
    }

    fn description(&self) -> String {
        "Install libarchive development headers".to_string()
    }

    fn resource_type(&self) -> &'static str {
        "package"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        let family = self.family()?;
        if Self::installed(ctx, family)? {
            Ok(ResourceState::present_with(family.libarchive_package()))
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self) -> ResourceState {
        match self.family() {
            Ok(family) => ResourceState::present_with(family.libarchive_package()),
            Err(_) => ResourceState::Unknown,
        }
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let family = self.family()?;
        log::debug!("Package family: {family}");
        ctx.run(&Self::install_command(family))?;
        Ok(ApplyResult::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use tempfile::TempDir;

    fn os_release(temp: &TempDir, content: &str) -> PathBuf {
        let path = temp.path().join("os-release");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_debian_installs_dev_package() {
        let temp = TempDir::new().unwrap();
        let host = FakeHost::new();
        let ctx = ApplyContext::new(false, false, &host);
        let pkg = NativePackage::new(os_release(&temp, "ID=debian\n"));

        assert!(pkg.needs_apply(&ctx).unwrap());
        pkg.apply(&ctx).unwrap();
        assert!(host.ran("apt-get install -y libarchive-dev"));
        assert!(!pkg.needs_apply(&ctx).unwrap());
    }

    #[test]
    fn test_rhel_uses_yum() {
        let temp = TempDir::new().unwrap();
        let host = FakeHost::new();
        let ctx = ApplyContext::new(false, false, &host);
        let pkg = NativePackage::new(os_release(&temp, "ID=\"centos\"\n"));

        pkg.apply(&ctx).unwrap();
        assert!(host.ran("yum install -y libarchive-devel"));
        assert!(host.has_package("libarchive-devel"));
    }

    #[test]
    fn test_unknown_family_is_fatal() {
        let temp = TempDir::new().unwrap();
        let host = FakeHost::new();
        let ctx = ApplyContext::new(false, false, &host);
        let pkg = NativePackage::new(os_release(&temp, "ID=gentoo\n"));

        let err = pkg.current_state(&ctx).unwrap_err();
        assert!(err.to_string().contains("unrecognized package family"));
        assert!(pkg.apply(&ctx).is_err());
    }
}
