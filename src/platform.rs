//! Operating system package family detection

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Location of the os-release file on a live system
pub const OS_RELEASE: &str = "/etc/os-release";

/// Package family of the target system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageFamily {
    /// dpkg/apt based (Debian, Ubuntu)
    Debian,
    /// rpm/yum based (RHEL, CentOS, Fedora, Amazon Linux)
    Rhel,
}

impl PackageFamily {
    /// Native package providing the libarchive headers the server needs
    pub fn libarchive_package(&self) -> &'static str {
        match self {
            Self::Debian => "libarchive-dev",
            Self::Rhel => "libarchive-devel",
        }
    }
}

impl fmt::Display for PackageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debian => write!(f, "debian"),
            Self::Rhel => write!(f, "rhel"),
        }
    }
}

/// Errors detecting the package family
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("could not read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized package family: {0}")]
    UnknownFamily(String),
}

/// Detect the package family from an os-release file
pub fn detect(os_release: &Path) -> Result<PackageFamily, PlatformError> {
    let content = std::fs::read_to_string(os_release).map_err(|source| PlatformError::Unreadable {
        path: os_release.display().to_string(),
        source,
    })?;
    parse_os_release(&content)
}

/// Classify os-release contents by `ID` and `ID_LIKE`
pub fn parse_os_release(content: &str) -> Result<PackageFamily, PlatformError> {
    let mut ids: Vec<String> = Vec::new();
    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key == "ID" || key == "ID_LIKE" {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            ids.extend(value.split_whitespace().map(str::to_lowercase));
        }
    }

    for id in &ids {
        match id.as_str() {
            "debian" | "ubuntu" => return Ok(PackageFamily::Debian),
            "rhel" | "centos" | "fedora" | "amzn" | "rocky" | "almalinux" | "ol" => {
                return Ok(PackageFamily::Rhel);
            }
            _ => {}
        }
    }

    Err(PlatformError::UnknownFamily(if ids.is_empty() {
        "unknown".to_string()
    } else {
        ids.join(" ")
    }))
}
