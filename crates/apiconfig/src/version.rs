//! Classification of the requested server version

use regex::Regex;
use std::sync::LazyLock;

static RELEASE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(\.\d+(\.\d+)?)?$").expect("release version pattern is valid")
});

/// Whether `version` names a published release (`4`, `2.0`, `3.1.2`)
pub fn is_release(version: &str) -> bool {
    RELEASE_VERSION.is_match(version)
}

/// Whether a server at `version` must be built from a source checkout.
///
/// Anything that is not a numeric release is treated as a git revision:
/// a branch, a tag, or a commit SHA.
pub fn install_from_source(version: &str) -> bool {
    !is_release(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_versions() {
        for version in ["3.1.2", "4", "2.0", "10.20.30"] {
            assert!(!install_from_source(version), "{version}");
        }
    }

    #[test]
    fn test_source_revisions() {
        for version in [
            "master",
            "v2.2.0",
            "feature/x",
            "1b19ec1",
            "2.0.0.rc1",
            "1.2.3.4",
            "",
            " 2.0",
        ] {
            assert!(install_from_source(version), "{version:?}");
        }
    }
}
