//! Lockfile staleness check for source installs
//!
//! `bundle install` is expensive, so it only runs when the lockfile is
//! missing or strictly older than the Gemfile it was resolved from.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

use crate::error::{Error, Result};

/// Freshness of a lockfile relative to its manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// No lockfile on disk
    MissingLockfile,
    /// Lockfile modified strictly before the manifest
    OlderThanManifest {
        lockfile: SystemTime,
        manifest: SystemTime,
    },
    /// Lockfile at least as new as the manifest
    Fresh,
}

impl Staleness {
    /// Whether the dependency install step has to run
    pub fn is_stale(&self) -> bool {
        !matches!(self, Self::Fresh)
    }
}

/// Compare the modification times of `lockfile` and `manifest`.
///
/// A missing manifest is an error: there is nothing to resolve against.
pub fn check(manifest: &Path, lockfile: &Path) -> Result<Staleness> {
    let lock_modified = match fs::metadata(lockfile) {
        Ok(meta) => modified(lockfile, &meta)?,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Staleness::MissingLockfile),
        Err(source) => {
            return Err(Error::Metadata {
                path: lockfile.to_path_buf(),
                source,
            });
        }
    };

    let manifest_meta = fs::metadata(manifest).map_err(|source| Error::Metadata {
        path: manifest.to_path_buf(),
        source,
    })?;
    let manifest_modified = modified(manifest, &manifest_meta)?;

    if lock_modified < manifest_modified {
        Ok(Staleness::OlderThanManifest {
            lockfile: lock_modified,
            manifest: manifest_modified,
        })
    } else {
        Ok(Staleness::Fresh)
    }
}

fn modified(path: &Path, meta: &fs::Metadata) -> Result<SystemTime> {
    meta.modified().map_err(|source| Error::Metadata {
        path: path.to_path_buf(),
        source,
    })
}
