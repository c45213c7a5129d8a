//! Mount identifier derivation.
//!
//! An identifier is the first [`IDENTIFIER_LEN`] lowercase hex characters of
//! the SHA-256 digest of the host path's exact bytes. Paths are not
//! normalized: `/temp` and `/temp/` get different identifiers.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{MonokelError, MonokelResult};

/// Number of hex characters kept from the digest.
pub const IDENTIFIER_LEN: usize = 8;

/// Short deterministic token naming one host path's mount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MountIdentifier(String);

impl MountIdentifier {
    /// Derive the identifier of `host_path`.
    pub fn derive(host_path: &str) -> Self {
        let digest = format!("{:x}", Sha256::digest(host_path.as_bytes()));
        Self(digest[..IDENTIFIER_LEN].to_string())
    }

    /// Accept an already-derived identifier, e.g. the suffix of a `MOUNT_`
    /// variable. Returns `None` unless it is exactly [`IDENTIFIER_LEN`]
    /// lowercase hex characters.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == IDENTIFIER_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// In-container mount point: `/` followed by the identifier.
    pub fn container_path(&self) -> String {
        format!("/{}", self.0)
    }

    /// Name of the environment variable carrying this mount.
    pub fn env_key(&self) -> String {
        format!("{}{}", super::MOUNT_ENV_PREFIX, self.0)
    }
}

impl fmt::Display for MountIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One declared watch path and the identifier of its mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountEntry {
    pub host_path: String,
    pub identifier: MountIdentifier,
}

impl MountEntry {
    pub fn new(host_path: impl Into<String>) -> Self {
        let host_path = host_path.into();
        let identifier = MountIdentifier::derive(&host_path);
        Self {
            host_path,
            identifier,
        }
    }

    pub fn container_path(&self) -> String {
        self.identifier.container_path()
    }

    /// Compose volume line body: `host_path:/identifier`.
    pub fn volume(&self) -> String {
        format!("{}:{}", self.host_path, self.container_path())
    }

    /// Environment declaration body: `MOUNT_<identifier>=host_path`.
    pub fn env_declaration(&self) -> String {
        format!("{}={}", self.identifier.env_key(), self.host_path)
    }
}

/// Derive entries for every path, in iteration order.
///
/// Fails with [`MonokelError::IdentifierCollision`] when two distinct paths
/// truncate to the same identifier.
pub fn derive_entries<'a, I>(paths: I) -> MonokelResult<Vec<MountEntry>>
where
    I: IntoIterator<Item = &'a String>,
{
    derive_entries_with(paths, MountIdentifier::derive)
}

/// [`derive_entries`] with a caller-supplied derivation function.
pub fn derive_entries_with<'a, I, F>(paths: I, derive: F) -> MonokelResult<Vec<MountEntry>>
where
    I: IntoIterator<Item = &'a String>,
    F: Fn(&str) -> MountIdentifier,
{
    let mut seen: HashMap<MountIdentifier, &'a String> = HashMap::new();
    let mut entries = Vec::new();

    for path in paths {
        let identifier = derive(path.as_str());
        match seen.get(&identifier) {
            Some(existing) if *existing == path => continue,
            Some(existing) => {
                return Err(MonokelError::IdentifierCollision {
                    identifier: identifier.to_string(),
                    first: existing.to_string(),
                    second: path.clone(),
                });
            }
            None => {
                seen.insert(identifier.clone(), path);
                entries.push(MountEntry {
                    host_path: path.clone(),
                    identifier,
                });
            }
        }
    }

    Ok(entries)
}
