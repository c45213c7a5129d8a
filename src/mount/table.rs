//! Runtime mount table rebuilt from `MOUNT_<id>` environment variables.

use std::collections::HashMap;
use std::ffi::OsString;

use crate::error::{MonokelError, MonokelResult};

use super::identifier::{MountEntry, MountIdentifier};
use super::{Direction, MOUNT_ENV_PREFIX};

/// Bidirectional host path <-> container path mapping.
///
/// Built once at startup and read-only afterwards, so it can be shared
/// freely between observer callbacks.
#[derive(Debug, Clone, Default)]
pub struct MountTable {
    host_to_container: HashMap<String, String>,
    container_to_host: HashMap<String, String>,
}

impl MountTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_env() -> MonokelResult<Self> {
        Self::from_vars(utf8_vars(std::env::vars_os()))
    }

    /// Build the table from `(name, value)` pairs.
    ///
    /// Only names of the exact form `MOUNT_<8 lowercase hex>` are used; all
    /// other variables are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> MonokelResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut table = Self::new();

        for (key, value) in vars {
            let Some(identifier) = key
                .as_ref()
                .strip_prefix(MOUNT_ENV_PREFIX)
                .and_then(MountIdentifier::parse)
            else {
                continue;
            };
            let host_path = value.into();

            if MountIdentifier::derive(&host_path) != identifier {
                tracing::warn!(
                    "[mounts] {}{identifier} does not match the identifier derived from '{host_path}'",
                    MOUNT_ENV_PREFIX
                );
            }

            table.insert(host_path, identifier)?;
        }

        Ok(table)
    }

    /// Build the table straight from packaging-side entries.
    pub fn from_entries(entries: &[MountEntry]) -> MonokelResult<Self> {
        let mut table = Self::new();
        for entry in entries {
            table.insert(entry.host_path.clone(), entry.identifier.clone())?;
        }
        Ok(table)
    }

    fn insert(&mut self, host_path: String, identifier: MountIdentifier) -> MonokelResult<()> {
        let container_path = identifier.container_path();

        if let Some(existing) = self.host_to_container.get(&host_path) {
            if *existing == container_path {
                return Ok(());
            }
            let mut ids = [
                existing.trim_start_matches('/').to_string(),
                identifier.to_string(),
            ];
            ids.sort();
            let [first, second] = ids;
            return Err(MonokelError::DuplicateMount {
                host_path,
                first,
                second,
            });
        }

        tracing::info!("[mounts] detected mapping '{host_path}' -> '{container_path}'");

        self.container_to_host
            .insert(container_path.clone(), host_path.clone());
        self.host_to_container.insert(host_path, container_path);
        Ok(())
    }

    /// Container path of an exactly mapped host directory.
    pub fn container_path(&self, host_path: &str) -> Option<&str> {
        self.host_to_container.get(host_path).map(String::as_str)
    }

    /// Host path of an exactly mapped container directory.
    pub fn host_path(&self, container_path: &str) -> Option<&str> {
        self.container_to_host.get(container_path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.host_to_container.len()
    }

    pub fn is_empty(&self) -> bool {
        self.host_to_container.is_empty()
    }

    /// Iterate `(host_path, container_path)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.host_to_container
            .iter()
            .map(|(h, c)| (h.as_str(), c.as_str()))
    }

    /// Translate `path` in `direction` using the table alone.
    ///
    /// An exactly mapped directory resolves to its counterpart. Otherwise the
    /// path is split into parent and final component, the parent is resolved
    /// the same way and the component re-appended. A path with no mapped
    /// ancestor is an [`MonokelError::UnresolvedPath`].
    pub fn resolve(&self, path: &str, direction: Direction) -> MonokelResult<String> {
        let map = match direction {
            Direction::HostToContainer => &self.host_to_container,
            Direction::ContainerToHost => &self.container_to_host,
        };

        resolve_in(map, path, false).ok_or_else(|| MonokelError::UnresolvedPath {
            path: path.to_string(),
            direction,
        })
    }
}

fn resolve_in(map: &HashMap<String, String>, path: &str, as_parent: bool) -> Option<String> {
    if let Some(mapped) = map.get(path) {
        return Some(mapped.clone());
    }
    // A root declared as `/temp/` still covers `/temp/file`
    if as_parent && !path.ends_with('/') {
        if let Some(mapped) = map.get(&format!("{path}/")) {
            return Some(mapped.clone());
        }
    }

    let (parent, name) = split_path(path)?;
    if parent.len() >= path.len() {
        return None;
    }

    let resolved_parent = resolve_in(map, parent, true)?;
    Some(join_path(&resolved_parent, name))
}

/// Split into `(head, tail)` at the last `/`.
///
/// Trailing slashes are stripped from the head unless it consists only of
/// slashes, so `/temp/file.txt` -> (`/temp`, `file.txt`) and `/file` ->
/// (`/`, `file`). Paths without any `/` cannot be split.
pub(crate) fn split_path(path: &str) -> Option<(&str, &str)> {
    let idx = path.rfind('/')?;
    let head = &path[..=idx];
    let tail = &path[idx + 1..];
    let trimmed = head.trim_end_matches('/');
    let head = if trimmed.is_empty() { head } else { trimmed };
    Some((head, tail))
}

pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Keep only variables whose name and value are both valid UTF-8.
pub(crate) fn utf8_vars(
    vars: impl Iterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}
