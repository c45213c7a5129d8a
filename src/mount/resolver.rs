//! Path resolution gated on the in-container sentinel.

use crate::error::MonokelResult;

use super::table::{MountTable, utf8_vars};
use super::{CONTAINER_ENV, Direction};

/// Translates paths between host and container form.
///
/// Outside a container every path resolves to itself, so the same
/// configuration runs unmodified on the host.
#[derive(Debug, Clone)]
pub struct PathResolver {
    table: MountTable,
    in_container: bool,
}

impl PathResolver {
    pub fn new(table: MountTable, in_container: bool) -> Self {
        Self {
            table,
            in_container,
        }
    }

    /// Resolver that never translates.
    pub fn identity() -> Self {
        Self::new(MountTable::new(), false)
    }

    /// Build from the current process environment.
    pub fn from_env() -> MonokelResult<Self> {
        Self::from_vars(utf8_vars(std::env::vars_os()))
    }

    /// Build from a snapshot of `(name, value)` pairs.
    ///
    /// `CONTAINER` counts as set when present with a non-empty value. On the
    /// host the table is informational only, so stray `MOUNT_` variables
    /// that do not form a valid table are logged and ignored.
    pub fn from_vars<I, K, V>(vars: I) -> MonokelResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let vars: Vec<(String, String)> = vars
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.into()))
            .collect();

        let in_container = vars
            .iter()
            .any(|(k, v)| k == CONTAINER_ENV && !v.is_empty());
        let table = match MountTable::from_vars(vars) {
            Ok(table) => table,
            Err(e) if !in_container => {
                tracing::warn!("[resolver] ignoring mount variables on the host: {e}");
                MountTable::new()
            }
            Err(e) => return Err(e),
        };

        if in_container {
            crate::log_event!(
                "resolver",
                "detected in-container run",
                "{} mount(s)",
                table.len()
            );
        } else {
            crate::debug_event!("resolver", "host run, paths resolve to themselves");
        }

        Ok(Self::new(table, in_container))
    }

    pub fn in_container(&self) -> bool {
        self.in_container
    }

    pub fn table(&self) -> &MountTable {
        &self.table
    }

    /// Resolve `path` in `direction`.
    ///
    /// Inside a container an uncovered path is an error rather than being
    /// passed through, since the raw path would point at the wrong location.
    pub fn resolve(&self, path: &str, direction: Direction) -> MonokelResult<String> {
        if !self.in_container {
            return Ok(path.to_string());
        }
        let resolved = self.table.resolve(path, direction)?;
        tracing::trace!("[resolver] '{path}' -> '{resolved}' ({direction})");
        Ok(resolved)
    }

    /// Host path -> container path.
    pub fn to_container(&self, host_path: &str) -> MonokelResult<String> {
        self.resolve(host_path, Direction::HostToContainer)
    }

    /// Container path -> host path.
    pub fn to_host(&self, container_path: &str) -> MonokelResult<String> {
        self.resolve(container_path, Direction::ContainerToHost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonokelError;

    #[test]
    fn test_identity_outside_container() {
        let resolver = PathResolver::from_vars([("MOUNT_abc12345", "/temp")]).unwrap();
        assert!(!resolver.in_container());
        assert_eq!(resolver.table().len(), 1);

        for path in ["/temp", "/temp/file.txt", "/unmapped/path", "relative", ""] {
            for direction in [Direction::HostToContainer, Direction::ContainerToHost] {
                assert_eq!(resolver.resolve(path, direction).unwrap(), path);
            }
        }
    }

    #[test]
    fn test_invalid_mounts_only_fail_inside_a_container() {
        let duplicated = [("MOUNT_aaaaaaaa", "/temp"), ("MOUNT_bbbbbbbb", "/temp")];

        let resolver = PathResolver::from_vars(duplicated).unwrap();
        assert!(!resolver.in_container());
        assert!(resolver.table().is_empty());
        assert_eq!(resolver.to_container("/temp/a").unwrap(), "/temp/a");

        let in_container = duplicated.into_iter().chain([("CONTAINER", "1")]);
        let err = PathResolver::from_vars(in_container).unwrap_err();
        assert!(matches!(err, MonokelError::DuplicateMount { .. }));
    }

    #[test]
    fn test_empty_sentinel_means_host_run() {
        let resolver =
            PathResolver::from_vars([("CONTAINER", ""), ("MOUNT_abc12345", "/temp")]).unwrap();
        assert!(!resolver.in_container());
        assert_eq!(resolver.to_container("/temp").unwrap(), "/temp");
    }

    #[test]
    fn test_in_container_resolution() {
        let resolver =
            PathResolver::from_vars([("CONTAINER", "1"), ("MOUNT_abc12345", "/temp")]).unwrap();
        assert!(resolver.in_container());

        assert_eq!(resolver.to_container("/temp").unwrap(), "/abc12345");
        assert_eq!(
            resolver.to_container("/temp/file.txt").unwrap(),
            "/abc12345/file.txt"
        );
        assert_eq!(resolver.to_host("/abc12345").unwrap(), "/temp");
        assert_eq!(
            resolver.to_host("/abc12345/file.txt").unwrap(),
            "/temp/file.txt"
        );

        let err = resolver.to_container("/unmapped/path").unwrap_err();
        assert!(matches!(err, MonokelError::UnresolvedPath { .. }));
    }

    #[test]
    fn test_round_trip_for_every_mapped_path() {
        let vars = [
            ("CONTAINER", "1"),
            ("MOUNT_11111111", "/temp"),
            ("MOUNT_22222222", "/foo"),
            ("MOUNT_33333333", "/srv/data"),
        ];
        let resolver = PathResolver::from_vars(vars).unwrap();

        let hosts: Vec<String> = resolver.table().iter().map(|(h, _)| h.to_string()).collect();
        for host in hosts {
            let inside = resolver.to_container(&host).unwrap();
            assert_eq!(resolver.to_host(&inside).unwrap(), host);

            let file = format!("{host}/notes.txt");
            let inside = resolver.to_container(&file).unwrap();
            assert_eq!(resolver.to_host(&inside).unwrap(), file);
        }
    }
}
