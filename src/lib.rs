//! Container-aware filesystem watching.
//!
//! Watch paths are declared once, as host paths, in `.monokel/settings.toml`.
//! Packaging bind-mounts every declared directory at `/<identifier>`, where
//! the identifier is the first 8 hex characters of the path's SHA-256, and
//! records each mapping as a `MOUNT_<identifier>` environment variable. At
//! runtime the mapping is rebuilt from the environment and every path is
//! translated between host and container form.
//!
//! ```
//! use monokel::mount::{MountEntry, PathResolver};
//!
//! let entry = MountEntry::new("/temp");
//! let resolver = PathResolver::from_vars([
//!     ("CONTAINER".to_string(), "1".to_string()),
//!     (entry.identifier.env_key(), entry.host_path.clone()),
//! ])
//! .unwrap();
//!
//! let inside = resolver.to_container("/temp/notes.txt").unwrap();
//! assert_eq!(inside, format!("/{}/notes.txt", entry.identifier));
//! assert_eq!(resolver.to_host(&inside).unwrap(), "/temp/notes.txt");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod mount;
pub mod package;
pub mod watcher;

pub use config::{Settings, WatchConfig, WatchTarget};
pub use error::{MonokelError, MonokelResult};
pub use manifest::ManifestEmitter;
pub use mount::{Direction, MountEntry, MountIdentifier, MountTable, PathExtractor, PathResolver};
pub use watcher::{WatchError, WatchScheduler};
