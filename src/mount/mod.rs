//! Host path <-> container mount mapping.
//!
//! The mapping is established at packaging time and rebuilt at startup
//! purely from the process environment.
//!
//! # Environment contract
//!
//! ```text
//! CONTAINER=1                     running inside a container
//! MOUNT_<8-hex-id>=<host_path>    one per declared watch path
//! COMPOSE_PROJECT_NAME            project identity, passed through
//! ```
//!
//! Volume entries in the generated manifest read `<host_path>:/<8-hex-id>`.

mod extract;
mod identifier;
mod resolver;
mod table;

use std::fmt;

pub use extract::{PathExtractor, WATCH_LIST_KEY};
pub(crate) use extract::validate_host_path;
pub use identifier::{IDENTIFIER_LEN, MountEntry, MountIdentifier, derive_entries, derive_entries_with};
pub use resolver::PathResolver;
pub use table::MountTable;

/// Environment variable whose presence marks an in-container run.
pub const CONTAINER_ENV: &str = "CONTAINER";

/// Prefix of the per-mount environment variables.
pub const MOUNT_ENV_PREFIX: &str = "MOUNT_";

/// Project identity variable emitted into the manifest.
pub const PROJECT_ENV: &str = "COMPOSE_PROJECT_NAME";

/// Direction of a path translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Path as written in configuration -> bind-mount location.
    HostToContainer,
    /// Bind-mount location -> path as written in configuration.
    ContainerToHost,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::HostToContainer => write!(f, "host -> container"),
            Direction::ContainerToHost => write!(f, "container -> host"),
        }
    }
}
