//! Deployment manifest generation.
//!
//! Turns mount entries into compose volume and environment blocks. The
//! environment block is the exact inverse of what
//! [`MountTable::from_env`](crate::mount::MountTable::from_env) reads back.

mod emitter;
pub mod template;

pub use emitter::{COMPOSE_VERSIONS, ManifestEmitter, environment_lines, volume_lines};
pub use template::Template;

/// Dockerfile written next to the manifest.
pub const DOCKERFILE: &str = include_str!("templates/Dockerfile");
