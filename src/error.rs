//! Error types for packaging and path resolution.
//!
//! None of these are transient: each one names a configuration or
//! environment defect, so callers surface them and stop instead of retrying.

use std::path::PathBuf;
use thiserror::Error;

use crate::mount::Direction;

/// Errors raised by the mount mapping pipeline.
#[derive(Error, Debug)]
pub enum MonokelError {
    #[error("Invalid configuration in {source_name}: {reason}")]
    ConfigStructure { source_name: String, reason: String },

    #[error(
        "Mount identifier collision: '{first}' and '{second}' both derive identifier '{identifier}'"
    )]
    IdentifierCollision {
        identifier: String,
        first: String,
        second: String,
    },

    #[error("Template placeholder {placeholder} is invalid: {reason}")]
    TemplateValidation { placeholder: String, reason: String },

    #[error("Cannot resolve '{path}' ({direction}): no mounted directory covers it")]
    UnresolvedPath { path: String, direction: Direction },

    #[error("Host path '{host_path}' is mounted twice (MOUNT_{first} and MOUNT_{second})")]
    DuplicateMount {
        host_path: String,
        first: String,
        second: String,
    },

    #[error("Failed to load settings: {0}")]
    Settings(#[from] Box<figment::Error>),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MonokelError {
    /// Shorthand for a [`MonokelError::ConfigStructure`] error.
    pub fn config(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        MonokelError::ConfigStructure {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`MonokelError::TemplateValidation`] error.
    pub fn template(placeholder: impl Into<String>, reason: impl Into<String>) -> Self {
        MonokelError::TemplateValidation {
            placeholder: placeholder.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MonokelError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type MonokelResult<T> = Result<T, MonokelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = MonokelError::IdentifierCollision {
            identifier: "deadbeef".to_string(),
            first: "/a".to_string(),
            second: "/b".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("deadbeef"));
        assert!(msg.contains("'/a'"));
        assert!(msg.contains("'/b'"));

        let err = MonokelError::UnresolvedPath {
            path: "/unmapped/path".to_string(),
            direction: Direction::HostToContainer,
        };
        assert!(err.to_string().contains("/unmapped/path"));
        assert!(err.to_string().contains("host -> container"));

        let err = MonokelError::template("{VOLUMES}", "not found in template");
        assert!(err.to_string().contains("{VOLUMES}"));
    }
}
