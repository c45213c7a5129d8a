//! Error types for the watcher runtime.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::MonokelError;

/// Errors from watcher operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("No event handler registered under '{name}'")]
    UnknownHandler { name: String },

    #[error("Observer is {state}")]
    InvalidState { state: &'static str },

    #[error(transparent)]
    Resolve(#[from] MonokelError),

    #[error("Event dispatcher terminated abnormally")]
    DispatcherPanicked,
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
