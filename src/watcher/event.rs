//! Filesystem events as handlers see them.
//!
//! Raw `notify` events carry the paths the process observes, which inside a
//! container are bind-mount locations. The adapter translates them back to
//! the host paths written in the settings file so handlers never deal with
//! mount identifiers.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};

use crate::mount::PathResolver;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsEventKind {
    Created,
    Modified,
    Deleted,
    Moved,
}

impl fmt::Display for FsEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FsEventKind::Created => "created",
            FsEventKind::Modified => "modified",
            FsEventKind::Deleted => "deleted",
            FsEventKind::Moved => "moved",
        };
        f.write_str(name)
    }
}

/// A filesystem event with host-side paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub src_path: String,
    /// Destination of a move, when the backend reports both ends.
    pub dest_path: Option<String>,
}

impl fmt::Display for FsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.dest_path {
            Some(dest) => write!(f, "{} {} -> {}", self.kind, self.src_path, dest),
            None => write!(f, "{} {}", self.kind, self.src_path),
        }
    }
}

/// Converts `notify` events into [`FsEvent`]s.
#[derive(Debug, Clone)]
pub struct EventAdapter {
    resolver: Arc<PathResolver>,
}

impl EventAdapter {
    pub fn new(resolver: Arc<PathResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Adapt one raw event.
    ///
    /// Access notifications are ignored. A rename reported with both ends
    /// becomes a single `Moved` event; every other event yields one
    /// `FsEvent` per path. Paths that cannot be resolved back to the host
    /// are logged and dropped.
    pub fn adapt(&self, event: &Event) -> Vec<FsEvent> {
        let kind = match event.kind {
            EventKind::Access(_) | EventKind::Other => return Vec::new(),
            EventKind::Create(_) => FsEventKind::Created,
            EventKind::Remove(_) => FsEventKind::Deleted,
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
                return self.adapt_move(&event.paths[0], &event.paths[1]);
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => FsEventKind::Deleted,
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => FsEventKind::Created,
            EventKind::Modify(ModifyKind::Name(_)) => FsEventKind::Moved,
            EventKind::Modify(_) | EventKind::Any => FsEventKind::Modified,
        };

        event
            .paths
            .iter()
            .filter_map(|path| self.to_host(kind, path))
            .map(|src_path| FsEvent {
                kind,
                src_path,
                dest_path: None,
            })
            .collect()
    }

    fn adapt_move(&self, from: &Path, to: &Path) -> Vec<FsEvent> {
        let src = self.to_host(FsEventKind::Moved, from);
        let dest = self.to_host(FsEventKind::Moved, to);

        match (src, dest) {
            (Some(src_path), dest_path) => vec![FsEvent {
                kind: FsEventKind::Moved,
                src_path,
                dest_path,
            }],
            // Moved in from outside every mount
            (None, Some(dest)) => vec![FsEvent {
                kind: FsEventKind::Created,
                src_path: dest,
                dest_path: None,
            }],
            (None, None) => Vec::new(),
        }
    }

    fn to_host(&self, kind: FsEventKind, path: &Path) -> Option<String> {
        let Some(raw) = path.to_str() else {
            tracing::warn!(
                "[events] dropping {kind} event for non UTF-8 path {}",
                path.display()
            );
            return None;
        };

        match self.resolver.to_host(raw) {
            Ok(host) => Some(host),
            Err(e) => {
                tracing::warn!("[events] dropping {kind} event: {e}");
                None
            }
        }
    }
}
