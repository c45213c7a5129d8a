//! The observer seam and its `notify` implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, unbounded};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;

use super::WatchError;
use super::event::EventAdapter;
use super::handler::EventHandler;

/// Delivers filesystem events for scheduled paths to handlers.
///
/// Lifecycle: any number of `schedule` calls, `start`, then `stop` followed
/// by `join` once shutdown is requested.
pub trait Observer: Send {
    /// Watch `path` (as seen by this process) and route its events to
    /// `handler`.
    fn schedule(
        &mut self,
        handler: Arc<dyn EventHandler>,
        path: &str,
        recursive: bool,
    ) -> Result<(), WatchError>;

    fn start(&mut self) -> Result<(), WatchError>;

    /// Stop producing events. Events already queued are still delivered.
    fn stop(&mut self);

    /// Wait for event delivery to finish. Only valid after `stop`.
    fn join(&mut self) -> Result<(), WatchError>;
}

/// One scheduled watch.
struct Route {
    root: PathBuf,
    recursive: bool,
    handler: Arc<dyn EventHandler>,
}

impl Route {
    fn covers(&self, path: &Path) -> bool {
        if self.recursive {
            path.starts_with(&self.root)
        } else {
            path == self.root || path.parent() == Some(self.root.as_path())
        }
    }
}

/// [`Observer`] backed by `notify::RecommendedWatcher`.
///
/// The watcher callback feeds a channel drained by a dedicated dispatcher
/// thread, which adapts each event and calls the handlers whose routes
/// cover it.
pub struct NotifyObserver {
    watcher: Option<RecommendedWatcher>,
    events: Receiver<notify::Result<Event>>,
    routes: Arc<RwLock<Vec<Route>>>,
    adapter: EventAdapter,
    dispatcher: Option<JoinHandle<()>>,
}

impl NotifyObserver {
    pub fn new(adapter: EventAdapter) -> Result<Self, WatchError> {
        let (tx, rx) = unbounded();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the observer is shutting down
            let _ = tx.send(res);
        })?;

        Ok(Self {
            watcher: Some(watcher),
            events: rx,
            routes: Arc::new(RwLock::new(Vec::new())),
            adapter,
            dispatcher: None,
        })
    }

    /// Number of scheduled watches.
    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }
}

impl Observer for NotifyObserver {
    fn schedule(
        &mut self,
        handler: Arc<dyn EventHandler>,
        path: &str,
        recursive: bool,
    ) -> Result<(), WatchError> {
        let watcher = self
            .watcher
            .as_mut()
            .ok_or(WatchError::InvalidState { state: "stopped" })?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        let root = PathBuf::from(path);
        watcher
            .watch(&root, mode)
            .map_err(|e| WatchError::PathWatchFailed {
                path: root.clone(),
                reason: e.to_string(),
            })?;

        crate::debug_event!("observer", "watching", "{}", root.display());
        self.routes.write().push(Route {
            root,
            recursive,
            handler,
        });
        Ok(())
    }

    fn start(&mut self) -> Result<(), WatchError> {
        if self.watcher.is_none() {
            return Err(WatchError::InvalidState { state: "stopped" });
        }
        if self.dispatcher.is_some() {
            return Err(WatchError::InvalidState {
                state: "already started",
            });
        }

        let events = self.events.clone();
        let routes = self.routes.clone();
        let adapter = self.adapter.clone();

        let handle = thread::Builder::new()
            .name("monokel-events".to_string())
            .spawn(move || {
                for res in events {
                    match res {
                        Ok(event) => dispatch(&event, &routes.read(), &adapter),
                        Err(e) => tracing::warn!("[observer] watch error: {e}"),
                    }
                }
                crate::debug_event!("observer", "dispatcher finished");
            })
            .map_err(|e| WatchError::InitFailed {
                reason: format!("cannot spawn dispatcher: {e}"),
            })?;

        self.dispatcher = Some(handle);
        crate::log_event!("observer", "started", "{} watch(es)", self.route_count());
        Ok(())
    }

    fn stop(&mut self) {
        // Dropping the watcher drops the channel sender, ending the dispatcher
        if self.watcher.take().is_some() {
            crate::log_event!("observer", "stopped");
        }
    }

    fn join(&mut self) -> Result<(), WatchError> {
        if self.watcher.is_some() {
            return Err(WatchError::InvalidState {
                state: "still running, stop it before joining",
            });
        }
        if let Some(handle) = self.dispatcher.take() {
            handle.join().map_err(|_| WatchError::DispatcherPanicked)?;
        }
        Ok(())
    }
}

fn dispatch(event: &Event, routes: &[Route], adapter: &EventAdapter) {
    let mut handlers: Vec<&Arc<dyn EventHandler>> = Vec::new();
    for route in routes {
        let covered = event.paths.iter().any(|p| route.covers(p));
        if covered && !handlers.iter().any(|h| Arc::ptr_eq(*h, &route.handler)) {
            handlers.push(&route.handler);
        }
    }

    if handlers.is_empty() {
        crate::debug_event!("observer", "unmatched", "{:?} {:?}", event.kind, event.paths);
        return;
    }

    for fs_event in adapter.adapt(event) {
        for handler in &handlers {
            if let Err(e) = handler.on_event(&fs_event) {
                tracing::warn!("[observer] handler '{}' failed: {e}", handler.name());
            }
        }
    }
}
