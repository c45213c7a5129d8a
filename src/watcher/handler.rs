//! Event handler trait and the registry handlers are looked up in.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::WatchError;
use super::event::FsEvent;

/// Name of the built-in handler that logs every event.
pub const LOG_HANDLER: &str = "log";

/// Receives filesystem events for the paths it was scheduled on.
///
/// Handlers are called from the observer's dispatcher thread, one event at a
/// time. Paths in the event are host paths.
pub trait EventHandler: Send + Sync {
    /// Handler name for logging.
    fn name(&self) -> &str;

    fn on_event(&self, event: &FsEvent) -> Result<(), WatchError>;
}

/// Logs every event it receives.
#[derive(Debug, Default)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn name(&self) -> &str {
        LOG_HANDLER
    }

    fn on_event(&self, event: &FsEvent) -> Result<(), WatchError> {
        crate::log_event!("handler", event.kind, "{}", event);
        Ok(())
    }
}

/// Handlers by name, as referenced from `[[watchers]] handler = "..."`.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in handlers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LoggingHandler));
        registry
    }

    /// Register `handler` under its own name, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(handler.name().to_string(), handler);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn EventHandler>, WatchError> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| WatchError::UnknownHandler {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
