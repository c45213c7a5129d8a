//! Runtime file watching.
//!
//! Watch targets come from the settings file with host paths. Inside a
//! container they are resolved to their bind-mount locations before being
//! scheduled, and every event is resolved back before a handler sees it.
//!
//! # Architecture
//!
//! ```text
//! WatchScheduler
//!   - resolves host -> container per target
//!   - schedule / start / stop / join on the Observer
//!         |
//! NotifyObserver
//!   - notify::RecommendedWatcher -> crossbeam channel
//!   - dispatcher thread routes by scheduled root
//!         |
//! EventAdapter (container -> host)
//!         |
//! EventHandler (looked up by name in HandlerRegistry)
//! ```

mod error;
mod event;
mod handler;
mod observer;
mod scheduler;

pub use error::WatchError;
pub use event::{EventAdapter, FsEvent, FsEventKind};
pub use handler::{EventHandler, HandlerRegistry, LOG_HANDLER, LoggingHandler};
pub use observer::{NotifyObserver, Observer};
pub use scheduler::{ScheduledWatch, WatchScheduler};
