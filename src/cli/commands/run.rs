//! Run command - the runtime stage.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::Receiver;

use crate::config::Settings;
use crate::mount::PathResolver;
use crate::watcher::{EventAdapter, HandlerRegistry, NotifyObserver, WatchScheduler};

/// Schedule every configured watcher and block until `shutdown` fires.
pub fn run_watch(settings: &Settings, config_path: &Path, shutdown: Receiver<()>) -> Result<()> {
    let handlers = HandlerRegistry::with_builtins();
    let source_name = config_path.display().to_string();
    let watch_config = settings.watch_config(&source_name, |name| handlers.contains(name))?;

    let resolver = Arc::new(PathResolver::from_env()?);
    for (host, container) in resolver.table().iter() {
        crate::log_event!("runtime", "mount", "{host} -> {container}");
    }

    let observer = NotifyObserver::new(EventAdapter::new(resolver.clone()))?;
    let heartbeat = Duration::from_secs(settings.runtime.heartbeat_secs.max(1));
    let mut scheduler = WatchScheduler::new(observer, resolver, handlers).with_heartbeat(heartbeat);

    scheduler.schedule(&watch_config)?;
    scheduler.run(&shutdown)?;
    Ok(())
}
