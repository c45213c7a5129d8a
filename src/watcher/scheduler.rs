//! Registers watch targets with an observer and runs the main loop.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::config::WatchConfig;
use crate::mount::PathResolver;

use super::WatchError;
use super::handler::HandlerRegistry;
use super::observer::Observer;

/// A watch as handed to the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledWatch {
    pub declared_path: String,
    pub resolved_path: String,
    pub handler: String,
    pub recursive: bool,
}

/// Resolves each watch target and schedules it on an [`Observer`].
pub struct WatchScheduler<O: Observer> {
    observer: O,
    resolver: Arc<PathResolver>,
    handlers: HandlerRegistry,
    heartbeat: Duration,
    scheduled: Vec<ScheduledWatch>,
}

impl<O: Observer> WatchScheduler<O> {
    pub fn new(observer: O, resolver: Arc<PathResolver>, handlers: HandlerRegistry) -> Self {
        Self {
            observer,
            resolver,
            handlers,
            heartbeat: Duration::from_secs(60),
            scheduled: Vec::new(),
        }
    }

    /// Interval of the "still running" log line.
    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    pub fn scheduled(&self) -> &[ScheduledWatch] {
        &self.scheduled
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Schedule every target of `config`.
    ///
    /// A target whose path does not resolve aborts scheduling. Inside a
    /// container the raw path would watch the wrong location.
    pub fn schedule(&mut self, config: &WatchConfig) -> Result<&[ScheduledWatch], WatchError> {
        for target in config.targets() {
            let handler = self.handlers.get(&target.handler)?;
            let resolved = self.resolver.to_container(&target.declared_path)?;

            self.observer
                .schedule(handler.clone(), &resolved, target.recursive)?;

            let mode = if target.recursive {
                "recursive"
            } else {
                "non-recursive"
            };
            crate::log_event!(
                "scheduler",
                "scheduled",
                "{} for path '{resolved}' in {mode} mode",
                handler.name()
            );

            self.scheduled.push(ScheduledWatch {
                declared_path: target.declared_path.clone(),
                resolved_path: resolved,
                handler: handler.name().to_string(),
                recursive: target.recursive,
            });
        }
        Ok(&self.scheduled)
    }

    /// Start the observer and block until `shutdown` fires or disconnects,
    /// then stop and join it.
    pub fn run(&mut self, shutdown: &Receiver<()>) -> Result<(), WatchError> {
        self.observer.start()?;
        crate::log_event!("runtime", "started", "{} watch(es)", self.scheduled.len());

        loop {
            match shutdown.recv_timeout(self.heartbeat) {
                Ok(()) => {
                    crate::log_event!("runtime", "shutdown requested");
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {
                    crate::log_event!("runtime", "heartbeat", "main event loop still running");
                }
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!("[runtime] shutdown channel closed, stopping");
                    break;
                }
            }
        }

        self.observer.stop();
        self.observer.join()?;
        crate::log_event!("runtime", "stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{WatchConfig, WatcherConfig};
    use crate::error::MonokelError;
    use crate::watcher::EventHandler;
    use crossbeam_channel::unbounded;
    use parking_lot::Mutex;

    /// Records every call as a string.
    #[derive(Clone, Default)]
    struct RecordingObserver {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Observer for RecordingObserver {
        fn schedule(
            &mut self,
            handler: Arc<dyn EventHandler>,
            path: &str,
            recursive: bool,
        ) -> Result<(), WatchError> {
            self.calls
                .lock()
                .push(format!("schedule {} {path} {recursive}", handler.name()));
            Ok(())
        }

        fn start(&mut self) -> Result<(), WatchError> {
            self.calls.lock().push("start".to_string());
            Ok(())
        }

        fn stop(&mut self) {
            self.calls.lock().push("stop".to_string());
        }

        fn join(&mut self) -> Result<(), WatchError> {
            self.calls.lock().push("join".to_string());
            Ok(())
        }
    }

    fn config(watchers: &[(&[&str], bool)]) -> WatchConfig {
        let watchers: Vec<WatcherConfig> = watchers
            .iter()
            .map(|(paths, recursive)| WatcherConfig {
                paths: paths.iter().map(|s| s.to_string()).collect(),
                handler: "log".to_string(),
                recursive: *recursive,
            })
            .collect();
        WatchConfig::validate("test", &watchers, |name| name == "log").unwrap()
    }

    fn container_resolver() -> Arc<PathResolver> {
        Arc::new(
            PathResolver::from_vars([
                ("CONTAINER", "1"),
                ("MOUNT_abc12345", "/temp"),
                ("MOUNT_def67890", "/foo"),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_schedules_resolved_paths() {
        let observer = RecordingObserver::default();
        let calls = observer.calls.clone();
        let mut scheduler =
            WatchScheduler::new(observer, container_resolver(), HandlerRegistry::default());

        let scheduled = scheduler
            .schedule(&config(&[(&["/temp", "/foo"], true)]))
            .unwrap();
        assert_eq!(scheduled.len(), 2);
        assert_eq!(scheduled[0].declared_path, "/temp");
        assert_eq!(scheduled[0].resolved_path, "/abc12345");

        assert_eq!(
            *calls.lock(),
            vec![
                "schedule log /abc12345 true".to_string(),
                "schedule log /def67890 true".to_string(),
            ]
        );
    }

    #[test]
    fn test_host_run_schedules_declared_paths() {
        let mut scheduler = WatchScheduler::new(
            RecordingObserver::default(),
            Arc::new(PathResolver::identity()),
            HandlerRegistry::default(),
        );
        let scheduled = scheduler.schedule(&config(&[(&["/temp"], false)])).unwrap();
        assert_eq!(scheduled[0].resolved_path, "/temp");
        assert!(!scheduled[0].recursive);
    }

    #[test]
    fn test_unresolved_path_aborts_scheduling() {
        let observer = RecordingObserver::default();
        let calls = observer.calls.clone();
        let mut scheduler =
            WatchScheduler::new(observer, container_resolver(), HandlerRegistry::default());

        let err = scheduler
            .schedule(&config(&[(&["/unmapped"], false)]))
            .unwrap_err();
        assert!(matches!(
            err,
            WatchError::Resolve(MonokelError::UnresolvedPath { .. })
        ));
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_unknown_handler() {
        let mut scheduler = WatchScheduler::new(
            RecordingObserver::default(),
            Arc::new(PathResolver::identity()),
            HandlerRegistry::new(),
        );
        let err = scheduler.schedule(&config(&[(&["/temp"], false)])).unwrap_err();
        assert!(matches!(err, WatchError::UnknownHandler { .. }));
    }

    #[test]
    fn test_run_stops_then_joins_on_shutdown() {
        let observer = RecordingObserver::default();
        let calls = observer.calls.clone();
        let mut scheduler = WatchScheduler::new(
            observer,
            Arc::new(PathResolver::identity()),
            HandlerRegistry::default(),
        )
        .with_heartbeat(Duration::from_millis(5));

        let (tx, rx) = unbounded();
        let sender = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            tx.send(()).unwrap();
        });

        scheduler.run(&rx).unwrap();
        sender.join().unwrap();

        assert_eq!(*calls.lock(), vec!["start", "stop", "join"]);
    }

    #[test]
    fn test_run_ends_when_shutdown_channel_closes() {
        let observer = RecordingObserver::default();
        let calls = observer.calls.clone();
        let mut scheduler = WatchScheduler::new(
            observer,
            Arc::new(PathResolver::identity()),
            HandlerRegistry::default(),
        );

        let (tx, rx) = unbounded::<()>();
        drop(tx);
        scheduler.run(&rx).unwrap();
        assert_eq!(calls.lock().last().map(String::as_str), Some("join"));
    }
}
