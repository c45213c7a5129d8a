//! Logging setup.
//!
//! Compact timestamped output with per-target level configuration.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "info"
//!
//! [logging.modules]
//! monokel::watcher = "debug"
//! ```
//!
//! # Environment Variables
//!
//! `MONOKEL_LOG` wins over `RUST_LOG`, and both win over the settings file
//! and the `--verbosity` flag:
//! ```bash
//! MONOKEL_LOG=debug monokel run
//! RUST_LOG=monokel::mount=trace monokel resolve /temp
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Environment variable overriding every other log filter source.
pub const LOG_ENV: &str = "MONOKEL_LOG";

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Build the filter directive string.
///
/// `level` replaces the configured default level when given; per-target
/// overrides from the settings are kept.
pub fn filter_directives(config: &LoggingConfig, level: Option<&str>) -> String {
    let mut directives = level.unwrap_or(&config.default).to_string();
    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();
    for (module, level) in modules {
        directives.push_str(&format!(",{module}={level}"));
    }
    directives
}

/// Initialize logging.
///
/// Only the first call takes effect. Output goes to stderr so that
/// command output on stdout stays machine readable.
pub fn init_with_config(config: &LoggingConfig, level: Option<&str>) {
    INIT.call_once(|| {
        let filter = if let Ok(directives) = std::env::var(LOG_ENV) {
            EnvFilter::new(directives)
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config, level))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Log an event at info level with a component tag.
///
/// # Examples
/// ```ignore
/// log_event!("watcher", "scheduled", "{}", path);
/// log_event!("runtime", "stopped");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Debug-level counterpart of [`log_event!`].
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}
