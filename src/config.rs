//! Configuration for monokel.
//!
//! Settings are layered:
//! - Default values
//! - TOML settings file (`.monokel/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides (applied by the commands)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `MONOKEL_` and use double
//! underscores to separate nested levels:
//! - `MONOKEL_BUILD__SERVICE_NAME=watcher` sets `build.service_name`
//! - `MONOKEL_RUNTIME__HEARTBEAT_SECS=10` sets `runtime.heartbeat_secs`
//!
//! `MONOKEL_CONFIG` points at the settings file itself.
//!
//! The same file is read twice: as raw text by the packaging stage, which
//! only looks at the `paths` lists, and through figment at runtime.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{MonokelError, MonokelResult};

/// Directory holding the settings file.
pub const CONFIG_DIR: &str = ".monokel";

/// Settings file name inside [`CONFIG_DIR`].
pub const SETTINGS_FILE: &str = "settings.toml";

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "MONOKEL_CONFIG";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Packaging defaults
    #[serde(default)]
    pub build: BuildConfig,

    /// Runtime loop settings
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Watch list
    #[serde(default)]
    pub watchers: Vec<WatcherConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `resolver = "trace"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BuildConfig {
    /// Name of the compose service
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Compose schema version token
    #[serde(default = "default_compose_version")]
    pub compose_version: String,

    /// Output directory for the package
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Custom compose template (embedded template when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RuntimeConfig {
    /// Seconds between "still running" log lines
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

/// One `[[watchers]]` entry.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatcherConfig {
    /// Host paths to watch
    #[serde(default)]
    pub paths: Vec<String>,

    /// Name of the registered event handler
    #[serde(default = "default_handler")]
    pub handler: String,

    /// Watch subdirectories as well
    #[serde(default)]
    pub recursive: bool,
}

/// A validated `(path, handler, recursive)` registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub declared_path: String,
    pub handler: String,
    pub recursive: bool,
}

/// Validated watch configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    targets: Vec<WatchTarget>,
}

impl WatchConfig {
    /// Validate `watchers` into targets.
    ///
    /// `source_name` names the configuration in errors; `is_registered`
    /// answers whether a handler name can be used.
    pub fn validate(
        source_name: &str,
        watchers: &[WatcherConfig],
        is_registered: impl Fn(&str) -> bool,
    ) -> MonokelResult<Self> {
        if watchers.is_empty() {
            return Err(MonokelError::config(
                source_name,
                "'watchers' entry missing or having no value",
            ));
        }

        let mut targets = Vec::new();
        for (index, watcher) in watchers.iter().enumerate() {
            if watcher.paths.is_empty() {
                return Err(MonokelError::config(
                    source_name,
                    format!("watcher #{} declares no paths", index + 1),
                ));
            }
            if !is_registered(&watcher.handler) {
                return Err(MonokelError::config(
                    source_name,
                    format!(
                        "watcher #{} uses unknown handler '{}'",
                        index + 1,
                        watcher.handler
                    ),
                ));
            }
            for path in &watcher.paths {
                crate::mount::validate_host_path(source_name, path)?;
                targets.push(WatchTarget {
                    declared_path: path.clone(),
                    handler: watcher.handler.clone(),
                    recursive: watcher.recursive,
                });
            }
        }

        Ok(Self { targets })
    }

    pub fn targets(&self) -> &[WatchTarget] {
        &self.targets
    }
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_service_name() -> String {
    "monokel".to_string()
}
fn default_compose_version() -> String {
    "3.0".to_string()
}
fn default_output() -> PathBuf {
    PathBuf::from("build")
}
fn default_heartbeat_secs() -> u64 {
    60
}
fn default_handler() -> String {
    "log".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            logging: LoggingConfig::default(),
            build: BuildConfig::default(),
            runtime: RuntimeConfig::default(),
            watchers: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            compose_version: default_compose_version(),
            output: default_output(),
            template: None,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

impl Settings {
    /// Locate the settings file.
    ///
    /// Precedence: explicit path, `MONOKEL_CONFIG`, the nearest
    /// `.monokel/settings.toml` above the current directory, and finally
    /// `.monokel/settings.toml` relative to the current directory.
    pub fn locate(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        Self::find_workspace_config().unwrap_or_else(|| Path::new(CONFIG_DIR).join(SETTINGS_FILE))
    }

    /// Find the nearest `.monokel/settings.toml`, searching upward.
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let candidate = ancestor.join(CONFIG_DIR).join(SETTINGS_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        None
    }

    /// Load settings from `path`, layering defaults, the file and
    /// `MONOKEL_` environment variables. A missing file yields defaults.
    pub fn load_from(path: impl AsRef<Path>) -> MonokelResult<Self> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(
                Env::prefixed("MONOKEL_")
                    .ignore(&["CONFIG", "LOG"])
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
            .map_err(|e| MonokelError::Settings(Box::new(e)))
    }

    /// Like [`Settings::load_from`] but the file has to exist.
    pub fn load_required(path: impl AsRef<Path>) -> MonokelResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(MonokelError::config(
                path.display().to_string(),
                format!("settings file not found (run 'monokel init' or set {CONFIG_ENV})"),
            ));
        }
        Self::load_from(path)
    }

    /// Validate the `[[watchers]]` list.
    pub fn watch_config(
        &self,
        source_name: &str,
        is_registered: impl Fn(&str) -> bool,
    ) -> MonokelResult<WatchConfig> {
        WatchConfig::validate(source_name, &self.watchers, is_registered)
    }

    /// Save current configuration to file.
    pub fn save(&self, path: impl AsRef<Path>) -> MonokelResult<()> {
        let path = path.as_ref();
        write_with_parents(path, &self.to_toml()?)
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> MonokelResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| MonokelError::config("settings", format!("cannot serialize: {e}")))
    }

    /// Write the commented starter settings file.
    pub fn init_config_file(path: &Path, force: bool) -> MonokelResult<()> {
        if !force && path.exists() {
            return Err(MonokelError::config(
                path.display().to_string(),
                "configuration file already exists, use --force to overwrite",
            ));
        }
        write_with_parents(path, DEFAULT_SETTINGS)
    }
}

fn write_with_parents(path: &Path, contents: &str) -> MonokelResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MonokelError::io(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| MonokelError::io(path, e))
}

/// Starter settings written by `monokel init`.
pub const DEFAULT_SETTINGS: &str = r#"# Monokel settings
#
# `monokel build` reads the `paths` lists below as plain text to set up one
# bind mount per directory; keep them as arrays of quoted absolute paths.

version = 1

[logging]
default = "info"

[logging.modules]
# resolver = "debug"

[build]
service_name = "monokel"
compose_version = "3.0"
output = "build"

[runtime]
heartbeat_secs = 60

# Multiple paths can share the same handler.
[[watchers]]
paths = ["/temp", "/foo"]
# Optional, defaults to false
recursive = true
# Registered handler name, defaults to "log"
handler = "log"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.build.service_name, "monokel");
        assert_eq!(settings.build.compose_version, "3.0");
        assert_eq!(settings.runtime.heartbeat_secs, 60);
        assert!(settings.watchers.is_empty());
    }

    #[test]
    fn test_default_settings_file_parses_and_extracts() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        Settings::init_config_file(&path, false).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.watchers.len(), 1);
        assert_eq!(settings.watchers[0].paths, vec!["/temp", "/foo"]);
        assert!(settings.watchers[0].recursive);
        assert_eq!(settings.watchers[0].handler, "log");

        let text = fs::read_to_string(&path).unwrap();
        let extracted = crate::mount::PathExtractor::new()
            .extract("settings.toml", &text)
            .unwrap();
        assert_eq!(extracted.len(), 2);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".monokel/settings.toml");
        Settings::init_config_file(&path, false).unwrap();
        assert!(Settings::init_config_file(&path, false).is_err());
        Settings::init_config_file(&path, true).unwrap();
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
[build]
service_name = "watcher"

[[watchers]]
paths = ["/srv"]
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.build.service_name, "watcher");
        assert_eq!(settings.build.compose_version, "3.0");
        assert_eq!(settings.watchers[0].handler, "log");
        assert!(!settings.watchers[0].recursive);
    }

    #[test]
    fn test_save_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/settings.toml");

        let mut settings = Settings::default();
        settings.runtime.heartbeat_secs = 5;
        settings.watchers.push(WatcherConfig {
            paths: vec!["/temp".to_string()],
            handler: "log".to_string(),
            recursive: true,
        });
        settings.save(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.runtime.heartbeat_secs, 5);
        assert_eq!(loaded.watchers, settings.watchers);
    }

    #[test]
    fn test_load_required_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = Settings::load_required(temp_dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, MonokelError::ConfigStructure { .. }));
    }

    #[test]
    fn test_watch_config_validation() {
        let known = |name: &str| name == "log";
        let watcher = |paths: &[&str], handler: &str| WatcherConfig {
            paths: paths.iter().map(|s| s.to_string()).collect(),
            handler: handler.to_string(),
            recursive: false,
        };

        let config = WatchConfig::validate(
            "test",
            &[watcher(&["/temp", "/foo"], "log")],
            known,
        )
        .unwrap();
        assert_eq!(config.targets().len(), 2);
        assert_eq!(config.targets()[0].declared_path, "/temp");

        assert!(WatchConfig::validate("test", &[], known).is_err());
        assert!(WatchConfig::validate("test", &[watcher(&[], "log")], known).is_err());
        assert!(
            WatchConfig::validate("test", &[watcher(&["/temp"], "nope")], known).is_err()
        );
        assert!(
            WatchConfig::validate("test", &[watcher(&["temp"], "log")], known).is_err()
        );
    }
}
