//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Parser, Subcommand,
    builder::PossibleValuesParser,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::manifest::COMPOSE_VERSIONS;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const AFTER_HELP: &str = "\
Quick Start:
  $ monokel init                      # Write .monokel/settings.toml
  $ monokel mounts                    # Preview host -> container mounts
  $ monokel build -o build            # Write compose package
  $ monokel run                       # Watch configured paths";

/// Container-aware filesystem watcher
#[derive(Parser, Debug)]
#[command(
    name = "monokel",
    version = env!("CARGO_PKG_VERSION"),
    about = "Container-aware filesystem watcher",
    long_about = "Watch host directories from inside a container. The build step bind-mounts \
                  every configured path under a stable identifier; at runtime paths are \
                  translated between host and container form.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (overrides the settings file)
    #[arg(
        short,
        long,
        global = true,
        value_name = "LEVEL",
        value_parser = PossibleValuesParser::new(["error", "warn", "info", "debug", "trace"])
    )]
    pub verbosity: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .monokel directory with an example settings file")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    #[command(about = "Display effective settings")]
    Config,

    /// Build the deployment package
    #[command(about = "Write docker-compose.yml, Dockerfile and settings into a build directory")]
    Build {
        /// Name of the compose service (overrides config)
        #[arg(short, long)]
        service_name: Option<String>,

        /// Compose file version (overrides config)
        #[arg(long, value_parser = PossibleValuesParser::new(COMPOSE_VERSIONS))]
        compose_version: Option<String>,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compose template with {VOLUMES}, {ENVIRONMENT}, {SERVICE} and {COMPOSE_VERSION}
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// Preview mounts
    #[command(about = "Show the host -> container mounts the build would create")]
    Mounts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the watchers
    #[command(about = "Watch configured paths until interrupted")]
    Run,

    /// Resolve a path
    #[command(about = "Translate a path using the current environment's mounts")]
    Resolve {
        /// Path to translate
        path: String,

        /// Translate container -> host instead of host -> container
        #[arg(short, long)]
        revert: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_arguments() {
        let cli = Cli::try_parse_from([
            "monokel",
            "--config",
            "custom.toml",
            "build",
            "-s",
            "watcher",
            "--compose-version",
            "3.7",
            "-o",
            "out",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Build {
                service_name,
                compose_version,
                output,
                template,
            } => {
                assert_eq!(service_name.as_deref(), Some("watcher"));
                assert_eq!(compose_version.as_deref(), Some("3.7"));
                assert_eq!(output, Some(PathBuf::from("out")));
                assert!(template.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_compose_version() {
        assert!(Cli::try_parse_from(["monokel", "build", "--compose-version", "2.1"]).is_err());
    }

    #[test]
    fn test_global_verbosity_after_subcommand() {
        let cli = Cli::try_parse_from(["monokel", "resolve", "/temp", "--revert", "-v", "debug"])
            .unwrap();
        assert_eq!(cli.verbosity.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Commands::Resolve { revert: true, .. }));
    }
}
