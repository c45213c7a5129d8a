use anyhow::{Context, Result};
use clap::Parser;

use monokel::Settings;
use monokel::cli::commands::build::BuildOverrides;
use monokel::cli::{Cli, Commands, commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = Settings::locate(cli.config.as_deref());
    let verbosity = cli.verbosity.as_deref();

    match cli.command {
        Commands::Init { force } => {
            monokel::logging::init_with_config(&Settings::default().logging, verbosity);
            commands::init::run_init(&config_path, force)
        }

        Commands::Config => {
            let settings = Settings::load_from(&config_path)?;
            monokel::logging::init_with_config(&settings.logging, verbosity);
            commands::init::run_config(&settings, &config_path)
        }

        Commands::Build {
            service_name,
            compose_version,
            output,
            template,
        } => {
            let settings = Settings::load_required(&config_path)?;
            monokel::logging::init_with_config(&settings.logging, verbosity);
            let overrides = BuildOverrides {
                service_name,
                compose_version,
                output,
                template,
            };
            commands::build::run_build(&settings, &config_path, overrides)
        }

        Commands::Mounts { json } => {
            let settings = Settings::load_required(&config_path)?;
            monokel::logging::init_with_config(&settings.logging, verbosity);
            commands::build::run_mounts(&config_path, json)
        }

        Commands::Resolve { path, revert } => {
            let settings = Settings::load_from(&config_path)?;
            monokel::logging::init_with_config(&settings.logging, verbosity);
            commands::resolve::run_resolve(&path, revert)
        }

        Commands::Run => {
            let settings = Settings::load_required(&config_path)?;
            monokel::logging::init_with_config(&settings.logging, verbosity);

            let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        let _ = shutdown_tx.send(());
                    }
                    Err(e) => tracing::error!("[runtime] cannot listen for Ctrl-C: {e}"),
                }
            });

            tokio::task::spawn_blocking(move || {
                commands::run::run_watch(&settings, &config_path, shutdown_rx)
            })
            .await
            .context("watcher task failed")?
        }
    }
}
