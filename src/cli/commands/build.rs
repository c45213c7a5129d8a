//! Build and Mounts commands.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Settings;
use crate::package::{PackageOptions, build_package, plan_mounts};

/// CLI overrides for the `[build]` section.
#[derive(Debug, Default)]
pub struct BuildOverrides {
    pub service_name: Option<String>,
    pub compose_version: Option<String>,
    pub output: Option<PathBuf>,
    pub template: Option<PathBuf>,
}

/// Merge CLI overrides over the settings file.
pub fn package_options(
    settings: &Settings,
    config_path: &Path,
    overrides: BuildOverrides,
) -> PackageOptions {
    let build = &settings.build;
    PackageOptions {
        settings_path: config_path.to_path_buf(),
        output: overrides.output.unwrap_or_else(|| build.output.clone()),
        service_name: overrides
            .service_name
            .unwrap_or_else(|| build.service_name.clone()),
        compose_version: overrides
            .compose_version
            .unwrap_or_else(|| build.compose_version.clone()),
        template: overrides.template.or_else(|| build.template.clone()),
    }
}

/// Run build command - write the package directory.
pub fn run_build(settings: &Settings, config_path: &Path, overrides: BuildOverrides) -> Result<()> {
    let options = package_options(settings, config_path, overrides);
    let report = build_package(&options)?;

    println!(
        "Built service '{}' with {} mount(s) in {}",
        options.service_name,
        report.entries.len(),
        report.output.display()
    );
    for entry in &report.entries {
        println!("  {} -> {}", entry.host_path, entry.container_path());
    }
    println!(
        "Deploy with: cd {} && docker compose up -d --build",
        report.output.display()
    );
    Ok(())
}

/// Run mounts command - print the mapping without writing anything.
pub fn run_mounts(config_path: &Path, json: bool) -> Result<()> {
    let entries = plan_mounts(config_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!("{} -> {}", entry.host_path, entry.container_path());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_settings() {
        let mut settings = Settings::default();
        settings.build.service_name = "from-file".to_string();
        settings.build.template = Some(PathBuf::from("compose.tmpl"));

        let options = package_options(
            &settings,
            Path::new("settings.toml"),
            BuildOverrides {
                service_name: Some("from-cli".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(options.service_name, "from-cli");
        assert_eq!(options.compose_version, "3.0");
        assert_eq!(options.output, PathBuf::from("build"));
        assert_eq!(options.template, Some(PathBuf::from("compose.tmpl")));
    }
}
