//! Packaging stage: settings file in, deployable build directory out.
//!
//! The output directory receives the rendered compose manifest, a copy of
//! the settings file and a Dockerfile. Everything is validated and rendered
//! in memory first; each file is then written through a temporary file in
//! the output directory and renamed into place.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::SETTINGS_FILE;
use crate::error::{MonokelError, MonokelResult};
use crate::manifest::{DOCKERFILE, ManifestEmitter, Template};
use crate::mount::{MountEntry, PathExtractor, derive_entries};

/// Manifest file name in the output directory.
pub const MANIFEST_FILE: &str = "docker-compose.yml";

/// Dockerfile name in the output directory.
pub const DOCKERFILE_FILE: &str = "Dockerfile";

/// Inputs of [`build_package`].
#[derive(Debug, Clone)]
pub struct PackageOptions {
    pub settings_path: PathBuf,
    pub output: PathBuf,
    pub service_name: String,
    pub compose_version: String,
    /// Compose template file; the embedded template when `None`.
    pub template: Option<PathBuf>,
}

/// What [`build_package`] produced.
#[derive(Debug, Clone)]
pub struct PackageReport {
    pub output: PathBuf,
    pub entries: Vec<MountEntry>,
    pub files: Vec<PathBuf>,
}

/// Derive the mount entries for a settings file without writing anything.
///
/// Entries are ordered by host path. A settings file declaring no watch
/// paths is an error here, since the package would watch nothing.
pub fn plan_mounts(settings_path: &Path) -> MonokelResult<Vec<MountEntry>> {
    let text = read_settings(settings_path)?;
    mounts_from_text(&settings_path.display().to_string(), &text)
}

fn mounts_from_text(source_name: &str, text: &str) -> MonokelResult<Vec<MountEntry>> {
    let extractor = PathExtractor::new();
    let paths = extractor.extract(source_name, text)?;
    if paths.is_empty() {
        return Err(MonokelError::config(
            source_name,
            format!("no watch paths declared under `{}`", extractor.key()),
        ));
    }

    let entries = derive_entries(&paths)?;
    for entry in &entries {
        crate::debug_event!(
            "package",
            "mount",
            "{} -> {}",
            entry.host_path,
            entry.container_path()
        );
    }
    Ok(entries)
}

/// Build the package directory.
pub fn build_package(options: &PackageOptions) -> MonokelResult<PackageReport> {
    let source_name = options.settings_path.display().to_string();
    let settings_text = read_settings(&options.settings_path)?;

    let entries = mounts_from_text(&source_name, &settings_text)?;
    crate::log_event!(
        "package",
        "extracted",
        "{} watch path(s) from {source_name}",
        entries.len()
    );

    let template = match &options.template {
        Some(path) => Template::from_file(path)?,
        None => Template::embedded(),
    };
    let manifest = ManifestEmitter::new(template).render(
        &entries,
        &options.service_name,
        &options.compose_version,
    )?;

    let output = &options.output;
    std::fs::create_dir_all(output).map_err(|e| MonokelError::io(output, e))?;

    let files = vec![
        write_atomic(&output.join(MANIFEST_FILE), &manifest)?,
        write_atomic(&output.join(SETTINGS_FILE), &settings_text)?,
        write_atomic(&output.join(DOCKERFILE_FILE), DOCKERFILE)?,
    ];
    for file in &files {
        crate::log_event!("package", "wrote", "{}", file.display());
    }

    Ok(PackageReport {
        output: output.clone(),
        entries,
        files,
    })
}

fn read_settings(path: &Path) -> MonokelResult<String> {
    std::fs::read_to_string(path).map_err(|e| MonokelError::io(path, e))
}

/// Write `contents` to a temporary file next to `path`, then rename it.
fn write_atomic(path: &Path, contents: &str) -> MonokelResult<PathBuf> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = NamedTempFile::new_in(dir).map_err(|e| MonokelError::io(dir, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| MonokelError::io(file.path(), e))?;
    file.persist(path)
        .map_err(|e| MonokelError::io(path, e.error))?;

    Ok(path.to_path_buf())
}
