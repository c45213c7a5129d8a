//! Compose manifest rendering from mount entries.

use crate::error::{MonokelError, MonokelResult};
use crate::mount::{CONTAINER_ENV, MountEntry, PROJECT_ENV};

use super::template::{
    COMPOSE_VERSION, ENVIRONMENT, SERVICE, Template, VOLUMES, substitute_block, substitute_inline,
};

/// Accepted compose schema version tokens.
pub const COMPOSE_VERSIONS: [&str; 9] = [
    "3.0", "3.1", "3.2", "3.3", "3.4", "3.5", "3.6", "3.7", "4.0",
];

/// Renders the volume and environment blocks of a deployment manifest.
#[derive(Debug, Clone)]
pub struct ManifestEmitter {
    template: Template,
}

impl ManifestEmitter {
    pub fn new(template: Template) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Render the manifest text.
    ///
    /// Nothing is written here; a validation failure leaves no partial
    /// output anywhere.
    pub fn render(
        &self,
        entries: &[MountEntry],
        service_name: &str,
        compose_version: &str,
    ) -> MonokelResult<String> {
        validate_service_name(service_name)?;
        if !COMPOSE_VERSIONS.contains(&compose_version) {
            return Err(MonokelError::config(
                "compose version",
                format!(
                    "'{compose_version}' is not one of {}",
                    COMPOSE_VERSIONS.join(", ")
                ),
            ));
        }
        self.template.validate()?;

        // Inline tokens first so that host paths are never scanned for them.
        let text = substitute_inline(self.template.text(), SERVICE, service_name)?;
        let text = substitute_inline(&text, COMPOSE_VERSION, compose_version)?;
        let text = substitute_block(&text, VOLUMES, &volume_lines(entries))?;
        let text = substitute_block(&text, ENVIRONMENT, &environment_lines(entries))?;

        crate::debug_event!(
            "manifest",
            "rendered",
            "{} volume(s) for service '{service_name}'",
            entries.len()
        );

        Ok(text)
    }
}

impl Default for ManifestEmitter {
    fn default() -> Self {
        Self::new(Template::embedded())
    }
}

/// One `host_path:/identifier` item per entry.
pub fn volume_lines(entries: &[MountEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| yaml_scalar(&escape_interpolation(&e.volume())))
        .collect()
}

/// Container sentinel, one `MOUNT_<identifier>=host_path` per entry, then
/// the project identity passed through from the deploying shell.
pub fn environment_lines(entries: &[MountEntry]) -> Vec<String> {
    let mut lines = Vec::with_capacity(entries.len() + 2);
    lines.push(format!("{CONTAINER_ENV}=1"));
    lines.extend(
        entries
            .iter()
            .map(|e| yaml_scalar(&escape_interpolation(&e.env_declaration()))),
    );
    lines.push(PROJECT_ENV.to_string());
    lines
}

fn validate_service_name(name: &str) -> MonokelResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(MonokelError::config(
            "service name",
            format!("'{name}' may only contain letters, digits, '-', '_' and '.'"),
        ))
    }
}

/// Compose substitutes `$VAR` and `${VAR}`; `$$` is a literal `$`.
fn escape_interpolation(value: &str) -> String {
    value.replace('$', "$$")
}

/// Double-quote values a YAML plain scalar would misread.
fn yaml_scalar(value: &str) -> String {
    let needs_quotes = value.contains(" #")
        || value.contains(": ")
        || value.contains(['"', '\\', '\''])
        || value.ends_with(' ');
    if needs_quotes {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
