//! Placeholder substitution for manifest templates.
//!
//! Block placeholders must stand alone on their line; each inserted item is
//! written as a `- item` line using the placeholder's own indentation.
//! Inline placeholders are replaced in place.

use std::path::Path;

use regex::{Captures, Regex};

use crate::error::{MonokelError, MonokelResult};

pub const VOLUMES: &str = "{VOLUMES}";
pub const ENVIRONMENT: &str = "{ENVIRONMENT}";
pub const SERVICE: &str = "{SERVICE}";
pub const COMPOSE_VERSION: &str = "{COMPOSE_VERSION}";

/// Every placeholder a manifest template has to contain.
pub const REQUIRED_PLACEHOLDERS: [&str; 4] = [VOLUMES, ENVIRONMENT, SERVICE, COMPOSE_VERSION];

const EMBEDDED_COMPOSE: &str = include_str!("templates/docker-compose.yml");

/// Manifest template text.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    text: String,
}

impl Template {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// The compose template shipped with the binary.
    pub fn embedded() -> Self {
        Self::new("embedded docker-compose.yml", EMBEDDED_COMPOSE)
    }

    pub fn from_file(path: &Path) -> MonokelResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| MonokelError::io(path, e))?;
        Ok(Self::new(path.display().to_string(), text))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Check that every required placeholder is present.
    pub fn validate(&self) -> MonokelResult<()> {
        for placeholder in REQUIRED_PLACEHOLDERS {
            if !self.text.contains(placeholder) {
                return Err(MonokelError::template(
                    placeholder,
                    format!("missing from {}", self.name),
                ));
            }
        }
        for placeholder in [VOLUMES, ENVIRONMENT] {
            block_indent(&self.text, placeholder)?;
        }
        Ok(())
    }
}

/// Leading whitespace of the first line holding only `placeholder`.
pub fn block_indent(text: &str, placeholder: &str) -> MonokelResult<String> {
    let pattern = block_pattern(placeholder)?;
    match pattern.captures(text) {
        Some(caps) => Ok(caps[1].to_string()),
        None if text.contains(placeholder) => Err(MonokelError::template(
            placeholder,
            "must stand alone on its own line",
        )),
        None => Err(MonokelError::template(placeholder, "missing from template")),
    }
}

/// Replace each line holding only `placeholder` with one `- item` line per
/// item, indented like the placeholder. No items removes the line.
pub fn substitute_block(text: &str, placeholder: &str, items: &[String]) -> MonokelResult<String> {
    // fails early with the precise reason
    block_indent(text, placeholder)?;

    let pattern = block_pattern(placeholder)?;
    let replaced = pattern.replace_all(text, |caps: &Captures<'_>| {
        if items.is_empty() {
            return String::new();
        }
        let indent = &caps[1];
        let line_end = &caps[2];
        let lines: Vec<String> = items.iter().map(|item| format!("{indent}- {item}")).collect();
        format!("{}{line_end}", lines.join("\n"))
    });

    Ok(replaced.into_owned())
}

/// Replace every occurrence of `placeholder` with `value`.
pub fn substitute_inline(text: &str, placeholder: &str, value: &str) -> MonokelResult<String> {
    if !text.contains(placeholder) {
        return Err(MonokelError::template(placeholder, "missing from template"));
    }
    Ok(text.replace(placeholder, value))
}

fn block_pattern(placeholder: &str) -> MonokelResult<Regex> {
    let pattern = format!(r"(?m)^([ \t]*){}[ \t]*(\r?\n|$)", regex::escape(placeholder));
    Regex::new(&pattern).map_err(|e| MonokelError::template(placeholder, e.to_string()))
}
