//! Watch path extraction from raw configuration text.
//!
//! The configuration is never executed or fully parsed here. The supported
//! subset is a key followed by a bracketed, comma-separated list of quoted
//! strings:
//!
//! ```text
//! paths = ["/temp", '/foo']          # TOML
//! "paths": [ "/temp",
//!            "/foo" ],               # dict / JSON style
//! paths: ['/temp']                   # YAML flow style
//! ```
//!
//! A key inside a `#` comment or a quoted string is not an opener.
//! Whitespace, newlines and `#` comments inside the list are skipped, and a
//! trailing comma is accepted. Double-quoted items have TOML basic-string
//! escapes decoded; single-quoted items are taken literally. Anything else
//! inside a list is rejected.

use std::collections::BTreeSet;
use std::str::CharIndices;

use regex::Regex;

use crate::error::{MonokelError, MonokelResult};

/// Key holding the list of watched paths.
pub const WATCH_LIST_KEY: &str = "paths";

/// Pattern extractor for declared watch paths.
#[derive(Debug, Clone)]
pub struct PathExtractor {
    key: String,
    /// Matches `<key> <:|=> [` up to and including the opening bracket.
    /// Group 1 starts at the key.
    opener: Regex,
}

impl PathExtractor {
    /// Extractor for the default `paths` key.
    pub fn new() -> Self {
        Self::with_key(WATCH_LIST_KEY)
    }

    /// Extractor for a custom watch-list key.
    pub fn with_key(key: &str) -> Self {
        let pattern = format!(
            r#"(?:^|[\s{{,])(["']?{}["']?\s*[:=]\s*\[)"#,
            regex::escape(key)
        );
        let opener = Regex::new(&pattern).expect("escaped watch-list key is a valid pattern");
        Self {
            key: key.to_string(),
            opener,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Extract the deduplicated set of host paths declared in `text`.
    ///
    /// Every occurrence of the key contributes to the set. A missing key
    /// yields an empty set; whether that is fatal is up to the caller.
    /// `source_name` only appears in error messages.
    pub fn extract(&self, source_name: &str, text: &str) -> MonokelResult<BTreeSet<String>> {
        let mut paths = BTreeSet::new();

        for caps in self.opener.captures_iter(text) {
            let Some(opener) = caps.get(1) else {
                continue;
            };
            if is_commented_or_quoted(text, opener.start()) {
                continue;
            }
            self.read_list(source_name, text, opener.end(), &mut paths)?;
        }

        tracing::debug!(
            "[extract] {} path(s) under `{}` in {source_name}",
            paths.len(),
            self.key
        );

        Ok(paths)
    }

    /// Read one list whose body starts at byte offset `start`.
    fn read_list(
        &self,
        source_name: &str,
        text: &str,
        start: usize,
        paths: &mut BTreeSet<String>,
    ) -> MonokelResult<()> {
        let body = &text[start..];
        let mut chars = body.char_indices();
        let mut expect_item = true;

        while let Some((offset, c)) = chars.next() {
            match c {
                c if c.is_whitespace() => {}
                '#' => {
                    for (_, c) in chars.by_ref() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                ']' => return Ok(()),
                ',' if !expect_item => expect_item = true,
                '"' | '\'' if expect_item => {
                    let mut literal = String::new();
                    let mut closed = false;
                    while let Some((at, next)) = chars.next() {
                        if next == c {
                            closed = true;
                            break;
                        }
                        if next == '\\' && c == '"' {
                            let decoded = unescape(&mut chars).map_err(|reason| {
                                self.malformed(source_name, text, start + at, &reason)
                            })?;
                            literal.push(decoded);
                            continue;
                        }
                        literal.push(next);
                    }
                    if !closed {
                        return Err(self.malformed(
                            source_name,
                            text,
                            start + offset,
                            "unterminated string literal",
                        ));
                    }
                    validate_host_path(source_name, &literal)?;
                    paths.insert(literal);
                    expect_item = false;
                }
                other => {
                    let reason = if expect_item {
                        format!("expected a quoted path, found '{other}'")
                    } else {
                        format!("expected ',' or ']', found '{other}'")
                    };
                    return Err(self.malformed(source_name, text, start + offset, &reason));
                }
            }
        }

        Err(self.malformed(source_name, text, start, "list is never closed with ']'"))
    }

    fn malformed(&self, source_name: &str, text: &str, at: usize, reason: &str) -> MonokelError {
        let line = text[..at].matches('\n').count() + 1;
        MonokelError::config(
            source_name,
            format!("`{}` list at line {line}: {reason}", self.key),
        )
    }
}

impl Default for PathExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether byte offset `at` lies in a `#` comment or a quoted string of
/// its line.
fn is_commented_or_quoted(text: &str, at: usize) -> bool {
    let line_start = text[..at].rfind('\n').map_or(0, |i| i + 1);
    let mut quote = None;
    let mut chars = text[line_start..at].chars();

    while let Some(c) = chars.next() {
        match quote {
            Some('"') if c == '\\' => {
                chars.next();
            }
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '#' => return true,
            None if c == '"' || c == '\'' => quote = Some(c),
            None => {}
        }
    }

    quote.is_some()
}

/// Decode one basic-string escape; the backslash is already consumed.
fn unescape(chars: &mut CharIndices<'_>) -> Result<char, String> {
    let Some((_, c)) = chars.next() else {
        return Err("unterminated escape sequence".to_string());
    };
    let digits = match c {
        'b' => return Ok('\u{8}'),
        't' => return Ok('\t'),
        'n' => return Ok('\n'),
        'f' => return Ok('\u{c}'),
        'r' => return Ok('\r'),
        'e' => return Ok('\u{1b}'),
        '"' => return Ok('"'),
        '\\' => return Ok('\\'),
        'u' => 4,
        'U' => 8,
        other => return Err(format!("invalid escape sequence '\\{other}'")),
    };

    let hex: String = chars.by_ref().take(digits).map(|(_, c)| c).collect();
    if hex.len() != digits || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("invalid unicode escape '\\{c}{hex}'"));
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("'\\{c}{hex}' is not a unicode scalar value"))
}

/// Reject strings that cannot be bind-mounted verbatim.
pub(crate) fn validate_host_path(source_name: &str, path: &str) -> MonokelResult<()> {
    if path.is_empty() {
        return Err(MonokelError::config(source_name, "empty watch path"));
    }
    if !path.starts_with('/') {
        return Err(MonokelError::config(
            source_name,
            format!("watch path '{path}' is not absolute"),
        ));
    }
    // ':' separates host and container in a volume entry
    if path.contains(':') || path.chars().any(char::is_control) {
        return Err(MonokelError::config(
            source_name,
            format!("watch path '{path}' contains characters unusable in a volume entry"),
        ));
    }
    Ok(())
}
