//! Declarative metadata read from a script's leading documentation block.
//!
//! A script describes itself with colon-terminated keys in either its module
//! docstring or a run of `#` comments at the top of the file:
//!
//! ```text
//! """
//! Export Layers
//! Description: Writes every layer to GeoPackage
//! Toolbar: true
//! ToolbarLabel: Export
//! Validated: yes
//! """
//! ```
//!
//! Only the leading block is read. Later docstrings and comments are ignored,
//! and the script is never executed.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Metadata declared by a script about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptMetadata {
    /// Display title.
    pub title: String,
    /// Free-form description, empty if none was declared.
    pub description: String,
    /// Whether the script should be offered on the toolbar.
    pub toolbar: bool,
    /// Toolbar label. Only present when `toolbar` is set.
    pub toolbar_label: Option<String>,
    /// Author-declared "reviewed" marker.
    pub validated: bool,
}

/// Keys understood in the documentation block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Title,
    Description,
    Toolbar,
    ToolbarLabel,
    Validated,
}

impl Key {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "title" => Some(Self::Title),
            "description" | "descrição" | "descripción" => Some(Self::Description),
            "toolbar" => Some(Self::Toolbar),
            "toolbarlabel" => Some(Self::ToolbarLabel),
            "validated" => Some(Self::Validated),
            _ => None,
        }
    }
}

/// Parse the metadata of the script at `path` from its `source` text.
///
/// Never fails: missing keys fall back to defaults and a missing title falls
/// back to [`humanize_stem`] of the file name. Free lines after the title
/// become the description when no `Description:` key is given.
#[must_use]
pub fn parse_metadata(path: &Path, source: &str) -> ScriptMetadata {
    let mut title: Option<String> = None;
    let mut free_lines: Vec<&str> = Vec::new();
    let mut description: Option<String> = None;
    let mut toolbar: Option<bool> = None;
    let mut label: Option<String> = None;
    let mut validated: Option<bool> = None;

    let block = leading_block(source).unwrap_or_default();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line
            .split_once(':')
            .and_then(|(k, v)| Key::parse(k).map(|key| (key, clean_value(v))))
        else {
            free_lines.push(line);
            continue;
        };

        match key {
            Key::Title if title.is_none() && !value.is_empty() => title = Some(value),
            Key::Description if description.is_none() => description = Some(value),
            Key::Toolbar if toolbar.is_none() => toolbar = Some(parse_bool(path, "Toolbar", &value)),
            Key::ToolbarLabel if label.is_none() => label = Some(value),
            Key::Validated if validated.is_none() => {
                validated = Some(parse_bool(path, "Validated", &value));
            },
            _ => {},
        }
    }

    // Free lines not taken as the title stand in for a missing description.
    let mut prose = free_lines.into_iter();
    let title = title.or_else(|| prose.next().map(str::to_string));
    let description = description.unwrap_or_else(|| prose.collect::<Vec<_>>().join(" "));
    let title = title.unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .map_or_else(|| "Untitled".to_string(), humanize_stem)
    });
    let toolbar = toolbar.unwrap_or(false);
    let toolbar_label = toolbar.then(|| {
        label
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| title.clone())
    });

    ScriptMetadata {
        title,
        description,
        toolbar,
        toolbar_label,
        validated: validated.unwrap_or(false),
    }
}

/// Turn a file stem into a display name: `layers_example` becomes `Layers Example`.
#[must_use]
pub fn humanize_stem(stem: &str) -> String {
    stem.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Extract the text of the leading docstring or comment block.
fn leading_block(source: &str) -> Option<String> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut lines = source.lines().skip_while(|line| {
        let t = line.trim();
        t.is_empty() || t.starts_with("#!") || is_coding_cookie(t)
    });

    let first = lines.next()?.trim_start();

    if let Some((quote, rest)) = docstring_open(first) {
        if let Some(end) = rest.find(quote) {
            return Some(rest[..end].to_string());
        }
        let mut body = format!("{rest}\n");
        for line in lines {
            if let Some(end) = line.find(quote) {
                body.push_str(&line[..end]);
                return Some(body);
            }
            body.push_str(line);
            body.push('\n');
        }
        return Some(body);
    }

    if first.starts_with('#') {
        let mut body = vec![strip_comment_marker(first)];
        body.extend(
            lines
                .map(str::trim_start)
                .take_while(|l| l.starts_with('#'))
                .map(strip_comment_marker),
        );
        return Some(body.join("\n"));
    }

    None
}

/// Match a docstring opener, returning its delimiter and the text after it.
fn docstring_open(line: &str) -> Option<(&'static str, &str)> {
    let unprefixed = line
        .strip_prefix(['r', 'R', 'u', 'U'])
        .unwrap_or(line);
    ["\"\"\"", "'''"]
        .into_iter()
        .find_map(|quote| unprefixed.strip_prefix(quote).map(|rest| (quote, rest)))
}

fn is_coding_cookie(line: &str) -> bool {
    line.starts_with('#') && (line.contains("coding:") || line.contains("coding="))
}

fn strip_comment_marker(line: &str) -> String {
    let body = line.strip_prefix('#').unwrap_or(line);
    body.strip_prefix(' ').unwrap_or(body).to_string()
}

fn clean_value(raw: &str) -> String {
    raw.trim().trim_matches(['"', '\'']).trim().to_string()
}

fn parse_bool(path: &Path, key: &str, value: &str) -> bool {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => true,
        "false" | "no" | "0" => false,
        _ => {
            debug!(
                path = %path.display(),
                key,
                value,
                "Unrecognized boolean value, treating as false"
            );
            false
        },
    }
}
