//! `.url` link files: a flat `[InternetShortcut]` key/value block.

use std::collections::HashSet;

const SECTION: &str = "InternetShortcut";
const KEY_BASE_URL: &str = "BaseURL";
const KEY_ICON_FILE: &str = "IconFile";
const KEY_TYPE: &str = "Type";
const KEY_URL: &str = "URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortcutKind {
    /// Points at a built-in application.
    System,
    #[default]
    User,
}

impl ShortcutKind {
    fn as_str(self) -> &'static str {
        match self {
            ShortcutKind::System => "System",
            ShortcutKind::User => "User",
        }
    }
}

/// Decoded contents of a link file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShortcutRecord {
    /// Process identifier that opens the target.
    pub base_url: String,
    pub icon_file: String,
    /// Target path or URL handed to the process.
    pub url: String,
    pub kind: ShortcutKind,
}

pub fn encode(record: &ShortcutRecord) -> String {
    format!(
        "[{SECTION}]\n{KEY_BASE_URL}={}\n{KEY_ICON_FILE}={}\n{KEY_TYPE}={}\n{KEY_URL}={}\n",
        quote(&record.base_url),
        quote(&record.icon_file),
        record.kind.as_str(),
        quote(&record.url)
    )
}

/// Values that would not survive a line-based parse are written as JSON strings.
fn quote(value: &str) -> String {
    let unsafe_value = value.contains(['=', '"', '\r', '\n'])
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);
    if !unsafe_value {
        return value.to_string();
    }
    serde_json::to_string(value).unwrap_or_default()
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        if let Ok(unquoted) = serde_json::from_str::<String>(value) {
            return unquoted;
        }
    }
    value.to_string()
}

/// Parse link file contents.
///
/// An explicit `Type` wins; otherwise a record whose process is in `system_processes`
/// is classified as [`ShortcutKind::System`]. Unknown keys and other sections are ignored.
pub fn decode(contents: &str, system_processes: &HashSet<String>) -> ShortcutRecord {
    let mut record = ShortcutRecord::default();
    let mut explicit_kind = None;
    let mut in_section = false;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(section) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            in_section = section.trim() == SECTION;
            continue;
        }
        if !in_section {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = unquote(value.trim());
        match key.trim() {
            KEY_BASE_URL => record.base_url = value,
            KEY_ICON_FILE => record.icon_file = value,
            KEY_URL => record.url = value,
            KEY_TYPE => {
                explicit_kind = match value.as_str() {
                    "System" => Some(ShortcutKind::System),
                    "User" => Some(ShortcutKind::User),
                    _ => None,
                }
            }
            _ => {}
        }
    }

    record.kind = explicit_kind.unwrap_or(if system_processes.contains(&record.base_url) {
        ShortcutKind::System
    } else {
        ShortcutKind::User
    });
    record
}

pub fn decode_bytes(contents: &[u8], system_processes: &HashSet<String>) -> ShortcutRecord {
    decode(&String::from_utf8_lossy(contents), system_processes)
}
