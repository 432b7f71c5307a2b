//! Translated message files (`<root>/<language>/[component/]<file>.i18n.json`).

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;

/// Key -> translated message.
pub type TranslationMap = HashMap<String, String>;

/// Matches a double-quoted JSON string, a block comment, or a line comment.
static COMMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"("(?:[^"\\]|\\.)*")|/\*(?s:.*?)\*/|//[^\r\n]*"#).unwrap()
});

/// Remove `/* */` and `//` comments, leaving string contents untouched.
pub fn strip_comments(text: &str) -> String {
    COMMENT_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            caps.get(1).map_or(String::new(), |m| m.as_str().to_string())
        })
        .into_owned()
}

/// Path of the translation file for `filename` in a language folder.
pub fn localized_file_path(
    root: &Path,
    language_folder: &str,
    component_path: Option<&str>,
    filename: &str,
) -> PathBuf {
    let mut path = root.join(language_folder);
    if let Some(component) = component_path.filter(|c| !c.is_empty()) {
        path.push(component);
    }
    path.push(format!("{filename}.i18n.json"));
    path
}

/// Read a translation file.
///
/// A missing file is `Ok(None)`. A file that is empty or not a JSON object is
/// logged and also treated as absent. Non-string values are ignored.
pub fn read_localized_messages(path: &Path) -> Result<Option<TranslationMap>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("no localized messages at {}", path.display());
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    let stripped = strip_comments(content.trim_start_matches('\u{feff}'));
    if stripped.trim().is_empty() {
        warn!("localized message file {} is empty", path.display());
        return Ok(None);
    }

    match serde_json::from_str::<Value>(&stripped) {
        Ok(Value::Object(obj)) => Ok(Some(
            obj.into_iter()
                .filter_map(|(key, value)| match value {
                    Value::String(message) => Some((key, message)),
                    _ => None,
                })
                .collect(),
        )),
        Ok(_) => {
            warn!(
                "localized message file {} is not a JSON object",
                path.display()
            );
            Ok(None)
        }
        Err(err) => {
            warn!(
                "failed to parse localized message file {}: {}",
                path.display(),
                err
            );
            Ok(None)
        }
    }
}
