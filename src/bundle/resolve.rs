//! Canonical bundle form and translation merge.

use std::collections::HashMap;

use serde_json::Value;

use crate::bundle::i18n_file::TranslationMap;
use crate::bundle::{JavaScriptMessageBundle, PackageJsonMessageBundle};

/// A bundle reduced to plain keys plus a key -> message lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMessageBundle {
    pub keys: Vec<String>,
    pub messages: Vec<String>,
    pub map: HashMap<String, String>,
}

/// Output of a translation merge together with the soft problems found.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalizedMessages<T> {
    pub messages: T,
    pub problems: Vec<String>,
}

/// Canonicalize a bundle.
///
/// Returns `None` when the bundle's key and message lists differ in length.
/// Duplicate keys are not an error: the last message for a key wins in `map`.
pub fn resolve_message_bundle(bundle: &JavaScriptMessageBundle) -> Option<ResolvedMessageBundle> {
    if bundle.messages.len() != bundle.keys.len() {
        return None;
    }

    let keys: Vec<String> = bundle.keys.iter().map(|k| k.key().to_string()).collect();
    let map = keys
        .iter()
        .cloned()
        .zip(bundle.messages.iter().cloned())
        .collect();

    Some(ResolvedMessageBundle {
        keys,
        messages: bundle.messages.clone(),
        map,
    })
}

fn missing_key(key: &str) -> String {
    format!("No localized message found for key {key}")
}

/// Produce the translated message array of a resolved bundle.
///
/// Keys without a translation fall back to the source message. A problem is
/// recorded for each of them only when `translations` was supplied.
pub fn localize_messages(
    resolved: &ResolvedMessageBundle,
    translations: Option<&TranslationMap>,
) -> LocalizedMessages<Vec<String>> {
    let mut problems = Vec::new();
    let messages = resolved
        .keys
        .iter()
        .map(|key| {
            if let Some(translated) = translations.and_then(|t| t.get(key)) {
                return translated.clone();
            }
            if translations.is_some() {
                problems.push(missing_key(key));
            }
            resolved.map.get(key).cloned().unwrap_or_default()
        })
        .collect();

    LocalizedMessages { messages, problems }
}

/// Message text of a `package.nls.json` value.
fn package_message(value: &Value) -> Value {
    match value {
        Value::Object(obj) => obj.get("message").cloned().unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

/// Produce a translated `package.nls.json` object, keeping key order.
pub fn localize_package_messages(
    bundle: &PackageJsonMessageBundle,
    translations: Option<&TranslationMap>,
) -> LocalizedMessages<PackageJsonMessageBundle> {
    let mut problems = Vec::new();
    let mut messages = PackageJsonMessageBundle::new();

    for (key, value) in bundle {
        let localized = match translations.and_then(|t| t.get(key)) {
            Some(translated) => Value::String(translated.clone()),
            None => {
                if translations.is_some() {
                    problems.push(missing_key(key));
                }
                package_message(value)
            }
        };
        messages.insert(key.clone(), localized);
    }

    LocalizedMessages { messages, problems }
}
