//! Message bundles: the per-file artifacts the analyzer extracts and the
//! translated files built from them.
//!
//! - `resolve`: canonicalize bundles and merge them with translations
//! - `i18n_file`: locate and read `.i18n.json` translation files
//! - `metadata`: bundle per-file metadata into one fingerprinted manifest

pub mod i18n_file;
pub mod metadata;
pub mod resolve;

use serde::{Deserialize, Serialize};

pub use i18n_file::{TranslationMap, localized_file_path, read_localized_messages, strip_comments};
pub use metadata::{MetadataAccumulator, MetadataBundle, MetadataHeader};
pub use resolve::{
    LocalizedMessages, ResolvedMessageBundle, localize_messages, localize_package_messages,
    resolve_message_bundle,
};

/// The key of one message: a bare string, or a key with translator comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyInfo {
    Key(String),
    Commented {
        key: String,
        #[serde(default)]
        comment: Vec<String>,
    },
}

impl KeyInfo {
    pub fn key(&self) -> &str {
        match self {
            Self::Key(key) => key,
            Self::Commented { key, .. } => key,
        }
    }
}

impl From<&str> for KeyInfo {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

/// Messages extracted from one source file, index-aligned with their keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaScriptMessageBundle {
    pub messages: Vec<String>,
    pub keys: Vec<KeyInfo>,
}

impl JavaScriptMessageBundle {
    /// Append a message and return its index.
    pub fn push(&mut self, key: KeyInfo, message: String) -> usize {
        self.keys.push(key);
        self.messages.push(message);
        self.messages.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.keys.is_empty()
    }
}

/// Flat key -> message object, as found in `package.nls.json`.
///
/// Values are either a message string or `{ "message": ..., "comment": [...] }`.
pub type PackageJsonMessageBundle = serde_json::Map<String, serde_json::Value>;

/// Contents of a `<file>.nls.metadata.json` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFile {
    pub messages: Vec<String>,
    pub keys: Vec<KeyInfo>,
    pub file_path: String,
}

impl MetadataFile {
    pub fn new(bundle: JavaScriptMessageBundle, file_path: impl Into<String>) -> Self {
        Self {
            messages: bundle.messages,
            keys: bundle.keys,
            file_path: file_path.into(),
        }
    }

    pub fn bundle(&self) -> JavaScriptMessageBundle {
        JavaScriptMessageBundle {
            messages: self.messages.clone(),
            keys: self.keys.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::bundle::*;

    #[test]
    fn test_key_info_serializes_untagged() {
        let keys = vec![
            KeyInfo::from("plain"),
            KeyInfo::Commented {
                key: "withComment".to_string(),
                comment: vec!["c".to_string()],
            },
        ];
        assert_eq!(
            serde_json::to_value(&keys).unwrap(),
            json!(["plain", { "key": "withComment", "comment": ["c"] }])
        );
    }

    #[test]
    fn test_key_info_comment_defaults_to_empty() {
        let key: KeyInfo = serde_json::from_value(json!({ "key": "k" })).unwrap();
        assert_eq!(
            key,
            KeyInfo::Commented {
                key: "k".to_string(),
                comment: vec![]
            }
        );
        assert_eq!(key.key(), "k");
    }

    #[test]
    fn test_metadata_file_uses_camel_case() {
        let mut bundle = JavaScriptMessageBundle::default();
        assert_eq!(bundle.push(KeyInfo::from("a"), "A".to_string()), 0);
        let file = MetadataFile::new(bundle, "out/main");
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            json!({ "messages": ["A"], "keys": ["a"], "filePath": "out/main" })
        );
    }
}
