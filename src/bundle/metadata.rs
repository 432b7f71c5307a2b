//! Cross-file metadata manifest.
//!
//! Every processed file contributes one [`MetadataFile`]. Once all files are
//! in, [`MetadataAccumulator::finalize`] produces the `nls.metadata.json`
//! bundle keyed by file path and its `nls.metadata.header.json` companion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::bundle::{JavaScriptMessageBundle, MetadataFile};

/// File path -> bundle, sorted by path.
pub type MetadataBundle = BTreeMap<String, JavaScriptMessageBundle>;

pub const EXTENSION_BUNDLE_TYPE: &str = "extensionBundle";

/// Contents of `nls.metadata.header.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataHeader {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub hash: String,
    pub out_dir: String,
}

/// Collects per-file metadata. Adding the same path twice keeps the last one.
///
/// Not synchronized: callers adding from several threads wrap it in a mutex.
#[derive(Debug, Default)]
pub struct MetadataAccumulator {
    files: MetadataBundle,
}

impl MetadataAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: MetadataFile) {
        let bundle = file.bundle();
        if self.files.insert(file.file_path, bundle).is_some() {
            debug!("metadata for a file path was replaced");
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn finalize(self, id: &str, out_dir: &str) -> (MetadataBundle, MetadataHeader) {
        let header = MetadataHeader {
            id: id.to_string(),
            kind: EXTENSION_BUNDLE_TYPE.to_string(),
            hash: fingerprint(&self.files),
            out_dir: out_dir.to_string(),
        };
        (self.files, header)
    }
}

/// SHA-256 (hex) over each path in sorted order, followed by its keys and
/// then its messages. Every field is terminated by a NUL byte.
pub fn fingerprint(bundle: &MetadataBundle) -> String {
    let mut hasher = Sha256::new();
    let mut field = |value: &str| {
        hasher.update(value.as_bytes());
        hasher.update([0u8]);
    };
    for (path, entry) in bundle {
        field(path.as_str());
        for key in &entry.keys {
            field(key.key());
        }
        for message in &entry.messages {
            field(message.as_str());
        }
    }
    hex::encode(hasher.finalize())
}
