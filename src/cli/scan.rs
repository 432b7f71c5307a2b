use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::warn;
use walkdir::WalkDir;

/// Result of scanning files.
pub struct ScanResult {
    /// Matching files, sorted.
    pub files: Vec<PathBuf>,
    pub skipped_count: usize,
}

fn compile(patterns: &[String], kind: &str) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("Invalid {} pattern '{}': {}", kind, p, e);
                None
            }
        })
        .collect()
}

/// Path of `path` relative to `root`, with `/` separators.
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Find the source files under `root` whose relative path matches one of
/// `includes` and none of `ignores`.
pub fn scan_files(root: &Path, includes: &[String], ignores: &[String]) -> ScanResult {
    let includes = compile(includes, "include");
    walk(root, ignores, |path, relative| {
        is_scannable_file(path) && includes.iter().any(|p| p.matches(relative))
    })
}

/// Find `*.nls.metadata.json` and `package.nls.json` files under `root`.
pub fn scan_bundle_files(root: &Path, ignores: &[String]) -> ScanResult {
    walk(root, ignores, |path, _| is_bundle_file(path))
}

fn walk(root: &Path, ignores: &[String], accept: impl Fn(&Path, &str) -> bool) -> ScanResult {
    let ignores = compile(ignores, "ignore");
    let mut files = Vec::new();
    let mut skipped_count = 0;

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                skipped_count += 1;
                warn!("Cannot access path: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = relative_path(root, path);
        if ignores.iter().any(|p| p.matches(&relative)) {
            continue;
        }
        if accept(path, &relative) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    ScanResult {
        files,
        skipped_count,
    }
}

fn is_scannable_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("js" | "mjs" | "cjs" | "jsx" | "ts" | "mts" | "cts" | "tsx")
    )
}

pub const METADATA_FILE_SUFFIX: &str = ".nls.metadata.json";
pub const PACKAGE_MESSAGES_FILE: &str = "package.nls.json";

fn is_bundle_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.ends_with(METADATA_FILE_SUFFIX) || name == PACKAGE_MESSAGES_FILE)
}
