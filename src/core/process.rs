//! Single-file pipeline: parse, analyze, patch.

use tracing::debug;

use crate::bundle::JavaScriptMessageBundle;
use crate::core::analyzer::{AnalysisError, AnalyzerOptions, analyze_with};
use crate::core::document::Document;
use crate::core::parser::parse_source;
use crate::core::source_map::SourceMapInput;
use crate::error::Result;

/// Per-file inputs besides the source text.
#[derive(Debug, Default)]
pub struct ProcessOptions<'a> {
    /// Path of the file relative to the running module's directory, used in
    /// the load call's file reference.
    pub relative_filename: Option<&'a str>,
    /// Source map of the file, rewritten along with it.
    pub source_map: Option<SourceMapInput>,
    pub analyzer: AnalyzerOptions,
}

/// Output of [`process_file`].
///
/// All outputs are `None` when the file has nothing to localize; callers pass
/// the original file through unchanged. A non-empty `errors` means the file
/// must not be rewritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessResult {
    pub contents: Option<String>,
    pub source_map: Option<String>,
    pub bundle: Option<JavaScriptMessageBundle>,
    pub errors: Vec<AnalysisError>,
}

impl ProcessResult {
    pub fn is_rewritten(&self) -> bool {
        self.contents.is_some()
    }
}

/// Rewrite one file.
///
/// `file_path` selects the parser syntax and names the file in errors. Parse
/// failures and patch engine failures are returned as `Err`; call-site
/// problems are reported in [`ProcessResult::errors`].
pub fn process_file(
    file_path: &str,
    contents: &str,
    options: ProcessOptions<'_>,
) -> Result<ProcessResult> {
    let parsed = parse_source(contents, file_path)?;
    let analysis = analyze_with(&parsed, options.relative_filename, &options.analyzer);

    if !analysis.errors.is_empty() {
        return Ok(ProcessResult {
            errors: analysis.errors,
            ..Default::default()
        });
    }
    if analysis.patches.is_empty() {
        debug!("{}: nothing to localize", file_path);
        return Ok(ProcessResult::default());
    }

    let mut document = match options.source_map {
        Some(source_map) => Document::with_source_map(contents, source_map),
        None => Document::new(contents),
    };
    document.apply(&analysis.patches)?;
    let source_map = document.generate_source_map()?;

    Ok(ProcessResult {
        contents: Some(document.to_string()),
        source_map,
        bundle: Some(analysis.bundle),
        errors: Vec::new(),
    })
}
