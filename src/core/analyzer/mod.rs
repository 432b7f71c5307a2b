//! Call-site analysis.
//!
//! Finds the localization calls of one file and turns them into patches and a
//! message bundle:
//!
//! ```text
//! const nls = require('vscode-nls');
//! const localize = nls.loadMessageBundle();      // load call
//! localize('greeting', 'Hello {0}', name);       // localize call
//! ```
//!
//! becomes
//!
//! ```text
//! const nls = require('vscode-nls');
//! const localize = nls.loadMessageBundle(__filename);
//! localize(0, null, name);
//! ```
//!
//! with `{ messages: ["Hello {0}"], keys: ["greeting"] }` as the bundle.
//!
//! The analysis runs in three passes over the program:
//! 1. `imports`: bindings introduced by importing the localization module
//! 2. `calls::LoadCallCollector`: load calls reached through those bindings,
//!    the variables they initialize and inline localize calls
//! 3. `calls::BoundCallCollector`: localize calls through those variables

mod calls;
mod imports;


use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use swc_common::{BytePos, Span as SwcSpan};
use swc_ecma_ast::Expr;
use tracing::debug;

use crate::bundle::JavaScriptMessageBundle;
use crate::core::parser::ParsedSource;
use crate::core::patch::Patch;
use crate::core::scope::ScopeAnalysis;
use crate::core::text::{LineIndex, Position, Span};

pub const DEFAULT_MODULE_NAME: &str = "vscode-nls";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Module whose imports mark a file as localized.
    pub module_name: String,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            module_name: DEFAULT_MODULE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisErrorKind {
    #[error(
        "key argument must be a string literal or an object literal with a string `key` property; ignoring call"
    )]
    InvalidKey,

    #[error("`comment` must be an array of string literals; ignoring call")]
    InvalidComment,

    #[error("message argument must be a string literal; ignoring call")]
    InvalidMessage,

    #[error("`{binding}` can only be called with a key and a message")]
    InvalidReference { binding: String },
}

/// A call site the analyzer could not rewrite.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} ({position})")]
pub struct AnalysisError {
    pub kind: AnalysisErrorKind,
    pub position: Position,
}

/// Patches, errors and extracted messages of one file.
///
/// A non-empty `errors` means the file must not be rewritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    pub patches: Vec<Patch>,
    pub errors: Vec<AnalysisError>,
    pub bundle: JavaScriptMessageBundle,
}

/// Analyze a file with the default options.
///
/// `relative_filename` is the file's path relative to the running module's
/// directory. When given, empty load calls are filled with an expression that
/// joins it onto `__dirname`; otherwise with `__filename`.
pub fn analyze(parsed: &ParsedSource, relative_filename: Option<&str>) -> AnalysisResult {
    analyze_with(parsed, relative_filename, &AnalyzerOptions::default())
}

pub fn analyze_with(
    parsed: &ParsedSource,
    relative_filename: Option<&str>,
    options: &AnalyzerOptions,
) -> AnalysisResult {
    let scope = ScopeAnalysis::analyze(&parsed.program);

    let imports = imports::find_imports(&parsed.program, &scope, &options.module_name);
    if imports.is_empty() {
        return AnalysisResult::default();
    }
    let import_refs: HashSet<BytePos> = imports
        .iter()
        .flat_map(|binding| scope.read_references(*binding))
        .map(|reference| reference.span.lo)
        .collect();

    let cx = Context {
        parsed,
        scope: &scope,
        index: LineIndex::new(parsed.text()),
    };

    let loads = calls::LoadCallCollector::collect(&cx, &import_refs, relative_filename);
    let bound = calls::BoundCallCollector::collect(&cx, &loads.localize_bindings);

    let mut result = AnalysisResult {
        patches: loads.patches,
        ..Default::default()
    };

    // Every read of a localize variable must be the callee of a localize call.
    for binding in &loads.localize_bindings {
        for reference in scope.read_references(*binding) {
            if !bound.used.contains(&reference.span.lo) {
                result.errors.push(cx.error(
                    AnalysisErrorKind::InvalidReference {
                        binding: scope.binding(*binding).name.clone(),
                    },
                    reference.span.lo,
                ));
            }
        }
    }

    let mut sites = loads.sites;
    sites.extend(bound.sites);
    sites.sort_by_key(|site| site.start);

    for site in sites {
        match site.outcome {
            Ok(call) => {
                let index = result.bundle.push(call.key, call.message);
                result
                    .patches
                    .push(Patch::new(call.key_span, index.to_string()));
                result.patches.push(Patch::new(call.message_span, "null"));
            }
            Err(err) => result.errors.push(err),
        }
    }

    result.errors.sort_by_key(|err| err.position);
    debug!(
        "found {} localize calls and {} errors",
        result.bundle.messages.len(),
        result.errors.len()
    );
    result
}

/// Shared lookups for the analysis passes.
pub(crate) struct Context<'a> {
    parsed: &'a ParsedSource,
    scope: &'a ScopeAnalysis,
    index: LineIndex<'a>,
}

impl Context<'_> {
    fn span(&self, span: SwcSpan) -> Span {
        self.parsed.span(&self.index, span)
    }

    fn position(&self, pos: BytePos) -> Position {
        self.index.position_of(self.parsed.offset(pos))
    }

    fn error(&self, kind: AnalysisErrorKind, pos: BytePos) -> AnalysisError {
        AnalysisError {
            kind,
            position: self.position(pos),
        }
    }
}

fn unparen(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => unparen(&paren.expr),
        _ => expr,
    }
}

static ESCAPE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\(.)").unwrap());

/// Unescape the raw text of a string literal (without its quotes).
///
/// Only `\n \r \t \b \f \\ \' \"` are replaced; any other escape keeps its
/// backslash.
pub fn unescape_message(raw: &str) -> String {
    ESCAPE_REGEX
        .replace_all(raw, |caps: &Captures<'_>| {
            match &caps[1] {
                "n" => "\n",
                "r" => "\r",
                "t" => "\t",
                "b" => "\u{8}",
                "f" => "\u{c}",
                "\\" => "\\",
                "'" => "'",
                "\"" => "\"",
                other => return format!("\\{other}"),
            }
            .to_string()
        })
        .into_owned()
}
