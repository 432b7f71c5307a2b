//! Core rewrite engine.
//!
//! - `parser`: swc parsing of JavaScript/TypeScript sources
//! - `scope`: lexical scopes, bindings and their references
//! - `analyzer`: finds localize calls and produces patches plus a message bundle
//! - `patch`, `document`, `source_map`: applies patches and rewrites source maps
//! - `process`: the single-file pipeline tying them together

pub mod analyzer;
pub mod document;
pub mod parser;
pub mod patch;
pub mod process;
pub mod scope;
pub mod source_map;
pub mod text;

pub use analyzer::{AnalysisError, AnalysisErrorKind, AnalysisResult, AnalyzerOptions, analyze};
pub use document::Document;
pub use patch::Patch;
pub use process::{ProcessOptions, ProcessResult, process_file};
pub use text::{Position, Span};
