//! nlsx - build-time string extraction for localized JavaScript
//!
//! nlsx rewrites calls made through a localization module such as
//! `vscode-nls` so that they reference messages by index, and writes the
//! extracted messages to bundles that translated files are generated from.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (process, translate, init)
//! - `config`: Configuration file loading and parsing
//! - `core`: Parsing, call-site analysis, patching and source maps
//! - `bundle`: Message bundle formats, translation lookup and merge
//! - `error`: Library error type

pub mod bundle;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
