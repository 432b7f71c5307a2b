//! Source map decoding and re-encoding around the patch engine.

use sourcemap::{SourceMap, SourceMapBuilder, Token};
use tracing::debug;

use crate::error::Result;

/// An input source map, either already decoded or as JSON text.
#[derive(Debug)]
pub enum SourceMapInput {
    Parsed(SourceMap),
    Json(String),
}

impl SourceMapInput {
    /// Decode the map. Unreadable JSON counts as no source map at all.
    pub fn decode(self) -> Option<SourceMap> {
        match self {
            Self::Parsed(map) => Some(map),
            Self::Json(json) => match SourceMap::from_slice(json.as_bytes()) {
                Ok(map) => Some(map),
                Err(err) => {
                    debug!("ignoring unreadable source map: {}", err);
                    None
                }
            },
        }
    }
}

impl From<SourceMap> for SourceMapInput {
    fn from(map: SourceMap) -> Self {
        Self::Parsed(map)
    }
}

impl From<String> for SourceMapInput {
    fn from(json: String) -> Self {
        Self::Json(json)
    }
}

impl From<&str> for SourceMapInput {
    fn from(json: &str) -> Self {
        Self::Json(json.to_string())
    }
}

/// One mapping of the input map, annotated by the patch engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingItem {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source: Option<String>,
    pub original_line: u32,
    pub original_column: u32,
    pub name: Option<String>,
    /// The mapping pointed into replaced text and must not be emitted.
    pub delete: bool,
    pub line_delta: i64,
    pub column_delta: i64,
}

impl MappingItem {
    pub fn new(generated_line: u32, generated_column: u32) -> Self {
        Self {
            generated_line,
            generated_column,
            source: None,
            original_line: 0,
            original_column: 0,
            name: None,
            delete: false,
            line_delta: 0,
            column_delta: 0,
        }
    }

    pub(crate) fn from_token(token: &Token<'_>) -> Self {
        Self {
            generated_line: token.get_dst_line(),
            generated_column: token.get_dst_col(),
            source: token.get_source().map(str::to_string),
            original_line: token.get_src_line(),
            original_column: token.get_src_col(),
            name: token.get_name().map(str::to_string),
            delete: false,
            line_delta: 0,
            column_delta: 0,
        }
    }

    pub fn with_original(mut self, source: &str, line: u32, column: u32) -> Self {
        self.source = Some(source.to_string());
        self.original_line = line;
        self.original_column = column;
        self
    }
}

/// File-level fields of the input map that the output map keeps.
///
/// Sources are read back already joined with the input's `sourceRoot`, so the
/// output map carries them resolved and has no `sourceRoot` of its own.
#[derive(Debug, Clone, Default)]
pub(crate) struct MapHeader {
    file: Option<String>,
    sources_content: Vec<(String, String)>,
}

impl MapHeader {
    pub(crate) fn from_map(map: &SourceMap) -> Self {
        let sources_content = map
            .sources()
            .enumerate()
            .filter_map(|(idx, source)| {
                map.get_source_contents(idx as u32)
                    .map(|contents| (source.to_string(), contents.to_string()))
            })
            .collect();
        Self {
            file: map.get_file().map(str::to_string),
            sources_content,
        }
    }

    /// Encode the surviving mappings at their shifted generated positions.
    pub(crate) fn encode(&self, mut mappings: Vec<(u32, u32, &MappingItem)>) -> Result<String> {
        mappings.sort_by_key(|(line, column, _)| (*line, *column));

        let mut builder = SourceMapBuilder::new(self.file.as_deref());
        for (line, column, item) in mappings {
            builder.add(
                line,
                column,
                item.original_line,
                item.original_column,
                item.source.as_deref(),
                item.name.as_deref(),
                false,
            );
        }
        for (source, contents) in &self.sources_content {
            let id = builder.add_source(source);
            builder.set_source_contents(id, Some(contents));
        }

        let mut out = Vec::new();
        builder.into_sourcemap().to_writer(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
