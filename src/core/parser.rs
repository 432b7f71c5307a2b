use std::path::Path;

use swc_common::{BytePos, FileName, Globals, SourceMap, Span as SwcSpan, Spanned};
use swc_ecma_ast::Program;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

use crate::core::text::{LineIndex, Span};
use crate::error::{NlsError, Result};

/// A parsed JavaScript/TypeScript file together with its text.
pub struct ParsedSource {
    pub program: Program,
    source: String,
    /// Position in swc's source map of the first byte after the BOM.
    start_pos: BytePos,
    /// Length of a leading UTF-8 BOM, which swc drops from its copy.
    bom_len: usize,
}

impl ParsedSource {
    pub fn text(&self) -> &str {
        &self.source
    }

    /// Byte offset in [`Self::text`] of an swc position.
    pub fn offset(&self, pos: BytePos) -> usize {
        (pos.0 - self.start_pos.0) as usize + self.bom_len
    }

    /// Source text covered by an swc span.
    pub fn slice(&self, span: SwcSpan) -> &str {
        &self.source[self.offset(span.lo)..self.offset(span.hi)]
    }

    /// Convert an swc span into a line/character span.
    pub fn span(&self, index: &LineIndex<'_>, span: SwcSpan) -> Span {
        index.span_of(self.offset(span.lo), self.offset(span.hi))
    }
}

/// Pick the parser syntax from a file name's extension.
///
/// TypeScript flavours get the TypeScript parser; everything else is parsed
/// as ECMAScript, with JSX enabled for `.jsx`.
pub fn syntax_for_path(path: &str) -> Syntax {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("ts" | "mts" | "cts") => Syntax::Typescript(TsSyntax {
            decorators: true,
            ..Default::default()
        }),
        Some("tsx") => Syntax::Typescript(TsSyntax {
            tsx: true,
            decorators: true,
            ..Default::default()
        }),
        Some("jsx") => Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        }),
        _ => Syntax::Es(EsSyntax::default()),
    }
}

/// Parse source text into an AST.
///
/// `file_path` only selects the syntax and names the file in error messages.
/// Each call uses its own swc source map and globals, so files can be parsed
/// in parallel.
pub fn parse_source(code: &str, file_path: &str) -> Result<ParsedSource> {
    use swc_common::GLOBALS;

    GLOBALS.set(&Globals::new(), || {
        let source_map = SourceMap::default();
        let body = code.strip_prefix('\u{feff}').unwrap_or(code);
        let source_file =
            source_map.new_source_file(FileName::Real(file_path.into()).into(), body.to_string());

        let mut parser = Parser::new(
            syntax_for_path(file_path),
            StringInput::from(&*source_file),
            None,
        );
        let program = parser.parse_program().map_err(|e| {
            let loc = source_map.lookup_char_pos(e.span().lo);
            NlsError::Parse {
                file: file_path.to_string(),
                message: format!("{} ({}:{})", e.kind().msg(), loc.line, loc.col_display + 1),
            }
        })?;

        Ok(ParsedSource {
            program,
            source: code.to_string(),
            start_pos: source_file.start_pos,
            bom_len: code.len() - body.len(),
        })
    })
}
