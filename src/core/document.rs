//! Line-indexed text buffer that applies patches and keeps a source map in sync.
//!
//! Patches are applied from the last one to the first so that an edit never
//! has to account for the shifts caused by edits after it. Source map
//! mappings record the resulting shifts locally (on the first mapping after an
//! edit) and a single forward sweep in [`Document::generate_source_map`]
//! resolves them into final generated positions.

use std::fmt;

use tracing::debug;

use crate::core::patch::Patch;
use crate::core::source_map::{MapHeader, MappingItem, SourceMapInput};
use crate::core::text::{Position, Span, byte_offset_of_utf16, split_lines, utf16_len};
use crate::error::{NlsError, Result};

/// One line of a [`Document`].
#[derive(Debug, Clone, Default)]
pub struct Line {
    /// `None` once the line was folded into a previous line by a multi-line edit.
    pub content: Option<String>,
    pub ending: String,
    /// Mappings whose generated position is on this line, ordered by column.
    pub mappings: Vec<MappingItem>,
    /// Shifts produced by edits with no mapping after them on this line.
    /// Applied after the line's own mappings.
    pending_line_delta: i64,
    pending_column_delta: i64,
}

impl Line {
    fn new(content: &str, ending: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            ending: ending.to_string(),
            ..Default::default()
        }
    }
}

/// Walks a line's mappings backwards while the patches on that line are
/// applied from right to left.
#[derive(Debug, Default)]
struct MappingCursor {
    line: Option<usize>,
    /// Mappings at `index..` have already been passed.
    index: usize,
}

#[derive(Debug)]
pub struct Document {
    lines: Vec<Line>,
    /// Present when the document was created with a readable source map.
    source_map: Option<MapHeader>,
}

impl Document {
    pub fn new(text: &str) -> Self {
        Self {
            lines: split_lines(text)
                .into_iter()
                .map(|(content, ending)| Line::new(content, ending))
                .collect(),
            source_map: None,
        }
    }

    /// Create a document whose edits also rewrite `source_map`.
    ///
    /// An unreadable map is ignored and the document behaves as if none was given.
    pub fn with_source_map(text: &str, source_map: impl Into<SourceMapInput>) -> Self {
        let mut document = Self::new(text);
        let Some(map) = source_map.into().decode() else {
            return document;
        };

        for token in map.tokens() {
            let item = MappingItem::from_token(&token);
            match document.lines.get_mut(item.generated_line as usize) {
                Some(line) => line.mappings.push(item),
                None => debug!(
                    "dropping mapping on generated line {} past the end of the file",
                    item.generated_line + 1
                ),
            }
        }
        for line in &mut document.lines {
            line.mappings.sort_by_key(|item| item.generated_column);
        }
        document.source_map = Some(MapHeader::from_map(&map));
        document
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn has_source_map(&self) -> bool {
        self.source_map.is_some()
    }

    /// Apply a set of non-overlapping patches in place.
    ///
    /// Fails without touching the document if two patches overlap or the last
    /// patch ends outside of the document.
    pub fn apply(&mut self, patches: &[Patch]) -> Result<()> {
        let mut sorted: Vec<&Patch> = patches.iter().collect();
        sorted.sort_by_key(|patch| patch.span.start);

        if let Some(patch) = sorted.iter().find(|p| p.span.end < p.span.start) {
            return Err(NlsError::InvalidSpan(patch.span));
        }
        for pair in sorted.windows(2) {
            let (previous, next) = (&pair[0].span, &pair[1].span);
            if previous.end >= next.start {
                return Err(NlsError::overlapping(previous, next));
            }
        }
        let Some(last) = sorted.last() else {
            return Ok(());
        };
        self.check_bounds(last.span.end)?;

        let mut cursor = MappingCursor::default();
        for patch in sorted.into_iter().rev() {
            self.splice(patch);
            if self.source_map.is_some() {
                if patch.span.is_single_line() {
                    self.shift_single_line(patch, &mut cursor);
                } else {
                    self.shift_multi_line(patch);
                    cursor.line = None;
                }
            }
        }
        Ok(())
    }

    fn check_bounds(&self, end: Position) -> Result<()> {
        let out_of_bounds = || NlsError::OutOfBounds {
            end,
            line_count: self.lines.len(),
        };
        let line = self.lines.get(end.line).ok_or_else(out_of_bounds)?;
        match &line.content {
            Some(content) if end.character <= utf16_len(content) => Ok(()),
            _ => Err(out_of_bounds()),
        }
    }

    fn splice(&mut self, patch: &Patch) {
        let Span { start, end } = patch.span;

        let suffix = {
            let end_content = self.lines[end.line].content.as_deref().unwrap_or_default();
            end_content[byte_offset_of_utf16(end_content, end.character)..].to_string()
        };

        let start_content = self.lines[start.line]
            .content
            .get_or_insert_with(String::new);
        let prefix_len = byte_offset_of_utf16(start_content, start.character);
        start_content.truncate(prefix_len);
        start_content.push_str(&patch.content);
        start_content.push_str(&suffix);

        if end.line > start.line {
            let ending = std::mem::take(&mut self.lines[end.line].ending);
            for line in &mut self.lines[start.line + 1..=end.line] {
                line.content = None;
            }
            self.lines[start.line].ending = ending;
        }
    }

    fn shift_single_line(&mut self, patch: &Patch, cursor: &mut MappingCursor) {
        let Span { start, end } = patch.span;
        let line = &mut self.lines[start.line];

        if cursor.line != Some(start.line) {
            cursor.line = Some(start.line);
            cursor.index = line.mappings.len();
        }
        while cursor.index > 0 {
            let item = &mut line.mappings[cursor.index - 1];
            let column = item.generated_column as usize;
            if column <= start.character {
                break;
            }
            if column < end.character {
                item.delete = true;
            }
            cursor.index -= 1;
        }

        let delta = utf16_len(&patch.content) as i64 - (end.character - start.character) as i64;
        match line.mappings.get_mut(cursor.index) {
            Some(item) => item.column_delta += delta,
            None => line.pending_column_delta += delta,
        }
    }

    fn shift_multi_line(&mut self, patch: &Patch) {
        let Span { start, end } = patch.span;

        for item in self.lines[start.line].mappings.iter_mut().rev() {
            if (item.generated_column as usize) < start.character {
                break;
            }
            item.delete = true;
        }
        for line in &mut self.lines[start.line + 1..end.line] {
            line.mappings.iter_mut().for_each(|item| item.delete = true);
        }

        let line_delta = start.line as i64 - end.line as i64;
        let column_delta = start.character as i64 - end.character as i64
            + utf16_len(&patch.content) as i64;

        let end_line = &mut self.lines[end.line];
        let first_kept = end_line
            .mappings
            .iter()
            .position(|item| item.generated_column as usize >= end.character);
        let kept_from = first_kept.unwrap_or(end_line.mappings.len());
        for item in &mut end_line.mappings[..kept_from] {
            item.delete = true;
        }
        match first_kept {
            Some(index) => {
                let item = &mut end_line.mappings[index];
                item.line_delta += line_delta;
                item.column_delta += column_delta;
            }
            None => {
                end_line.pending_line_delta += line_delta;
                end_line.pending_column_delta += column_delta;
            }
        }
    }

    /// Encode the rewritten source map, or `None` when the document has none.
    pub fn generate_source_map(&self) -> Result<Option<String>> {
        let Some(header) = &self.source_map else {
            return Ok(None);
        };

        let mut line_shift: i64 = 0;
        let mut column_shift: i64 = 0;
        let mut mappings = Vec::new();

        for line in &self.lines {
            // A consumed line continues the generated line it was merged into.
            if line.content.is_some() {
                column_shift = 0;
            }
            for item in &line.mappings {
                line_shift += item.line_delta;
                column_shift += item.column_delta;
                if item.delete {
                    continue;
                }
                let generated_line = item.generated_line as i64 + line_shift;
                let generated_column = item.generated_column as i64 + column_shift;
                match (u32::try_from(generated_line), u32::try_from(generated_column)) {
                    (Ok(line), Ok(column)) => mappings.push((line, column, item)),
                    _ => debug!(
                        "dropping mapping shifted to a negative position ({}, {})",
                        generated_line, generated_column
                    ),
                }
            }
            line_shift += line.pending_line_delta;
            column_shift += line.pending_column_delta;
        }

        header.encode(mappings).map(Some)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            if let Some(content) = &line.content {
                f.write_str(content)?;
                f.write_str(&line.ending)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sourcemap::SourceMap;

    use crate::core::document::*;

    /// Generated (line, column) -> original (line, column) of every mapping.
    fn mapping_pairs(json: &str) -> Vec<((u32, u32), (u32, u32))> {
        let map = SourceMap::from_slice(json.as_bytes()).unwrap();
        map.tokens()
            .map(|t| {
                (
                    (t.get_dst_line(), t.get_dst_col()),
                    (t.get_src_line(), t.get_src_col()),
                )
            })
            .collect()
    }

    /// An identity-like map with one mapping per listed generated position.
    fn map_json(positions: &[(u32, u32)]) -> String {
        let mut builder = sourcemap::SourceMapBuilder::new(Some("out.js"));
        for &(line, column) in positions {
            builder.add(line, column, line, column, Some("in.ts"), None, false);
        }
        let mut out = Vec::new();
        builder.into_sourcemap().to_writer(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_round_trip_without_patches() {
        let text = "var a = 1;\r\nvar b = 2;\rvar c;\n\nlast";
        let mut document = Document::new(text);
        document.apply(&[]).unwrap();
        assert_eq!(document.to_string(), text);
    }

    #[test]
    fn test_single_line_patches_any_input_order() {
        let mut document = Document::new("localize('key', 'message');\n");
        document
            .apply(&[
                Patch::replace((0, 16), (0, 25), "null"),
                Patch::replace((0, 9), (0, 14), "0"),
            ])
            .unwrap();
        assert_eq!(document.to_string(), "localize(0, null);\n");
    }

    #[test]
    fn test_multi_line_patch_folds_lines() {
        let mut document = Document::new("a({\n  key: 'k'\n}, 'm');\r\nnext");
        document
            .apply(&[Patch::replace((0, 2), (2, 1), "0")])
            .unwrap();
        assert_eq!(document.to_string(), "a(0, 'm');\r\nnext");
        assert!(document.lines()[1].content.is_none());
        assert!(document.lines()[2].content.is_none());
    }

    #[test]
    fn test_patch_on_unicode_line() {
        let mut document = Document::new("f('😀', 'é');");
        document
            .apply(&[Patch::replace((0, 8), (0, 11), "null")])
            .unwrap();
        assert_eq!(document.to_string(), "f('😀', null);");
    }

    #[test]
    fn test_overlapping_patches_fail() {
        let patches = [
            Patch::replace((0, 5), (0, 8), "x"),
            Patch::replace((0, 7), (0, 9), "y"),
        ];
        let mut document = Document::new("0123456789");
        let err = document.apply(&patches).unwrap_err();
        assert!(matches!(err, NlsError::OverlappingEdits { .. }));

        let reversed = [patches[1].clone(), patches[0].clone()];
        let err = document.apply(&reversed).unwrap_err();
        assert!(matches!(err, NlsError::OverlappingEdits { .. }));
        assert_eq!(document.to_string(), "0123456789");
    }

    #[test]
    fn test_touching_patches_count_as_overlapping() {
        let mut document = Document::new("0123456789");
        let err = document
            .apply(&[
                Patch::replace((0, 2), (0, 4), "x"),
                Patch::replace((0, 4), (0, 6), "y"),
            ])
            .unwrap_err();
        assert!(matches!(err, NlsError::OverlappingEdits { .. }));
    }

    #[test]
    fn test_out_of_bounds_patch_fails() {
        let mut document = Document::new("abc\ndef");
        let err = document
            .apply(&[Patch::replace((1, 1), (1, 4), "x")])
            .unwrap_err();
        assert!(matches!(err, NlsError::OutOfBounds { .. }));

        let err = document
            .apply(&[Patch::replace((2, 0), (2, 0), "x")])
            .unwrap_err();
        assert!(matches!(err, NlsError::OutOfBounds { .. }));
    }

    #[test]
    fn test_reversed_span_fails() {
        let mut document = Document::new("abc");
        let err = document
            .apply(&[Patch::replace((0, 2), (0, 1), "x")])
            .unwrap_err();
        assert!(matches!(err, NlsError::InvalidSpan(_)));
    }

    #[test]
    fn test_no_source_map_generates_none() {
        let document = Document::new("abc");
        assert!(document.generate_source_map().unwrap().is_none());
    }

    #[test]
    fn test_unreadable_source_map_is_ignored() {
        let document = Document::with_source_map("abc", "not a map");
        assert!(!document.has_source_map());
    }

    #[test]
    fn test_single_line_edit_shifts_following_mappings() {
        // localize('key', 'message', x);
        // 0        9     15 16      25 27
        let text = "localize('key', 'message', x);";
        let json = map_json(&[(0, 0), (0, 9), (0, 16), (0, 27)]);
        let mut document = Document::with_source_map(text, json);
        document
            .apply(&[
                Patch::replace((0, 9), (0, 14), "0"),
                Patch::replace((0, 16), (0, 25), "null"),
            ])
            .unwrap();
        assert_eq!(document.to_string(), "localize(0, null, x);");

        let out = document.generate_source_map().unwrap().unwrap();
        assert_eq!(
            mapping_pairs(&out),
            vec![
                ((0, 0), (0, 0)),
                ((0, 9), (0, 9)),
                ((0, 12), (0, 16)),
                ((0, 18), (0, 27)),
            ]
        );
    }

    #[test]
    fn test_mappings_inside_replaced_text_are_dropped() {
        let text = "f('abcdef', y);";
        let json = map_json(&[(0, 0), (0, 2), (0, 5), (0, 12)]);
        let mut document = Document::with_source_map(text, json);
        document
            .apply(&[Patch::replace((0, 2), (0, 10), "0")])
            .unwrap();
        assert_eq!(document.to_string(), "f(0, y);");

        let out = document.generate_source_map().unwrap().unwrap();
        assert_eq!(
            mapping_pairs(&out),
            vec![((0, 0), (0, 0)), ((0, 2), (0, 2)), ((0, 5), (0, 12))]
        );
    }

    #[test]
    fn test_multi_line_edit_moves_end_line_mappings() {
        let text = "a({\n  key: 'k'\n}, 'm');\nnext;";
        let json = map_json(&[(0, 0), (0, 2), (1, 2), (2, 0), (2, 3), (3, 0)]);
        let mut document = Document::with_source_map(text, json);
        document
            .apply(&[Patch::replace((0, 2), (2, 1), "0")])
            .unwrap();
        assert_eq!(document.to_string(), "a(0, 'm');\nnext;");

        let out = document.generate_source_map().unwrap().unwrap();
        assert_eq!(
            mapping_pairs(&out),
            vec![((0, 0), (0, 0)), ((0, 5), (2, 3)), ((1, 0), (3, 0))]
        );
    }

    #[test]
    fn test_line_delta_survives_end_line_without_mappings() {
        let text = "a({\n  key: 'k'\n});\nnext;";
        let json = map_json(&[(0, 0), (1, 2), (3, 0)]);
        let mut document = Document::with_source_map(text, json);
        document
            .apply(&[Patch::replace((0, 2), (2, 1), "0")])
            .unwrap();
        assert_eq!(document.to_string(), "a(0);\nnext;");

        let out = document.generate_source_map().unwrap().unwrap();
        assert_eq!(mapping_pairs(&out), vec![((0, 0), (0, 0)), ((1, 0), (3, 0))]);
    }

    #[test]
    fn test_edit_before_multi_line_edit_on_same_line() {
        // Both edits land on line 0: the folded end-line mapping must see the
        // shift of the earlier single-line edit as well.
        let text = "g('xx', {\n}, z);";
        let json = map_json(&[(0, 0), (0, 8), (1, 3)]);
        let mut document = Document::with_source_map(text, json);
        document
            .apply(&[
                Patch::replace((0, 2), (0, 6), "0"),
                Patch::replace((0, 8), (1, 1), "1"),
            ])
            .unwrap();
        assert_eq!(document.to_string(), "g(0, 1, z);");

        let out = document.generate_source_map().unwrap().unwrap();
        assert_eq!(mapping_pairs(&out), vec![((0, 0), (0, 0)), ((0, 8), (1, 3))]);
    }
}
