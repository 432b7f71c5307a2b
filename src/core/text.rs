//! Line-oriented text positions.
//!
//! Positions use zero-based lines and UTF-16 character offsets, which is the
//! unit both JavaScript string offsets and source map columns are expressed in.
//! Lines are split on `\r\n`, `\r` and `\n`; the final segment is always a line
//! of its own, with an empty ending when the text has no trailing newline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A zero-based (line, UTF-16 character) location in a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub const fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// Displays the position 1-based, the way editors and compilers report it.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// A half-open range of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }
}

/// Split text into `(content, ending)` pairs.
///
/// Concatenating every pair reproduces the input byte for byte.
pub fn split_lines(text: &str) -> Vec<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                let ending_len = if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                lines.push((&text[line_start..i], &text[i..i + ending_len]));
                i += ending_len;
                line_start = i;
            }
            b'\n' => {
                lines.push((&text[line_start..i], &text[i..i + 1]));
                i += 1;
                line_start = i;
            }
            _ => i += 1,
        }
    }
    lines.push((&text[line_start..], ""));
    lines
}

/// Number of UTF-16 code units needed to encode `s`.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Byte offset in `s` of the UTF-16 column `column`.
///
/// Columns past the end clamp to `s.len()`. A column pointing into the middle
/// of a surrogate pair resolves to the start of that character.
pub fn byte_offset_of_utf16(s: &str, column: usize) -> usize {
    let mut units = 0;
    for (offset, c) in s.char_indices() {
        if units >= column {
            return offset;
        }
        units += c.len_utf16();
        if units > column {
            return offset;
        }
    }
    s.len()
}

/// Maps byte offsets of a text to [`Position`]s.
pub struct LineIndex<'a> {
    text: &'a str,
    /// Byte offset where each line's content starts.
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = Vec::new();
        let mut offset = 0;
        for (content, ending) in split_lines(text) {
            line_starts.push(offset);
            offset += content.len() + ending.len();
        }
        Self { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of a byte offset. Offsets past the end clamp to the end.
    pub fn position_of(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        Position::new(line, utf16_len(&self.text[line_start..offset]))
    }

    /// Span covering the byte range `lo..hi`.
    pub fn span_of(&self, lo: usize, hi: usize) -> Span {
        Span::new(self.position_of(lo), self.position_of(hi))
    }
}
