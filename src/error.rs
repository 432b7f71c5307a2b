use crate::core::text::{Position, Span};

/// Errors that abort processing of a single file.
#[derive(thiserror::Error, Debug)]
pub enum NlsError {
    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("overlapping edits: {first_start}-{first_end} overlaps {second_start}-{second_end}")]
    OverlappingEdits {
        first_start: Position,
        first_end: Position,
        second_start: Position,
        second_end: Position,
    },

    #[error("edit ending at {end} is outside of the document ({line_count} lines)")]
    OutOfBounds { end: Position, line_count: usize },

    #[error("edit ends at {} before it starts at {}", .0.end, .0.start)]
    InvalidSpan(Span),

    #[error("failed to write source map: {0}")]
    SourceMap(#[from] sourcemap::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NlsError {
    pub(crate) fn overlapping(first: &Span, second: &Span) -> Self {
        Self::OverlappingEdits {
            first_start: first.start,
            first_end: first.end,
            second_start: second.start,
            second_end: second.end,
        }
    }
}

pub type Result<T, E = NlsError> = std::result::Result<T, E>;
