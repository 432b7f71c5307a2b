use serde::Serialize;

use crate::core::text::{Position, Span};

/// A text edit: replace `span` with `content`.
///
/// Patches produced by one analysis pass form a set. Order does not matter,
/// but no two patches of a set may overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patch {
    pub span: Span,
    pub content: String,
}

impl Patch {
    pub fn new(span: Span, content: impl Into<String>) -> Self {
        Self {
            span,
            content: content.into(),
        }
    }

    /// Convenience for tests and callers working with raw coordinates.
    pub fn replace(start: (usize, usize), end: (usize, usize), content: impl Into<String>) -> Self {
        Self::new(
            Span::new(Position::new(start.0, start.1), Position::new(end.0, end.1)),
            content,
        )
    }
}
