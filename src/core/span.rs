//! Span - half-open byte range into the source input
//!
//! Offsets are absolute: for streamed input they count from the first byte
//! of the whole stream, not of the current chunk. Spans produced by the
//! tokenizer always carry line/column information for both ends.

use super::error::{ErrorCode, XmlError};
use super::position::{span_to_line_column, LineColumn, Position, SpanLines};

/// A source range `[start, end)` with optional line/column data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Byte offset of the first byte
    pub start: usize,
    /// Byte offset one past the last byte
    pub end: usize,
    pub lines: Option<SpanLines>,
}

impl Span {
    /// Create a span without line information.
    ///
    /// Fails with `XML_INVALID_SPAN` if `end < start`.
    pub fn try_new(start: usize, end: usize) -> Result<Self, XmlError> {
        if end < start {
            return Err(XmlError::new(
                ErrorCode::InvalidSpan,
                Position::new(0, 1, 1),
                format!("end ({}) must be >= start ({})", end, start),
            ));
        }
        Ok(Span {
            start,
            end,
            lines: None,
        })
    }

    /// Create a span between two known positions
    #[inline]
    pub(crate) fn between(start: Position, end: Position) -> Self {
        Span {
            start: start.offset,
            end: end.offset,
            lines: Some(SpanLines {
                start: start.line_column(),
                end: end.line_column(),
            }),
        }
    }

    /// Length in bytes
    #[inline]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Position of the first byte
    ///
    /// Spans without line data report line 1, column 1.
    pub fn start_position(&self) -> Position {
        let lc = self
            .lines
            .map(|l| l.start)
            .unwrap_or(LineColumn { line: 1, column: 1 });
        Position::new(self.start, lc.line, lc.column)
    }

    /// Copy of this span with line/column computed from `input`
    ///
    /// `input` must be the whole document the offsets refer to.
    pub fn with_lines(self, input: &str) -> Self {
        Span {
            lines: Some(span_to_line_column(input, self.start, self.end)),
            ..self
        }
    }

    /// Extract the covered text from the whole input
    ///
    /// Returns None if the span is out of range or splits a character.
    #[inline]
    pub fn slice<'a>(&self, input: &'a str) -> Option<&'a str> {
        input.get(self.start..self.end)
    }
}
