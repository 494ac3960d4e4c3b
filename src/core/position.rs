//! Source Positions
//!
//! Line/column bookkeeping shared by the cursor, the entity decoder and the
//! streaming tokenizer. Offsets are byte offsets into the UTF-8 input; lines
//! and columns are 1-based and columns count characters, not bytes.
//!
//! CR, LF and CRLF each count as exactly one line break.

/// An absolute location in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Byte offset from the start of the whole input (not the current chunk)
    pub offset: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in characters)
    pub column: usize,
}

impl Position {
    /// Position of the first character of a document
    pub const START: Position = Position {
        offset: 0,
        line: 1,
        column: 1,
    };

    /// Create a position from its parts
    #[inline]
    pub const fn new(offset: usize, line: usize, column: usize) -> Self {
        Position {
            offset,
            line,
            column,
        }
    }

    /// Line and column without the offset
    #[inline]
    pub const fn line_column(&self) -> LineColumn {
        LineColumn {
            line: self.line,
            column: self.column,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

/// A 1-based line/column pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

/// Line/column information for both ends of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanLines {
    pub start: LineColumn,
    pub end: LineColumn,
}

/// Walk `count` bytes of `text` starting from `base` and return the position
/// reached.
///
/// `count` is clamped to the text length for the line/column walk, but the
/// returned offset is always `base.offset + count` so that callers can
/// account for bytes they know were consumed.
pub fn advance_position(base: Position, text: &str, count: usize) -> Position {
    let bytes = text.as_bytes();
    let end = count.min(bytes.len());
    let mut line = base.line;
    let mut column = base.column;
    let mut i = 0;

    while i < end {
        match bytes[i] {
            b'\r' => {
                line += 1;
                column = 1;
            }
            // LF completing a CRLF was already counted with the CR
            b'\n' if i > 0 && bytes[i - 1] == b'\r' => {}
            b'\n' => {
                line += 1;
                column = 1;
            }
            // UTF-8 continuation bytes belong to the previous character
            b if b & 0xC0 == 0x80 => {}
            _ => column += 1,
        }
        i += 1;
    }

    Position {
        offset: base.offset + count,
        line,
        column,
    }
}

/// Compute the line/column of a byte offset in `input`
///
/// Offsets past the end of the input clamp to the end.
pub fn offset_to_line_column(input: &str, offset: usize) -> LineColumn {
    let safe = offset.min(input.len());
    advance_position(Position::START, input, safe).line_column()
}

/// Compute line/column information for both ends of a byte range
pub fn span_to_line_column(input: &str, start: usize, end: usize) -> SpanLines {
    SpanLines {
        start: offset_to_line_column(input, start),
        end: offset_to_line_column(input, end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_plain() {
        let pos = advance_position(Position::START, "abc", 3);
        assert_eq!(pos, Position::new(3, 1, 4));
    }

    #[test]
    fn test_line_breaks_count_once() {
        // LF, CR and CRLF are one break each
        let pos = advance_position(Position::START, "a\nb\rc\r\nd", 8);
        assert_eq!(pos.line, 4);
        assert_eq!(pos.column, 2);
        assert_eq!(pos.offset, 8);
    }

    #[test]
    fn test_cr_at_count_boundary() {
        let pos = advance_position(Position::START, "a\r\nb", 2);
        assert_eq!((pos.line, pos.column), (2, 1));
        let pos = advance_position(Position::START, "a\r\nb", 3);
        assert_eq!((pos.line, pos.column), (2, 1));
    }

    #[test]
    fn test_multibyte_columns() {
        let pos = advance_position(Position::START, "héllo", "héllo".len());
        assert_eq!(pos.column, 6);
        assert_eq!(pos.offset, 6);
    }

    #[test]
    fn test_seeded_base() {
        let base = Position::new(100, 7, 3);
        let pos = advance_position(base, "x\ny", 3);
        assert_eq!(pos, Position::new(103, 8, 2));
    }

    #[test]
    fn test_offset_to_line_column_clamps() {
        let lc = offset_to_line_column("ab\ncd", 99);
        assert_eq!(lc, LineColumn { line: 2, column: 3 });
    }

    #[test]
    fn test_span_to_line_column() {
        let lines = span_to_line_column("<a>\n</a>", 0, 8);
        assert_eq!(lines.start, LineColumn { line: 1, column: 1 });
        assert_eq!(lines.end, LineColumn { line: 2, column: 5 });
    }
}
