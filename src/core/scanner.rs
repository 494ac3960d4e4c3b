//! Position-tracking scan cursor
//!
//! Uses memchr for delimiter and substring search (SIMD accelerated):
//! - SSE2 (default x86_64)
//! - AVX2 (runtime detection)
//! - NEON (aarch64)
//!
//! Every advance keeps offset, line and column in sync, so positions are a
//! pure function of the bytes scanned. A cursor can be seeded with a start
//! position to continue numbering across streaming chunks.

use super::error::{ErrorCode, XmlError};
use super::names::{is_name_char, is_name_start_char};
use super::position::Position;
use memchr::{memchr, memmem};

/// Scan cursor over a string buffer
pub struct Cursor<'a> {
    input: &'a str,
    /// Next unread byte index into `input`
    pos: usize,
    /// Absolute offset of `input[0]`
    base_offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of a document
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Self::with_start(input, Position::START)
    }

    /// Create a cursor whose first byte sits at `start` in the whole input
    #[inline]
    pub fn with_start(input: &'a str, start: Position) -> Self {
        Cursor {
            input,
            pos: 0,
            base_offset: start.offset,
            line: start.line,
            column: start.column,
        }
    }

    /// Current absolute position
    #[inline]
    pub fn position(&self) -> Position {
        Position {
            offset: self.base_offset + self.pos,
            line: self.line,
            column: self.column,
        }
    }

    /// Current index into this cursor's buffer
    #[inline]
    pub fn index(&self) -> usize {
        self.pos
    }

    /// Length of the buffer in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Consume one character, treating CRLF as a single advance.
    ///
    /// Returns the first byte consumed.
    pub fn next_byte(&mut self) -> Option<u8> {
        let b = self.peek()?;
        let bytes = self.input.as_bytes();
        if b == b'\r' && bytes.get(self.pos + 1) == Some(&b'\n') {
            self.advance_to(self.pos + 2);
        } else {
            self.advance_to(self.pos + 1);
        }
        Some(b)
    }

    /// Consume one character and require it to be `expected`.
    ///
    /// The error cites the position after the offending character; it is
    /// marked truncated when the input ran out instead.
    pub fn expect_byte(&mut self, expected: u8, code: ErrorCode, message: &str) -> Result<(), XmlError> {
        match self.next_byte() {
            Some(b) if b == expected => Ok(()),
            Some(_) => Err(XmlError::new(code, self.position(), message)),
            None => Err(XmlError::new(code, self.position(), message).truncated()),
        }
    }

    /// Find next occurrence of a byte at or after the cursor
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input.as_bytes()[self.pos..]).map(|i| self.pos + i)
    }

    /// Find `needle` at or after index `from`
    #[inline]
    pub fn find_from(&self, needle: &str, from: usize) -> Option<usize> {
        let from = from.min(self.input.len());
        memmem::find(&self.input.as_bytes()[from..], needle.as_bytes()).map(|i| from + i)
    }

    /// Check if input starts with `needle` at the cursor
    #[inline]
    pub fn starts_with(&self, needle: &str) -> bool {
        self.input.as_bytes()[self.pos..].starts_with(needle.as_bytes())
    }

    /// Unread remainder of the buffer
    #[inline]
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Get a slice between two buffer indices
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Bulk-advance to `index`, counting any line breaks on the way.
    ///
    /// Indices past the end clamp to the end.
    pub fn advance_to(&mut self, index: usize) -> Position {
        let bytes = self.input.as_bytes();
        let end = index.min(bytes.len());
        let mut i = self.pos;

        while i < end {
            match bytes[i] {
                b'\r' => {
                    self.line += 1;
                    self.column = 1;
                }
                // LF completing a CRLF was already counted with the CR
                b'\n' if i > 0 && bytes[i - 1] == b'\r' => {}
                b'\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                b if b & 0xC0 == 0x80 => {}
                _ => self.column += 1,
            }
            i += 1;
        }

        self.pos = end.max(self.pos);
        self.position()
    }

    /// Advance by n bytes
    #[inline]
    pub fn advance(&mut self, n: usize) -> Position {
        self.advance_to(self.pos + n)
    }

    /// Skip whitespace characters (space, tab, newline, carriage return)
    pub fn skip_whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        let mut end = self.pos;
        while end < bytes.len() && is_whitespace(bytes[end]) {
            end += 1;
        }
        self.advance_to(end);
    }

    /// Read an XML name at the cursor
    pub fn read_name(&mut self) -> Result<&'a str, XmlError> {
        let first = match self.peek() {
            Some(b) => b,
            None => {
                return Err(XmlError::new(
                    ErrorCode::Eof,
                    self.position(),
                    "Unexpected EOF while reading name",
                )
                .truncated())
            }
        };
        if !is_name_start_char(first) {
            return Err(XmlError::new(ErrorCode::NameStart, self.position(), "Invalid XML name start"));
        }

        let bytes = self.input.as_bytes();
        let start = self.pos;
        let mut end = start + 1;
        while end < bytes.len() && is_name_char(bytes[end]) {
            end += 1;
        }
        self.advance_to(end);
        Ok(&self.input[start..end])
    }
}

/// XML whitespace: space, tab, LF, CR
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}
