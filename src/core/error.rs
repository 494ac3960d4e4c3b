//! XML Error Types
//!
//! Every failure carries a stable code, the source position it refers to and
//! a human-readable message. Errors are fatal: nothing is repaired or
//! skipped.

use super::position::Position;
use std::fmt;

/// Stable error codes
///
/// The string form returned by [`ErrorCode::as_str`] is part of the public
/// contract and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Lexical
    NameStart,
    AttrQuote,
    AttrEq,
    AttrUnterminated,
    TagUnterminated,
    CloseTagGt,
    TagEnd,
    CommentUnterminated,
    PiUnterminated,
    BangUnsupported,
    DtdRejected,
    Eof,
    // Entity
    EntityUnterminated,
    EntityUnknown,
    EntityBad,
    // Structural
    MultipleRoots,
    TextBeforeRoot,
    TextAfterRoot,
    UnexpectedCloseTag,
    TagMismatch,
    UnclosedTags,
    DepthLimit,
    TokenLimit,
    NoRoot,
    // Streaming
    StreamingIncomplete,
    // Construction
    InvalidSpan,
}

impl ErrorCode {
    /// The stable `XML_*` code string
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NameStart => "XML_NAME_START",
            ErrorCode::AttrQuote => "XML_ATTR_QUOTE",
            ErrorCode::AttrEq => "XML_ATTR_EQ",
            ErrorCode::AttrUnterminated => "XML_ATTR_UNTERMINATED",
            ErrorCode::TagUnterminated => "XML_TAG_UNTERMINATED",
            ErrorCode::CloseTagGt => "XML_CLOSETAG_GT",
            ErrorCode::TagEnd => "XML_TAG_END",
            ErrorCode::CommentUnterminated => "XML_COMMENT_UNTERMINATED",
            ErrorCode::PiUnterminated => "XML_PI_UNTERMINATED",
            ErrorCode::BangUnsupported => "XML_BANG_UNSUPPORTED",
            ErrorCode::DtdRejected => "XML_DTD_REJECTED",
            ErrorCode::Eof => "XML_EOF",
            ErrorCode::EntityUnterminated => "XML_ENTITY_UNTERMINATED",
            ErrorCode::EntityUnknown => "XML_ENTITY_UNKNOWN",
            ErrorCode::EntityBad => "XML_ENTITY_BAD",
            ErrorCode::MultipleRoots => "XML_MULTIPLE_ROOTS",
            ErrorCode::TextBeforeRoot => "XML_TEXT_BEFORE_ROOT",
            ErrorCode::TextAfterRoot => "XML_TEXT_AFTER_ROOT",
            ErrorCode::UnexpectedCloseTag => "XML_UNEXPECTED_CLOSETAG",
            ErrorCode::TagMismatch => "XML_TAG_MISMATCH",
            ErrorCode::UnclosedTags => "XML_UNCLOSED_TAGS",
            ErrorCode::DepthLimit => "XML_DEPTH_LIMIT",
            ErrorCode::TokenLimit => "XML_TOKEN_LIMIT",
            ErrorCode::NoRoot => "XML_NO_ROOT",
            ErrorCode::StreamingIncomplete => "XML_STREAMING_INCOMPLETE",
            ErrorCode::InvalidSpan => "XML_INVALID_SPAN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal parse error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlError {
    pub code: ErrorCode,
    pub position: Position,
    pub message: String,
    /// Set when the scanner ran out of input while producing this error
    truncated: bool,
}

impl XmlError {
    pub fn new(code: ErrorCode, position: Position, message: impl Into<String>) -> Self {
        XmlError {
            code,
            position,
            message: message.into(),
            truncated: false,
        }
    }

    /// Mark this error as caused by reaching the end of the available input.
    ///
    /// Only such errors may be retried by the streaming tokenizer once more
    /// data has arrived.
    pub(crate) fn truncated(mut self) -> Self {
        self.truncated = true;
        self
    }

    /// Mark this error as truncated when `at_end` holds
    pub(crate) fn truncated_if(self, at_end: bool) -> Self {
        if at_end {
            self.truncated()
        } else {
            self
        }
    }

    /// Whether more input could have avoided this error
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Byte offset of the error in the whole input
    pub fn offset(&self) -> usize {
        self.position.offset
    }
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{} (offset {}): {}",
            self.code, self.position.line, self.position.column, self.position.offset, self.message
        )
    }
}

impl std::error::Error for XmlError {}
