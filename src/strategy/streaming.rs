//! Streaming XML Tokenizer
//!
//! Stateful tokenizer that accepts input in arbitrary chunks. Output is the
//! same token sequence as tokenizing the concatenated input in one call, no
//! matter where the chunk boundaries fall.
//!
//! Each write appends to a buffer and re-tokenizes it from the start:
//! - a trailing text token is held back, since the run may still grow
//! - an error caused by running out of input keeps the incomplete markup
//!   in the buffer until more data arrives
//! - everything before that point is emitted and dropped from the buffer,
//!   advancing the base position that seeds the next pass

use crate::core::encoding::Utf8ChunkDecoder;
use crate::core::error::{ErrorCode, XmlError};
use crate::core::names::NamePool;
use crate::core::options::TokenizerOptions;
use crate::core::position::{advance_position, Position};
use crate::core::tokenizer::{Token, Tokenizer};
use log::{debug, trace};
use memchr::memrchr;

/// One piece of streamed input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'c> {
    /// Already-decoded text, appended verbatim
    Str(&'c str),
    /// UTF-8 bytes; a boundary may split a multi-byte sequence
    Bytes(&'c [u8]),
}

impl<'c> From<&'c str> for Chunk<'c> {
    fn from(s: &'c str) -> Self {
        Chunk::Str(s)
    }
}

impl<'c> From<&'c String> for Chunk<'c> {
    fn from(s: &'c String) -> Self {
        Chunk::Str(s.as_str())
    }
}

impl<'c> From<&'c [u8]> for Chunk<'c> {
    fn from(b: &'c [u8]) -> Self {
        Chunk::Bytes(b)
    }
}

impl<'c, const N: usize> From<&'c [u8; N]> for Chunk<'c> {
    fn from(b: &'c [u8; N]) -> Self {
        Chunk::Bytes(b)
    }
}

impl<'c> From<&'c Vec<u8>> for Chunk<'c> {
    fn from(b: &'c Vec<u8>) -> Self {
        Chunk::Bytes(b.as_slice())
    }
}

/// Outcome of one tokenization pass over the buffer
struct Pass {
    /// Bytes at the front of the buffer that are fully tokenized
    consumed: usize,
    /// Whether the pass stopped at markup cut off by the end of the buffer
    incomplete: bool,
}

/// Chunk-resumable tokenizer
pub struct StreamingTokenizer {
    options: TokenizerOptions,
    /// Text not yet turned into tokens
    buffer: String,
    /// Position of `buffer[0]` in the whole stream
    base: Position,
    decoder: Utf8ChunkDecoder,
}

impl StreamingTokenizer {
    /// Create a new streaming tokenizer
    pub fn new(options: TokenizerOptions) -> Self {
        StreamingTokenizer {
            options,
            buffer: String::with_capacity(8192),
            base: Position::START,
            decoder: Utf8ChunkDecoder::new(),
        }
    }

    /// Options every pass is tokenized with
    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    /// Feed a chunk and return the tokens it completed
    ///
    /// Errors that more input could resolve are held back; any other error
    /// is returned immediately and the session should be abandoned.
    pub fn write<'c>(
        &mut self,
        chunk: impl Into<Chunk<'c>>,
        pool: &mut NamePool,
    ) -> Result<Vec<Token>, XmlError> {
        match chunk.into() {
            Chunk::Str(text) => {
                // Bytes still pending belong before this text
                if self.decoder.has_pending() {
                    let tail = self.decoder.finish();
                    self.buffer.push_str(&tail);
                }
                if !text.is_empty() {
                    self.decoder.mark_started();
                }
                self.buffer.push_str(text);
            }
            Chunk::Bytes(bytes) => {
                let text = self.decoder.feed(bytes);
                self.buffer.push_str(&text);
            }
        }

        let mut tokens = Vec::new();
        let pass = self.tokenize_buffer(pool, true, &mut tokens)?;
        self.consume(pass.consumed);
        Ok(tokens)
    }

    /// Finish the stream, flushing held-back text
    ///
    /// Markup still cut off at this point fails with
    /// `XML_STREAMING_INCOMPLETE` at the end of the input.
    pub fn end(&mut self, pool: &mut NamePool) -> Result<Vec<Token>, XmlError> {
        let tail = self.decoder.finish();
        self.buffer.push_str(&tail);

        if self.buffer.is_empty() {
            debug!("streaming tokenizer ended at offset {}", self.base.offset);
            return Ok(Vec::new());
        }

        let mut tokens = Vec::new();
        let pass = self.tokenize_buffer(pool, false, &mut tokens)?;
        if pass.incomplete {
            let end = advance_position(self.base, &self.buffer, self.buffer.len());
            debug!(
                "streaming tokenizer ended with {} bytes of incomplete markup",
                self.buffer.len() - pass.consumed
            );
            return Err(XmlError::new(
                ErrorCode::StreamingIncomplete,
                end,
                "Streaming tokenizer ended with incomplete markup",
            ));
        }

        // Anything past the last token was skipped and is final now
        self.consume(self.buffer.len());
        debug!("streaming tokenizer ended at offset {}", self.base.offset);
        Ok(tokens)
    }

    /// Bytes buffered but not yet tokenized
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Whether any input (text or undecoded bytes) awaits tokenization
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty() || self.decoder.has_pending()
    }

    /// Position of the first byte not yet tokenized
    pub fn position(&self) -> Position {
        self.base
    }

    fn tokenize_buffer(
        &self,
        pool: &mut NamePool,
        defer_trailing_text: bool,
        out: &mut Vec<Token>,
    ) -> Result<Pass, XmlError> {
        let base = self.base.offset;
        let mut last_end = 0;
        let mut pending: Option<Token> = None;

        for result in Tokenizer::with_start(&self.buffer, &self.options, pool, self.base) {
            match result {
                Ok(token) => {
                    last_end = token.span().end - base;
                    if let Some(prev) = pending.replace(token) {
                        out.push(prev);
                    }
                }
                Err(e) if e.is_truncated() => {
                    trace!(
                        "retaining {} bytes after {} at offset {}",
                        self.buffer.len() - last_end,
                        e.code,
                        e.position.offset
                    );
                    out.extend(pending);
                    return Ok(Pass {
                        consumed: last_end,
                        incomplete: true,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if defer_trailing_text {
            if let Some(Token::Text { span, .. }) = &pending {
                if span.end - base == self.buffer.len() {
                    let start = span.start - base;
                    trace!("deferring {} bytes of trailing text", self.buffer.len() - start);
                    return Ok(Pass {
                        consumed: start,
                        incomplete: false,
                    });
                }
            }
        }

        out.extend(pending);

        // Skipped comments and PIs after the last token are complete; the
        // whitespace after them may still start a text run
        let tail = &self.buffer.as_bytes()[last_end..];
        let consumed = match memrchr(b'>', tail) {
            Some(i) => last_end + i + 1,
            None => last_end,
        };
        Ok(Pass {
            consumed,
            incomplete: false,
        })
    }

    /// Drop the first `consumed` bytes, moving the base position past them
    fn consume(&mut self, consumed: usize) {
        if consumed == 0 {
            return;
        }
        trace!("consumed {} of {} buffered bytes", consumed, self.buffer.len());
        self.base = advance_position(self.base, &self.buffer, consumed);
        self.buffer.drain(..consumed);
    }
}
