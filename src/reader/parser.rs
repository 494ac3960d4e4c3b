//! Validating Stream Parser
//!
//! Turns tokens into events while enforcing well-formedness:
//! - open/close tags must nest and match
//! - document mode allows exactly one root element, fragment mode many
//! - text outside the root is rejected in document mode
//! - depth and total token count are capped
//!
//! The parser is a small explicit state machine fed one token at a time.
//! `end()` checks that nothing is left open.

use crate::core::error::{ErrorCode, XmlError};
use crate::core::names::{NameId, NamePool};
use crate::core::options::ParserOptions;
use crate::core::position::Position;
use crate::core::tokenizer::Token;
use crate::reader::events::{EventHandler, XmlEvent};
use log::debug;

/// An element that is open and awaiting its close tag
#[derive(Debug, Clone, Copy)]
struct Frame {
    name: NameId,
    /// Start of the open tag
    opened_at: Position,
}

/// Stream parser state
#[derive(Debug, Clone)]
pub struct StreamParser {
    options: ParserOptions,
    stack: Vec<Frame>,
    token_count: usize,
    seen_root: bool,
    root_closed: bool,
}

impl StreamParser {
    pub fn new(options: ParserOptions) -> Self {
        StreamParser {
            options,
            stack: Vec::with_capacity(32),
            token_count: 0,
            seen_root: false,
            root_closed: false,
        }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Tokens consumed so far
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Whether a top-level element has been opened
    pub fn seen_root(&self) -> bool {
        self.seen_root
    }

    /// Consume one token, delivering any resulting events to `handler`
    ///
    /// `pool` is only used to name elements in error messages.
    pub fn write<H>(&mut self, token: Token, pool: &NamePool, handler: &mut H) -> Result<(), XmlError>
    where
        H: EventHandler + ?Sized,
    {
        self.token_count += 1;
        if self.token_count > self.options.max_tokens {
            return Err(XmlError::new(
                ErrorCode::TokenLimit,
                token.span().start_position(),
                format!("Token limit exceeded ({})", self.options.max_tokens),
            ));
        }

        match token {
            Token::Text { value, span } => {
                if self.options.require_single_root && self.stack.is_empty() {
                    if !self.seen_root {
                        return Err(XmlError::new(
                            ErrorCode::TextBeforeRoot,
                            span.start_position(),
                            "Text is not allowed before the root element",
                        ));
                    }
                    if self.root_closed {
                        return Err(XmlError::new(
                            ErrorCode::TextAfterRoot,
                            span.start_position(),
                            "Text is not allowed after the root element",
                        ));
                    }
                }
                handler.event(XmlEvent::Text { value, span });
            }

            Token::Comment { span } => {
                if self.options.emit_non_content_events {
                    handler.event(XmlEvent::Comment { span });
                }
            }

            Token::Pi { span } => {
                if self.options.emit_non_content_events {
                    handler.event(XmlEvent::ProcessingInstruction { span });
                }
            }

            Token::Open {
                name,
                attrs,
                self_closing,
                span,
            } => {
                if self.stack.is_empty() {
                    if !self.seen_root {
                        self.seen_root = true;
                    } else if self.options.require_single_root {
                        return Err(XmlError::new(
                            ErrorCode::MultipleRoots,
                            span.start_position(),
                            "Multiple top-level elements are not allowed",
                        ));
                    } else {
                        // Fragment mode: a new top-level element reopens the document
                        self.root_closed = false;
                    }
                }

                if self.stack.len() >= self.options.max_depth {
                    return Err(XmlError::new(
                        ErrorCode::DepthLimit,
                        span.start_position(),
                        format!("Max depth exceeded ({})", self.options.max_depth),
                    ));
                }

                handler.event(XmlEvent::StartElement {
                    name,
                    attrs,
                    self_closing,
                    span,
                });

                if self_closing {
                    handler.event(XmlEvent::EndElement { name, span });
                    if self.stack.is_empty() {
                        self.root_closed = true;
                    }
                } else {
                    self.stack.push(Frame {
                        name,
                        opened_at: span.start_position(),
                    });
                }
            }

            Token::Close { name, span } => {
                let frame = match self.stack.pop() {
                    Some(frame) => frame,
                    None => {
                        return Err(XmlError::new(
                            ErrorCode::UnexpectedCloseTag,
                            span.start_position(),
                            format!("Unexpected close tag </{}>", pool.display(name)),
                        ))
                    }
                };
                if frame.name != name {
                    return Err(XmlError::new(
                        ErrorCode::TagMismatch,
                        span.start_position(),
                        format!(
                            "Mismatched close tag </{}>, expected </{}>",
                            pool.display(name),
                            pool.display(frame.name)
                        ),
                    ));
                }

                handler.event(XmlEvent::EndElement { name, span });
                if self.stack.is_empty() {
                    self.root_closed = true;
                }
            }
        }

        Ok(())
    }

    /// Consume every token in order
    pub fn write_all<I, H>(&mut self, tokens: I, pool: &NamePool, handler: &mut H) -> Result<(), XmlError>
    where
        I: IntoIterator<Item = Token>,
        H: EventHandler + ?Sized,
    {
        for token in tokens {
            self.write(token, pool, handler)?;
        }
        Ok(())
    }

    /// Validate end of input: no open elements, and a root in document mode
    pub fn end(&mut self, pool: &NamePool) -> Result<(), XmlError> {
        if let Some(frame) = self.stack.last() {
            return Err(XmlError::new(
                ErrorCode::UnclosedTags,
                frame.opened_at,
                format!("Unclosed tag <{}> (depth={})", pool.display(frame.name), self.stack.len()),
            ));
        }

        if self.options.require_single_root && !self.seen_root {
            return Err(XmlError::new(
                ErrorCode::NoRoot,
                Position::START,
                "No root element found",
            ));
        }

        debug!("stream parser ended after {} tokens", self.token_count);
        Ok(())
    }
}
