//! Core XML lexing primitives
//!
//! This module contains the fundamental building blocks for tokenizing:
//! - Position: line/column bookkeeping across CR, LF and CRLF
//! - Scanner: position-tracking cursor using memchr for delimiter search
//! - Names: name interning pool and name character classes
//! - Entities: strict entity decoding with Cow (zero-copy when possible)
//! - Encoding: incremental UTF-8 decoding for chunked byte input
//! - Tokenizer: pull-based token extraction over a complete string

pub mod encoding;
pub mod entities;
pub mod error;
pub mod names;
pub mod options;
pub mod position;
pub mod scanner;
pub mod span;
pub mod tokenizer;
