//! Input Strategies
//!
//! Whole-string input is tokenized directly by `core::tokenizer`. This module
//! holds the chunk-resumable variant for input that arrives in pieces.

pub mod streaming;

pub use streaming::{Chunk, StreamingTokenizer};
