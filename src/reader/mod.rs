//! XML Reader Module
//!
//! Structural layer on top of the tokenizers:
//! - Events: validated event types and the handler trait
//! - Parser: nesting, root policy and limit enforcement
//! - Coalesce: optional merging of adjacent text events

pub mod coalesce;
pub mod events;
pub mod parser;
