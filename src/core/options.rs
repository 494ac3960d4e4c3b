//! Tokenizer and parser configuration
//!
//! Plain immutable values. Build them with `Default` and the chained
//! `with_*` methods.

use super::entities::EntityResolver;
use std::fmt;

/// Options controlling how the tokenizer scans text and markup
#[derive(Clone)]
pub struct TokenizerOptions {
    /// Strip leading/trailing whitespace from text runs
    pub trim_text: bool,
    /// Drop text runs that are entirely whitespace after trimming
    pub skip_whitespace_text: bool,
    /// Decode entity references in text and attribute values
    pub decode_entities: bool,
    /// Emit comment and PI tokens instead of skipping them
    pub emit_non_content_events: bool,
    /// Fallback for named entities outside the built-in set
    pub entity_resolver: Option<EntityResolver>,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        TokenizerOptions {
            trim_text: true,
            skip_whitespace_text: true,
            decode_entities: true,
            emit_non_content_events: false,
            entity_resolver: None,
        }
    }
}

impl TokenizerOptions {
    pub fn with_trim_text(mut self, yes: bool) -> Self {
        self.trim_text = yes;
        self
    }

    pub fn with_skip_whitespace_text(mut self, yes: bool) -> Self {
        self.skip_whitespace_text = yes;
        self
    }

    pub fn with_decode_entities(mut self, yes: bool) -> Self {
        self.decode_entities = yes;
        self
    }

    pub fn with_emit_non_content_events(mut self, yes: bool) -> Self {
        self.emit_non_content_events = yes;
        self
    }

    pub fn with_entity_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.entity_resolver = Some(std::sync::Arc::new(resolver));
        self
    }

    /// Keep every text run verbatim: no trimming, no whitespace skipping
    pub fn raw_text() -> Self {
        Self::default().with_trim_text(false).with_skip_whitespace_text(false)
    }
}

impl fmt::Debug for TokenizerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenizerOptions")
            .field("trim_text", &self.trim_text)
            .field("skip_whitespace_text", &self.skip_whitespace_text)
            .field("decode_entities", &self.decode_entities)
            .field("emit_non_content_events", &self.emit_non_content_events)
            .field("entity_resolver", &self.entity_resolver.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Options controlling structural validation in the stream parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Surface comments and PIs as events
    pub emit_non_content_events: bool,
    /// Require exactly one top-level element (document mode)
    pub require_single_root: bool,
    /// Nesting ceiling
    pub max_depth: usize,
    /// Total token ceiling for one parse
    pub max_tokens: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            emit_non_content_events: false,
            require_single_root: true,
            max_depth: 4096,
            max_tokens: 1_000_000,
        }
    }
}

impl ParserOptions {
    pub fn with_emit_non_content_events(mut self, yes: bool) -> Self {
        self.emit_non_content_events = yes;
        self
    }

    pub fn with_require_single_root(mut self, yes: bool) -> Self {
        self.require_single_root = yes;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let t = TokenizerOptions::default();
        assert!(t.trim_text && t.skip_whitespace_text && t.decode_entities);
        assert!(!t.emit_non_content_events);
        assert!(t.entity_resolver.is_none());

        let p = ParserOptions::default();
        assert!(p.require_single_root);
        assert_eq!(p.max_depth, 4096);
        assert_eq!(p.max_tokens, 1_000_000);
    }

    #[test]
    fn test_builders() {
        let t = TokenizerOptions::raw_text().with_entity_resolver(|_| None);
        assert!(!t.trim_text);
        assert!(!t.skip_whitespace_text);
        assert!(t.entity_resolver.is_some());
        assert!(format!("{:?}", t).contains("<fn>"));

        let p = ParserOptions::default().with_max_depth(1).with_require_single_root(false);
        assert_eq!(p.max_depth, 1);
        assert!(!p.require_single_root);
    }
}
