//! XML Tokenizer - pull-based token extraction from an in-memory string
//!
//! Produces a lazy sequence of tokens:
//! - Element open tags (with decoded attributes) and close tags
//! - Text runs, normalized by the trim/whitespace policies
//! - Comments and processing instructions (when enabled)
//!
//! DOCTYPE is always rejected and other `<!...>` declarations are
//! unsupported. The sequence is not restartable: once exhausted, or after
//! the first error, it yields nothing more.
//!
//! Errors raised because the buffer ended in the middle of a construct are
//! flagged as truncated so the streaming tokenizer can retry them once more
//! input arrives.

use super::entities::decode_xml_entities;
use super::error::{ErrorCode, XmlError};
use super::names::{NameId, NamePool};
use super::options::TokenizerOptions;
use super::position::{advance_position, Position};
use super::scanner::{is_whitespace, Cursor};
use super::span::Span;
use std::iter::FusedIterator;

/// An attribute with its entity-decoded value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: NameId,
    pub value: String,
}

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Element start tag: <element> or <element/>
    Open,
    /// Element end tag: </element>
    Close,
    /// Text content
    Text,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    Pi,
}

impl TokenKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Open => "open",
            TokenKind::Close => "close",
            TokenKind::Text => "text",
            TokenKind::Comment => "comment",
            TokenKind::Pi => "pi",
        }
    }
}

/// A lexical token, not yet structurally validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open {
        name: NameId,
        attrs: Vec<Attr>,
        self_closing: bool,
        span: Span,
    },
    Close {
        name: NameId,
        span: Span,
    },
    Text {
        value: String,
        span: Span,
    },
    Comment {
        span: Span,
    },
    Pi {
        span: Span,
    },
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Open { .. } => TokenKind::Open,
            Token::Close { .. } => TokenKind::Close,
            Token::Text { .. } => TokenKind::Text,
            Token::Comment { .. } => TokenKind::Comment,
            Token::Pi { .. } => TokenKind::Pi,
        }
    }

    /// Source range covered by this token
    ///
    /// Tags cover `<` through `>`; text covers the raw run before trimming.
    pub fn span(&self) -> &Span {
        match self {
            Token::Open { span, .. }
            | Token::Close { span, .. }
            | Token::Text { span, .. }
            | Token::Comment { span }
            | Token::Pi { span } => span,
        }
    }

    /// Element name for open/close tokens
    pub fn name(&self) -> Option<NameId> {
        match self {
            Token::Open { name, .. } | Token::Close { name, .. } => Some(*name),
            _ => None,
        }
    }
}

/// Tokenizer over a complete string
///
/// Implements `Iterator<Item = Result<Token, XmlError>>`.
pub struct Tokenizer<'a, 'p> {
    cursor: Cursor<'a>,
    options: &'a TokenizerOptions,
    pool: &'p mut NamePool,
    done: bool,
}

impl<'a, 'p> Tokenizer<'a, 'p> {
    /// Create a tokenizer for a whole document
    pub fn new(input: &'a str, options: &'a TokenizerOptions, pool: &'p mut NamePool) -> Self {
        Self::with_start(input, options, pool, Position::START)
    }

    /// Create a tokenizer whose input begins at `start` of a larger stream
    pub fn with_start(
        input: &'a str,
        options: &'a TokenizerOptions,
        pool: &'p mut NamePool,
        start: Position,
    ) -> Self {
        Tokenizer {
            cursor: Cursor::with_start(input, start),
            options,
            pool,
            done: false,
        }
    }

    /// Position of the next unscanned byte
    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    /// The pool names are interned into
    pub fn pool(&self) -> &NamePool {
        self.pool
    }

    fn next_token(&mut self) -> Result<Option<Token>, XmlError> {
        while !self.cursor.is_eof() {
            let (until, at_end) = match self.cursor.find_byte(b'<') {
                Some(lt) => (lt, false),
                None => (self.cursor.len(), true),
            };

            if until > self.cursor.index() {
                if let Some(token) = self.scan_text(until, at_end)? {
                    return Ok(Some(token));
                }
                continue;
            }

            if let Some(token) = self.scan_markup()? {
                return Ok(Some(token));
            }
        }
        Ok(None)
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Scan the text run up to `until`, applying trim and whitespace policy
    fn scan_text(&mut self, until: usize, at_end: bool) -> Result<Option<Token>, XmlError> {
        let start = self.cursor.position();
        let raw = self.cursor.slice(self.cursor.index(), until);
        let end = self.cursor.advance_to(until);

        let (body, leading) = if self.options.trim_text {
            let trimmed_start = raw.trim_start_matches(is_ws_char);
            (trimmed_start.trim_end_matches(is_ws_char), raw.len() - trimmed_start.len())
        } else {
            (raw, 0)
        };

        if body.is_empty() {
            return Ok(None);
        }
        if self.options.skip_whitespace_text && body.bytes().all(is_whitespace) {
            return Ok(None);
        }

        let value = if self.options.decode_entities {
            let base = advance_position(start, raw, leading);
            decode_xml_entities(body, base, self.options.entity_resolver.as_ref())
                .map_err(|e| {
                    // More input could still supply the missing ';'
                    let retry = at_end && e.code == ErrorCode::EntityUnterminated;
                    e.truncated_if(retry)
                })?
                .into_owned()
        } else {
            body.to_string()
        };

        Ok(Some(Token::Text {
            value,
            span: Span::between(start, end),
        }))
    }

    // ========================================================================
    // Markup
    // ========================================================================

    /// Scan one markup construct starting at `<`
    fn scan_markup(&mut self) -> Result<Option<Token>, XmlError> {
        let start = self.cursor.position();
        self.cursor.advance(1);

        match self.cursor.peek() {
            None => Err(XmlError::new(ErrorCode::Eof, start, "Unexpected EOF after '<'").truncated()),
            Some(b'!') => {
                self.cursor.advance(1);
                self.scan_bang(start)
            }
            Some(b'?') => {
                self.cursor.advance(1);
                let span = self.skip_past(
                    "?>",
                    start,
                    ErrorCode::PiUnterminated,
                    "Unterminated processing instruction",
                )?;
                Ok(self.options.emit_non_content_events.then_some(Token::Pi { span }))
            }
            Some(b'/') => {
                self.cursor.advance(1);
                self.scan_close_tag(start).map(Some)
            }
            Some(_) => self.scan_open_tag(start).map(Some),
        }
    }

    /// Dispatch on `<!`: comments are scanned, DOCTYPE rejected, anything else unsupported
    fn scan_bang(&mut self, start: Position) -> Result<Option<Token>, XmlError> {
        if self.cursor.starts_with("--") {
            self.cursor.advance(2);
            let span = self.skip_past("-->", start, ErrorCode::CommentUnterminated, "Unterminated comment")?;
            return Ok(self.options.emit_non_content_events.then_some(Token::Comment { span }));
        }

        if self.cursor.starts_with("DOCTYPE") || self.cursor.starts_with("doctype") {
            return Err(XmlError::new(
                ErrorCode::DtdRejected,
                start,
                "DOCTYPE/DTD is rejected by policy",
            ));
        }

        // The buffer may end part way into "<!--" or "<!DOCTYPE"
        let rest = self.cursor.remaining();
        if ["--", "DOCTYPE", "doctype"]
            .iter()
            .any(|keyword| keyword.len() > rest.len() && keyword.starts_with(rest))
        {
            return Err(XmlError::new(
                ErrorCode::Eof,
                start,
                "Unexpected EOF in markup declaration",
            )
            .truncated());
        }

        Err(XmlError::new(
            ErrorCode::BangUnsupported,
            start,
            "Unsupported markup declaration",
        ))
    }

    /// Advance past the next `terminator`, returning the span from `start`
    fn skip_past(
        &mut self,
        terminator: &str,
        start: Position,
        code: ErrorCode,
        message: &str,
    ) -> Result<Span, XmlError> {
        match self.cursor.find_from(terminator, self.cursor.index()) {
            Some(idx) => {
                let end = self.cursor.advance_to(idx + terminator.len());
                Ok(Span::between(start, end))
            }
            None => Err(XmlError::new(code, start, message).truncated()),
        }
    }

    /// Scan a close tag; positioned after `</`
    fn scan_close_tag(&mut self, start: Position) -> Result<Token, XmlError> {
        self.cursor.skip_whitespace();
        let name = self.cursor.read_name()?;
        self.cursor.skip_whitespace();
        self.cursor.expect_byte(b'>', ErrorCode::CloseTagGt, "Expected '>'")?;

        Ok(Token::Close {
            name: self.pool.intern(name),
            span: Span::between(start, self.cursor.position()),
        })
    }

    /// Scan an open tag with its attributes; positioned after `<`
    fn scan_open_tag(&mut self, start: Position) -> Result<Token, XmlError> {
        self.cursor.skip_whitespace();
        let name = self.cursor.read_name()?;

        // Names are interned only once the whole tag has been scanned
        let mut attrs: Vec<(&'a str, String)> = Vec::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                None => {
                    return Err(XmlError::new(
                        ErrorCode::TagUnterminated,
                        start,
                        "Unterminated start tag",
                    )
                    .truncated())
                }
                Some(b'/') => {
                    self.cursor.advance(1);
                    self.cursor
                        .expect_byte(b'>', ErrorCode::TagEnd, "Expected '>' after '/'")?;
                    return Ok(self.finish_open_tag(name, attrs, true, start));
                }
                Some(b'>') => {
                    self.cursor.advance(1);
                    return Ok(self.finish_open_tag(name, attrs, false, start));
                }
                Some(_) => {
                    let attr_name = self.cursor.read_name()?;
                    self.cursor.skip_whitespace();
                    self.cursor.expect_byte(
                        b'=',
                        ErrorCode::AttrEq,
                        "Expected '=' after attribute name",
                    )?;
                    self.cursor.skip_whitespace();
                    let value = self.read_attr_value()?;
                    attrs.push((attr_name, value));
                }
            }
        }
    }

    fn finish_open_tag(
        &mut self,
        name: &str,
        attrs: Vec<(&'a str, String)>,
        self_closing: bool,
        start: Position,
    ) -> Token {
        let name = self.pool.intern(name);
        let attrs = attrs
            .into_iter()
            .map(|(attr_name, value)| Attr {
                name: self.pool.intern(attr_name),
                value,
            })
            .collect();

        Token::Open {
            name,
            attrs,
            self_closing,
            span: Span::between(start, self.cursor.position()),
        }
    }

    /// Read a quoted attribute value and decode it
    fn read_attr_value(&mut self) -> Result<String, XmlError> {
        let quote = match self.cursor.next_byte() {
            Some(q @ (b'"' | b'\'')) => q,
            Some(_) => {
                return Err(XmlError::new(
                    ErrorCode::AttrQuote,
                    self.cursor.position(),
                    "Expected attribute quote",
                ))
            }
            None => {
                return Err(XmlError::new(
                    ErrorCode::AttrQuote,
                    self.cursor.position(),
                    "Expected attribute quote",
                )
                .truncated())
            }
        };

        let value_start = self.cursor.position();
        let from = self.cursor.index();
        let close = match self.cursor.find_byte(quote) {
            Some(idx) => idx,
            None => {
                return Err(XmlError::new(
                    ErrorCode::AttrUnterminated,
                    value_start,
                    "Unterminated attribute value",
                )
                .truncated())
            }
        };

        let raw = self.cursor.slice(from, close);
        self.cursor.advance_to(close + 1);

        if self.options.decode_entities {
            let decoded =
                decode_xml_entities(raw, value_start, self.options.entity_resolver.as_ref())?;
            Ok(decoded.into_owned())
        } else {
            Ok(raw.to_string())
        }
    }
}

impl Iterator for Tokenizer<'_, '_> {
    type Item = Result<Token, XmlError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Tokenizer<'_, '_> {}

/// Tokenize a whole string, collecting every token
pub fn tokenize(
    input: &str,
    options: &TokenizerOptions,
    pool: &mut NamePool,
) -> Result<Vec<Token>, XmlError> {
    Tokenizer::new(input, options, pool).collect()
}

#[inline]
fn is_ws_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str, options: &TokenizerOptions) -> (NamePool, Vec<Token>) {
        let mut pool = NamePool::new();
        let tokens = tokenize(input, options, &mut pool).unwrap();
        (pool, tokens)
    }

    fn error(input: &str) -> XmlError {
        let mut pool = NamePool::new();
        tokenize(input, &TokenizerOptions::default(), &mut pool).unwrap_err()
    }

    #[test]
    fn test_element_and_text_tokens() {
        let input = r#"<a x="1">hi</a>"#;
        let (pool, tokens) = tokens(input, &TokenizerOptions::default());
        assert_eq!(tokens.len(), 3);

        match &tokens[0] {
            Token::Open { name, attrs, self_closing, span } => {
                assert_eq!(pool.resolve(*name), Ok("a"));
                assert_eq!(attrs.len(), 1);
                assert_eq!(pool.resolve(attrs[0].name), Ok("x"));
                assert_eq!(attrs[0].value, "1");
                assert!(!self_closing);
                assert_eq!((span.start, span.end), (0, 9));
            }
            other => panic!("expected open, got {:?}", other),
        }
        assert!(matches!(&tokens[1], Token::Text { value, .. } if value == "hi"));
        assert_eq!(tokens[2].kind(), TokenKind::Close);
        assert_eq!(tokens[2].span().end, input.len());
    }

    #[test]
    fn test_self_closing() {
        let (_, tokens) = tokens("<a/>", &TokenizerOptions::default());
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], Token::Open { self_closing: true, .. }));
    }

    #[test]
    fn test_whitespace_around_attrs() {
        let (pool, tokens) = tokens("<a\n  b = 'x'\tc=\"y\" ></ a >", &TokenizerOptions::default());
        assert_eq!(tokens.len(), 2);
        match &tokens[0] {
            Token::Open { attrs, .. } => {
                assert_eq!(pool.resolve(attrs[1].name), Ok("c"));
                assert_eq!(attrs[1].value, "y");
            }
            other => panic!("expected open, got {:?}", other),
        }
        assert_eq!(tokens[1].name(), tokens[0].name());
    }

    #[test]
    fn test_entities_decoded() {
        let (_, tokens) = tokens(r#"<a t="&quot;&#65;">&lt;A&#x41;B</a>"#, &TokenizerOptions::default());
        match &tokens[0] {
            Token::Open { attrs, .. } => assert_eq!(attrs[0].value, "\"A"),
            other => panic!("expected open, got {:?}", other),
        }
        assert!(matches!(&tokens[1], Token::Text { value, .. } if value == "<AAB"));
    }

    #[test]
    fn test_decode_disabled() {
        let options = TokenizerOptions::default().with_decode_entities(false);
        let (_, tokens) = tokens("<a>&nope;</a>", &options);
        assert!(matches!(&tokens[1], Token::Text { value, .. } if value == "&nope;"));
    }

    #[test]
    fn test_entity_error_offset_after_trim() {
        let err = error("  &nope;");
        assert_eq!(err.code, ErrorCode::EntityUnknown);
        assert_eq!(err.offset(), 2);
        assert!(!err.is_truncated());
    }

    #[test]
    fn test_error_line_column() {
        let err = error("<a>\n<1>");
        assert_eq!(err.code, ErrorCode::NameStart);
        assert_eq!((err.position.line, err.position.column), (2, 2));
    }

    #[test]
    fn test_invalid_numeric_entity() {
        assert_eq!(error("<a>&#xD800;</a>").code, ErrorCode::EntityBad);
    }

    #[test]
    fn test_doctype_rejected() {
        assert_eq!(error("<!DOCTYPE a><a/>").code, ErrorCode::DtdRejected);
        assert_eq!(error("<!doctype a><a/>").code, ErrorCode::DtdRejected);
        let err = error("<!ELEMENT a ANY>");
        assert_eq!(err.code, ErrorCode::BangUnsupported);
        assert!(!err.is_truncated());
    }

    #[test]
    fn test_comment_and_pi() {
        let input = "<!--x--><?y?><a/>";
        let (_, skipped) = tokens(input, &TokenizerOptions::default());
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].kind(), TokenKind::Open);

        let options = TokenizerOptions::default().with_emit_non_content_events(true);
        let (_, emitted) = tokens(input, &options);
        let kinds: Vec<_> = emitted.iter().map(|t| t.kind().as_str()).collect();
        assert_eq!(kinds, vec!["comment", "pi", "open"]);
        assert_eq!((emitted[0].span().start, emitted[0].span().end), (0, 8));
    }

    #[test]
    fn test_skipped_comment_must_terminate() {
        let err = error("<a><!-- never closed");
        assert_eq!(err.code, ErrorCode::CommentUnterminated);
        assert_eq!(err.offset(), 3);
        assert!(err.is_truncated());
    }

    #[test]
    fn test_whitespace_text_skipped() {
        let (_, tokens) = tokens(" \n<a/> \n", &TokenizerOptions::default());
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn test_raw_text_kept() {
        let (_, tokens) = tokens("<a> x <b/>\n</a>", &TokenizerOptions::raw_text());
        let texts: Vec<_> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Text { value, .. } => Some(value.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec![" x ", "\n"]);
    }

    #[test]
    fn test_trim_without_skip() {
        let options = TokenizerOptions::default().with_skip_whitespace_text(false);
        let (_, tokens) = tokens("<a>  hi  <b/>   </a>", &options);
        // Whitespace-only runs trim to nothing and are dropped anyway
        assert_eq!(tokens.len(), 4);
        match &tokens[1] {
            Token::Text { value, span } => {
                assert_eq!(value, "hi");
                assert_eq!((span.start, span.end), (3, 9));
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_skip_without_trim() {
        let options = TokenizerOptions::default().with_trim_text(false);
        let (_, tokens) = tokens("<a>\n  <b> x </b>\n</a>", &options);
        let texts: Vec<_> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Text { value, .. } => Some(value.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec![" x ".to_string()]);
    }

    #[test]
    fn test_spans_carry_lines() {
        let (_, tokens) = tokens("<a>\r\n  <b/>\n</a>", &TokenizerOptions::default());
        let lines = tokens[1].span().lines.unwrap();
        assert_eq!((lines.start.line, lines.start.column), (2, 3));
        assert_eq!((lines.end.line, lines.end.column), (2, 7));
        assert_eq!(tokens[2].span().start_position().line, 3);
    }

    #[test]
    fn test_seeded_start() {
        let options = TokenizerOptions::default();
        let mut pool = NamePool::new();
        let tokens: Vec<_> = Tokenizer::with_start("<a/>", &options, &mut pool, Position::new(10, 2, 5))
            .collect::<Result<_, _>>()
            .unwrap();
        let span = tokens[0].span();
        assert_eq!((span.start, span.end), (10, 14));
        assert_eq!(span.start_position(), Position::new(10, 2, 5));
    }

    #[test]
    fn test_attribute_errors() {
        let err = error("<a b>");
        assert_eq!(err.code, ErrorCode::AttrEq);
        assert!(!err.is_truncated());

        let err = error("<a b=x>");
        assert_eq!(err.code, ErrorCode::AttrQuote);
        assert_eq!(err.offset(), 6);
        assert!(!err.is_truncated());

        let err = error("<a b=\"x");
        assert_eq!(err.code, ErrorCode::AttrUnterminated);
        assert_eq!(err.offset(), 6);
        assert!(err.is_truncated());
    }

    #[test]
    fn test_tag_errors() {
        let err = error("<a/ >");
        assert_eq!(err.code, ErrorCode::TagEnd);
        assert!(!err.is_truncated());

        let err = error("</a x>");
        assert_eq!(err.code, ErrorCode::CloseTagGt);

        let err = error("<root><a");
        assert_eq!(err.code, ErrorCode::TagUnterminated);
        assert_eq!(err.offset(), 6);
        assert!(err.is_truncated());

        let err = error("<a>text<");
        assert_eq!(err.code, ErrorCode::Eof);
        assert_eq!(err.offset(), 7);
        assert!(err.is_truncated());
    }

    #[test]
    fn test_partial_bang_is_truncated() {
        for input in ["<!", "<!-", "<!DOC", "<!doctyp"] {
            let err = error(input);
            assert_eq!(err.code, ErrorCode::Eof, "input {:?}", input);
            assert!(err.is_truncated());
        }
        assert_eq!(error("<!D>").code, ErrorCode::BangUnsupported);
    }

    #[test]
    fn test_trailing_unterminated_entity_is_truncated() {
        let err = error("<a>x &am");
        assert_eq!(err.code, ErrorCode::EntityUnterminated);
        assert!(err.is_truncated());

        let err = error("<a>x &am</a>");
        assert!(!err.is_truncated());
    }

    #[test]
    fn test_partial_tag_interns_nothing() {
        let mut pool = NamePool::new();
        let options = TokenizerOptions::default();
        assert!(tokenize("<item id=\"1", &options, &mut pool).is_err());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_fused_after_error() {
        let mut pool = NamePool::new();
        let options = TokenizerOptions::default();
        let mut tokenizer = Tokenizer::new("<a><1><b/>", &options, &mut pool);
        assert!(matches!(tokenizer.next(), Some(Ok(_))));
        assert!(matches!(tokenizer.next(), Some(Err(_))));
        assert!(tokenizer.next().is_none());
    }

    #[test]
    fn test_entity_resolver() {
        let options = TokenizerOptions::default()
            .with_entity_resolver(|name: &str| (name == "nbsp").then(|| "\u{A0}".to_string()));
        let (_, tokens) = tokens("<a t=\"x&nbsp;y\">&nbsp;z</a>", &options);
        match &tokens[0] {
            Token::Open { attrs, .. } => assert_eq!(attrs[0].value, "x\u{A0}y"),
            other => panic!("expected open, got {:?}", other),
        }
        assert!(matches!(&tokens[1], Token::Text { value, .. } if value == "\u{A0}z"));

        let mut pool = NamePool::new();
        let err = tokenize("<a>ok &nope;</a>", &options, &mut pool).unwrap_err();
        assert_eq!(err.code, ErrorCode::EntityUnknown);
        assert_eq!(err.offset(), 6);

        let err = tokenize("<a t=\"&nope;\"/>", &options, &mut pool).unwrap_err();
        assert_eq!(err.code, ErrorCode::EntityUnknown);
        assert_eq!(err.offset(), 6);
    }

    #[test]
    fn test_unterminated_pi() {
        let err = error("<a><?pi");
        assert_eq!(err.code, ErrorCode::PiUnterminated);
        assert_eq!(err.offset(), 3);
        assert!(err.is_truncated());
    }
}
