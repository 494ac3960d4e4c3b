//! xmlstream - chunk-resumable XML tokenizer and validating event parser
//!
//! Pipeline:
//! A: Whole-string parsing (parse_events, parse_fragment, parse_events_to_sink)
//! B: Lazy pull iterator over a string (EventReader)
//! C: Incremental chunked parsing (ChunkedParser, parse_chunks, parse_reader)
//!
//! All entry points produce the same event sequence for the same input,
//! however it is split into chunks. The dialect is deliberately restricted:
//! no DTD, no namespace resolution, built-in and numeric entities plus an
//! optional resolver hook.

pub mod core;
pub mod reader;
pub mod strategy;

pub use crate::core::entities::{decode_xml_entities, EntityResolver};
pub use crate::core::error::{ErrorCode, XmlError};
pub use crate::core::names::{NameId, NamePool, UnknownNameId};
pub use crate::core::options::{ParserOptions, TokenizerOptions};
pub use crate::core::position::{
    advance_position, offset_to_line_column, span_to_line_column, LineColumn, Position, SpanLines,
};
pub use crate::core::span::Span;
pub use crate::core::tokenizer::{tokenize, Attr, Token, TokenKind, Tokenizer};
pub use crate::reader::coalesce::TextCoalescer;
pub use crate::reader::events::{event_signature, EventHandler, XmlEvent, XmlEventKind};
pub use crate::reader::parser::StreamParser;
pub use crate::strategy::streaming::{Chunk, StreamingTokenizer};

use std::collections::VecDeque;
use std::fmt;
use std::io::Read;

/// Buffer size for reading chunks
const DEFAULT_BUFFER_SIZE: usize = 8192;

// ============================================================================
// Options
// ============================================================================

/// Options for the assembled pipeline
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub tokenizer: TokenizerOptions,
    pub parser: ParserOptions,
    /// Merge adjacent text events into one
    pub coalesce_text: bool,
}

impl ParseOptions {
    pub fn with_tokenizer(mut self, tokenizer: TokenizerOptions) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_parser(mut self, parser: ParserOptions) -> Self {
        self.parser = parser;
        self
    }

    /// Surface comments and processing instructions as events
    pub fn with_non_content_events(mut self, yes: bool) -> Self {
        self.tokenizer.emit_non_content_events = yes;
        self.parser.emit_non_content_events = yes;
        self
    }

    pub fn with_coalesce_text(mut self, yes: bool) -> Self {
        self.coalesce_text = yes;
        self
    }

    /// Same options with the single-root requirement lifted
    fn as_fragment(&self) -> Self {
        let mut options = self.clone();
        options.parser.require_single_root = false;
        options
    }
}

/// Result of a collecting parse: the pool the names live in, and the events
#[derive(Debug, Clone)]
pub struct Parsed {
    pub pool: NamePool,
    pub events: Vec<XmlEvent>,
}

impl Parsed {
    /// Signature of every event, for golden comparisons
    pub fn signatures(&self) -> Vec<String> {
        event_signature(&self.events, &self.pool)
    }
}

// ============================================================================
// Strategy A: whole-string parsing
// ============================================================================

/// Parse a complete document into events with a fresh name pool
pub fn parse_events(input: &str, options: &ParseOptions) -> Result<Parsed, XmlError> {
    let mut pool = NamePool::new();
    let events = parse_events_with_pool(input, options, &mut pool)?;
    Ok(Parsed { pool, events })
}

/// Parse a complete document, interning names into an existing pool
pub fn parse_events_with_pool(
    input: &str,
    options: &ParseOptions,
    pool: &mut NamePool,
) -> Result<Vec<XmlEvent>, XmlError> {
    let mut events = Vec::new();
    parse_events_to_sink(input, options, pool, &mut |event: XmlEvent| events.push(event))?;
    Ok(events)
}

/// Parse a fragment: any number of top-level elements and text
pub fn parse_fragment(input: &str, options: &ParseOptions) -> Result<Parsed, XmlError> {
    parse_events(input, &options.as_fragment())
}

/// Parse a complete document, delivering events to `handler` as they occur
///
/// Events before an error have already been delivered when the error is
/// returned.
pub fn parse_events_to_sink<H>(
    input: &str,
    options: &ParseOptions,
    pool: &mut NamePool,
    handler: &mut H,
) -> Result<(), XmlError>
where
    H: EventHandler + ?Sized,
{
    let mut parser = StreamParser::new(options.parser);
    let mut tokenizer = Tokenizer::new(input, &options.tokenizer, pool);

    if options.coalesce_text {
        let mut coalescer = TextCoalescer::new(|event: XmlEvent| handler.event(event));
        while let Some(token) = tokenizer.next() {
            parser.write(token?, tokenizer.pool(), &mut coalescer)?;
        }
        coalescer.flush();
    } else {
        while let Some(token) = tokenizer.next() {
            parser.write(token?, tokenizer.pool(), handler)?;
        }
    }

    parser.end(tokenizer.pool())
}

// ============================================================================
// Strategy B: lazy event iterator
// ============================================================================

/// Queue of events produced but not yet handed out
#[derive(Debug, Default)]
struct EventQueue(VecDeque<XmlEvent>);

impl EventHandler for EventQueue {
    #[inline]
    fn event(&mut self, event: XmlEvent) {
        self.0.push_back(event);
    }
}

/// Pull-based event iterator over a complete string
///
/// Yields `Result<XmlEvent, XmlError>`; the end-of-input checks run once the
/// token stream is exhausted. Stopping early is safe but leaves the
/// document unverified.
pub struct EventReader<'a, 'p> {
    tokenizer: Tokenizer<'a, 'p>,
    parser: StreamParser,
    out: TextCoalescer<EventQueue>,
    coalesce: bool,
    error: Option<XmlError>,
    finished: bool,
}

impl<'a, 'p> EventReader<'a, 'p> {
    pub fn new(input: &'a str, options: &'a ParseOptions, pool: &'p mut NamePool) -> Self {
        EventReader {
            tokenizer: Tokenizer::new(input, &options.tokenizer, pool),
            parser: StreamParser::new(options.parser),
            out: TextCoalescer::new(EventQueue::default()),
            coalesce: options.coalesce_text,
            error: None,
            finished: false,
        }
    }

    /// The pool names are interned into
    pub fn pool(&self) -> &NamePool {
        self.tokenizer.pool()
    }

    /// Advance the tokenizer by one token
    fn pump(&mut self) {
        match self.tokenizer.next() {
            Some(Ok(token)) => {
                let pool = self.tokenizer.pool();
                let result = if self.coalesce {
                    self.parser.write(token, pool, &mut self.out)
                } else {
                    self.parser.write(token, pool, self.out.get_mut())
                };
                if let Err(e) = result {
                    self.fail(e);
                }
            }
            Some(Err(e)) => self.fail(e),
            None => {
                self.finished = true;
                self.out.flush();
                if let Err(e) = self.parser.end(self.tokenizer.pool()) {
                    self.error = Some(e);
                }
            }
        }
    }

    fn fail(&mut self, e: XmlError) {
        self.finished = true;
        self.error = Some(e);
    }
}

impl Iterator for EventReader<'_, '_> {
    type Item = Result<XmlEvent, XmlError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.out.get_mut().0.pop_front() {
                return Some(Ok(event));
            }
            if let Some(e) = self.error.take() {
                return Some(Err(e));
            }
            if self.finished {
                return None;
            }
            self.pump();
        }
    }
}

impl std::iter::FusedIterator for EventReader<'_, '_> {}

// ============================================================================
// Strategy C: chunked input
// ============================================================================

/// Incremental parser for input arriving in chunks
///
/// Owns its name pool. Each `write` returns the events completed by that
/// chunk; `end` flushes and validates.
pub struct ChunkedParser {
    pool: NamePool,
    tokenizer: StreamingTokenizer,
    parser: StreamParser,
    out: TextCoalescer<EventQueue>,
    coalesce: bool,
}

impl ChunkedParser {
    pub fn new(options: ParseOptions) -> Self {
        Self::with_pool(options, NamePool::new())
    }

    /// Create a parser that keeps interning into an existing pool
    pub fn with_pool(options: ParseOptions, pool: NamePool) -> Self {
        ChunkedParser {
            pool,
            parser: StreamParser::new(options.parser),
            coalesce: options.coalesce_text,
            tokenizer: StreamingTokenizer::new(options.tokenizer),
            out: TextCoalescer::new(EventQueue::default()),
        }
    }

    /// Feed one chunk
    pub fn write<'c>(&mut self, chunk: impl Into<Chunk<'c>>) -> Result<Vec<XmlEvent>, XmlError> {
        let tokens = self.tokenizer.write(chunk, &mut self.pool)?;
        self.feed(tokens)?;
        Ok(self.drain())
    }

    /// Finish the input and run the end-of-document checks
    pub fn end(&mut self) -> Result<Vec<XmlEvent>, XmlError> {
        let tokens = self.tokenizer.end(&mut self.pool)?;
        self.feed(tokens)?;
        self.out.flush();
        self.parser.end(&self.pool)?;
        Ok(self.drain())
    }

    pub fn pool(&self) -> &NamePool {
        &self.pool
    }

    pub fn into_pool(self) -> NamePool {
        self.pool
    }

    fn feed(&mut self, tokens: Vec<Token>) -> Result<(), XmlError> {
        for token in tokens {
            if self.coalesce {
                self.parser.write(token, &self.pool, &mut self.out)?;
            } else {
                self.parser.write(token, &self.pool, self.out.get_mut())?;
            }
        }
        Ok(())
    }

    fn drain(&mut self) -> Vec<XmlEvent> {
        self.out.get_mut().0.drain(..).collect()
    }
}

/// Parse a sequence of byte chunks (UTF-8; `&str` and `String` work too)
pub fn parse_chunks<I>(chunks: I, options: &ParseOptions) -> Result<Parsed, XmlError>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut parser = ChunkedParser::new(options.clone());
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(parser.write(chunk.as_ref())?);
    }
    events.extend(parser.end()?);
    Ok(Parsed {
        pool: parser.into_pool(),
        events,
    })
}

/// Error from parsing an I/O source
#[derive(Debug)]
pub enum ReadError {
    Io(std::io::Error),
    Xml(XmlError),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Io(e) => write!(f, "I/O error: {}", e),
            ReadError::Xml(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Io(e) => Some(e),
            ReadError::Xml(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ReadError {
    fn from(e: std::io::Error) -> Self {
        ReadError::Io(e)
    }
}

impl From<XmlError> for ReadError {
    fn from(e: XmlError) -> Self {
        ReadError::Xml(e)
    }
}

/// Parse everything readable from `reader`, 8 KiB at a time
pub fn parse_reader<R: Read>(mut reader: R, options: &ParseOptions) -> Result<Parsed, ReadError> {
    let mut parser = ChunkedParser::new(options.clone());
    let mut buffer = vec![0u8; DEFAULT_BUFFER_SIZE];
    let mut events = Vec::new();

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        events.extend(parser.write(&buffer[..read])?);
    }

    events.extend(parser.end()?);
    Ok(Parsed {
        pool: parser.into_pool(),
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_XML: &str = r#"<root a="1"><item id="x">hello &amp; world</item><b/></root>"#;

    #[test]
    fn test_parse_events() {
        let parsed = parse_events("<a>hi</a>", &ParseOptions::default()).unwrap();
        let kinds: Vec<_> = parsed.events.iter().map(|e| e.kind().as_str()).collect();
        assert_eq!(kinds, vec!["StartElement", "Text", "EndElement"]);
    }

    #[test]
    fn test_sample_signatures() {
        let parsed = parse_events(SAMPLE_XML, &ParseOptions::default()).unwrap();
        assert_eq!(
            parsed.signatures(),
            vec![
                "Start:root:a=1:false",
                "Start:item:id=x:false",
                "Text:hello & world",
                "End:item",
                "Start:b::true",
                "End:b",
                "End:root",
            ]
        );
    }

    #[test]
    fn test_parse_fragment() {
        let options = ParseOptions::default();
        assert_eq!(
            parse_events("<a/><b/>", &options).unwrap_err().code,
            ErrorCode::MultipleRoots
        );
        let parsed = parse_fragment("<a/><b/>", &options).unwrap();
        assert_eq!(parsed.events.len(), 4);
    }

    #[test]
    fn test_pool_reuse() {
        let mut pool = NamePool::new();
        let options = ParseOptions::default();
        let first = parse_events_with_pool("<a><b/></a>", &options, &mut pool).unwrap();
        let second = parse_events_with_pool("<b/>", &options, &mut pool).unwrap();
        assert_eq!(first[1].name(), second[0].name());
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_sink_stops_at_error() {
        let mut pool = NamePool::new();
        let mut kinds = Vec::new();
        let err = parse_events_to_sink(
            "<a><b></a>",
            &ParseOptions::default(),
            &mut pool,
            &mut |event: XmlEvent| kinds.push(event.kind()),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::TagMismatch);
        assert_eq!(kinds, vec![XmlEventKind::StartElement, XmlEventKind::StartElement]);
    }

    #[test]
    fn test_whitespace_only_text_dropped() {
        let parsed = parse_events("<a><b/> \n\t <c/></a>", &ParseOptions::default()).unwrap();
        assert!(parsed.events.iter().all(|e| e.kind() != XmlEventKind::Text));
    }

    #[test]
    fn test_doctype_rejected_everywhere() {
        let parser = ParserOptions::default().with_require_single_root(false);
        let options = ParseOptions::default().with_parser(parser);
        let err = parse_events("<a/><!DOCTYPE a>", &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::DtdRejected);
        let err = parse_chunks(["<!DOC", "TYPE a><a/>"], &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::DtdRejected);
    }

    #[test]
    fn test_coalesce_text() {
        let input = "<a>one<!-- skipped -->two</a>";
        let plain = parse_events(input, &ParseOptions::default()).unwrap();
        assert_eq!(plain.signatures(), vec!["Start:a::false", "Text:one", "Text:two", "End:a"]);

        let options = ParseOptions::default().with_coalesce_text(true);
        let merged = parse_events(input, &options).unwrap();
        assert_eq!(merged.signatures(), vec!["Start:a::false", "Text:onetwo", "End:a"]);
        let span = merged.events[1].span();
        assert_eq!((span.start, span.end), (3, 25));

        let chunked = parse_chunks(input.as_bytes().chunks(2), &options).unwrap();
        assert_eq!(chunked.signatures(), merged.signatures());
    }

    #[test]
    fn test_non_content_events() {
        let input = "<!--c--><a><?pi?></a>";
        let plain = parse_events(input, &ParseOptions::default()).unwrap();
        assert_eq!(plain.events.len(), 2);
        let options = ParseOptions::default().with_non_content_events(true);
        let full = parse_events(input, &options).unwrap();
        assert_eq!(full.signatures(), vec!["Comment", "Start:a::false", "ProcessingInstruction", "End:a"]);
    }

    #[test]
    fn test_event_reader() {
        let options = ParseOptions::default();
        let mut pool = NamePool::new();
        let events: Result<Vec<_>, _> = EventReader::new("<a>hi</a>", &options, &mut pool).collect();
        assert_eq!(events.unwrap().len(), 3);

        let mut pool = NamePool::new();
        let mut reader = EventReader::new("<a><b>", &options, &mut pool);
        assert!(matches!(reader.next(), Some(Ok(XmlEvent::StartElement { .. }))));
        assert!(matches!(reader.next(), Some(Ok(XmlEvent::StartElement { .. }))));
        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnclosedTags);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_event_reader_early_stop() {
        let options = ParseOptions::default();
        let mut pool = NamePool::new();
        let first = EventReader::new("<a><b/>never closed", &options, &mut pool).next();
        assert!(matches!(first, Some(Ok(XmlEvent::StartElement { .. }))));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_chunked_parser() {
        let mut parser = ChunkedParser::new(ParseOptions::default());
        let mut kinds = Vec::new();
        for chunk in ["<a>", "hi</a>"] {
            kinds.extend(parser.write(chunk).unwrap().iter().map(|e| e.kind()));
        }
        kinds.extend(parser.end().unwrap().iter().map(|e| e.kind()));
        assert_eq!(
            kinds,
            vec![XmlEventKind::StartElement, XmlEventKind::Text, XmlEventKind::EndElement]
        );
    }

    #[test]
    fn test_chunked_incomplete_at_end() {
        let err = parse_chunks(["<a>", "<b x='1"], &ParseOptions::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::StreamingIncomplete);
        assert_eq!(err.offset(), 10);
    }

    #[test]
    fn test_parse_reader() {
        let input = format!("<list>{}</list>", "<item n=\"1\">value</item>".repeat(1000));
        let parsed = parse_reader(input.as_bytes(), &ParseOptions::default()).unwrap();
        assert_eq!(parsed.events.len(), 2 + 3 * 1000);

        let whole = parse_events(&input, &ParseOptions::default()).unwrap();
        assert_eq!(parsed.events, whole.events);
    }

    #[test]
    fn test_parse_reader_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<a/>");
        let parsed = parse_reader(&bytes[..], &ParseOptions::default()).unwrap();
        assert_eq!(parsed.signatures(), vec!["Start:a::true", "End:a"]);
        assert_eq!(parsed.events[0].span().start, 0);
    }

    #[test]
    fn test_read_error_display() {
        let err = parse_reader(&b"<a>"[..], &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ReadError::Xml(ref e) if e.code == ErrorCode::UnclosedTags));
        assert!(err.to_string().starts_with("XML_UNCLOSED_TAGS"));
    }
}
