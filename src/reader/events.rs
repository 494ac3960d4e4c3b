//! XML Event Types
//!
//! Structurally validated events produced by the stream parser, and the
//! handler trait they are delivered through.

use crate::core::names::{NameId, NamePool};
use crate::core::span::Span;
use crate::core::tokenizer::Attr;

/// XML parsing event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Start of an element: <name attrs...> or <name attrs.../>
    StartElement {
        name: NameId,
        attrs: Vec<Attr>,
        self_closing: bool,
        span: Span,
    },
    /// End of an element; synthesized with the open tag's span for <name/>
    EndElement { name: NameId, span: Span },
    /// Text content between tags
    Text { value: String, span: Span },
    /// Comment (only when non-content events are enabled)
    Comment { span: Span },
    /// Processing instruction (only when non-content events are enabled)
    ProcessingInstruction { span: Span },
}

/// Discriminant of an [`XmlEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XmlEventKind {
    StartElement,
    EndElement,
    Text,
    Comment,
    ProcessingInstruction,
}

impl XmlEventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            XmlEventKind::StartElement => "StartElement",
            XmlEventKind::EndElement => "EndElement",
            XmlEventKind::Text => "Text",
            XmlEventKind::Comment => "Comment",
            XmlEventKind::ProcessingInstruction => "ProcessingInstruction",
        }
    }
}

impl XmlEvent {
    pub fn kind(&self) -> XmlEventKind {
        match self {
            XmlEvent::StartElement { .. } => XmlEventKind::StartElement,
            XmlEvent::EndElement { .. } => XmlEventKind::EndElement,
            XmlEvent::Text { .. } => XmlEventKind::Text,
            XmlEvent::Comment { .. } => XmlEventKind::Comment,
            XmlEvent::ProcessingInstruction { .. } => XmlEventKind::ProcessingInstruction,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            XmlEvent::StartElement { span, .. }
            | XmlEvent::EndElement { span, .. }
            | XmlEvent::Text { span, .. }
            | XmlEvent::Comment { span }
            | XmlEvent::ProcessingInstruction { span } => span,
        }
    }

    /// Element name for start/end events
    pub fn name(&self) -> Option<NameId> {
        match self {
            XmlEvent::StartElement { name, .. } | XmlEvent::EndElement { name, .. } => Some(*name),
            _ => None,
        }
    }

    /// Compact text rendering for golden comparisons
    ///
    /// `Start:name:a=1,b=2:false`, `End:name`, `Text:value`, `Comment`,
    /// `ProcessingInstruction`. Spans are not part of the signature.
    pub fn signature(&self, pool: &NamePool) -> String {
        match self {
            XmlEvent::StartElement {
                name,
                attrs,
                self_closing,
                ..
            } => {
                let attrs: Vec<String> = attrs
                    .iter()
                    .map(|attr| format!("{}={}", pool.display(attr.name), attr.value))
                    .collect();
                format!("Start:{}:{}:{}", pool.display(*name), attrs.join(","), self_closing)
            }
            XmlEvent::EndElement { name, .. } => format!("End:{}", pool.display(*name)),
            XmlEvent::Text { value, .. } => format!("Text:{}", value),
            XmlEvent::Comment { .. } => "Comment".to_string(),
            XmlEvent::ProcessingInstruction { .. } => "ProcessingInstruction".to_string(),
        }
    }
}

/// Render the signature of every event in order
pub fn event_signature(events: &[XmlEvent], pool: &NamePool) -> Vec<String> {
    events.iter().map(|event| event.signature(pool)).collect()
}

/// Receiver for parser events
///
/// Implemented for any `FnMut(XmlEvent)` closure.
pub trait EventHandler {
    /// Called once per event, in document order
    fn event(&mut self, event: XmlEvent);
}

impl<F> EventHandler for F
where
    F: FnMut(XmlEvent),
{
    #[inline]
    fn event(&mut self, event: XmlEvent) {
        self(event)
    }
}
