//! Text Coalescing
//!
//! Adjacent `Text` events (for example on either side of a skipped comment)
//! are merged into one. The merged span runs from the first start to the
//! last end. Call `flush` at end of input to release held-back text.

use crate::core::position::SpanLines;
use crate::core::span::Span;
use crate::reader::events::{EventHandler, XmlEvent};

/// Event handler adapter that merges runs of text events
#[derive(Debug)]
pub struct TextCoalescer<H> {
    inner: H,
    pending: Option<(String, Span)>,
}

impl<H: EventHandler> TextCoalescer<H> {
    pub fn new(inner: H) -> Self {
        TextCoalescer { inner, pending: None }
    }

    /// Deliver any held-back text
    pub fn flush(&mut self) {
        if let Some((value, span)) = self.pending.take() {
            self.inner.event(XmlEvent::Text { value, span });
        }
    }

    /// Whether text is being held back
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn get_mut(&mut self) -> &mut H {
        &mut self.inner
    }

    /// Flush and return the wrapped handler
    pub fn into_inner(mut self) -> H {
        self.flush();
        self.inner
    }
}

impl<H: EventHandler> EventHandler for TextCoalescer<H> {
    fn event(&mut self, event: XmlEvent) {
        match event {
            XmlEvent::Text { value, span } => match &mut self.pending {
                Some((pending_value, pending_span)) => {
                    pending_value.push_str(&value);
                    *pending_span = merge_spans(*pending_span, span);
                }
                None => self.pending = Some((value, span)),
            },
            other => {
                self.flush();
                self.inner.event(other);
            }
        }
    }
}

fn merge_spans(first: Span, last: Span) -> Span {
    let lines = match (first.lines, last.lines) {
        (Some(a), Some(b)) => Some(SpanLines {
            start: a.start,
            end: b.end,
        }),
        _ => None,
    };
    Span {
        start: first.start,
        end: last.end,
        lines,
    }
}
