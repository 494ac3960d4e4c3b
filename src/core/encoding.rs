//! Incremental UTF-8 Decoding
//!
//! Byte chunks may split a multi-byte sequence anywhere. The decoder keeps
//! the incomplete tail of each chunk and completes it with the next one, so
//! the decoded text never depends on where the boundaries fell.
//!
//! Decoding is lossy in the usual way: every maximal invalid subpart becomes
//! U+FFFD. A UTF-8 byte order mark at the very start of the stream is
//! dropped once.

use std::borrow::Cow;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Stateful UTF-8 decoder for chunked byte input
#[derive(Debug, Default, Clone)]
pub struct Utf8ChunkDecoder {
    /// Bytes of an incomplete sequence (or partial BOM) awaiting more input
    pending: Vec<u8>,
    /// Whether the start of the stream was checked for a BOM
    bom_checked: bool,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, holding back any incomplete trailing sequence
    pub fn feed(&mut self, bytes: &[u8]) -> String {
        if bytes.is_empty() {
            return String::new();
        }

        let data: Cow<'_, [u8]> = if self.pending.is_empty() {
            Cow::Borrowed(bytes)
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(bytes);
            Cow::Owned(joined)
        };

        let mut start = 0;
        if !self.bom_checked {
            if data.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(&data) {
                self.pending = data.into_owned();
                return String::new();
            }
            self.bom_checked = true;
            if data.starts_with(UTF8_BOM) {
                start = UTF8_BOM.len();
            }
        }

        let input = &data[start..];
        let split = complete_prefix_len(input);
        self.pending.extend_from_slice(&input[split..]);
        String::from_utf8_lossy(&input[..split]).into_owned()
    }

    /// Flush the decoder at end of input
    ///
    /// An incomplete sequence left over becomes a single U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        self.bom_checked = true;
        String::from('\u{FFFD}')
    }

    /// Record that the stream already has content, so no BOM can follow
    pub fn mark_started(&mut self) {
        self.bom_checked = true;
    }

    /// Whether bytes are held back waiting for the rest of a sequence
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Length of the prefix of `input` that ends on a sequence boundary.
///
/// Invalid sequences in the middle count as complete (they decode to
/// U+FFFD); only a truncated sequence at the very end is excluded.
fn complete_prefix_len(input: &[u8]) -> usize {
    let mut checked = 0;
    loop {
        match std::str::from_utf8(&input[checked..]) {
            Ok(_) => return input.len(),
            Err(e) => match e.error_len() {
                Some(invalid) => checked += e.valid_up_to() + invalid,
                None => return checked + e.valid_up_to(),
            },
        }
    }
}
