//! Name Interning Pool
//!
//! Element and attribute names are interned into small sequential integer
//! handles. A pool only grows: ids are never evicted or reused, so a `NameId`
//! stays valid for as long as the pool that produced it.
//!
//! Interning is byte-for-byte; no case folding or trimming.

use std::collections::HashMap;
use std::fmt;

/// Handle for an interned name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(u32);

impl NameId {
    /// Position of this id in its pool's allocation order
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Build an id from a raw index (mainly for tests and foreign tokens)
    #[inline]
    pub const fn from_index(index: u32) -> Self {
        NameId(index)
    }
}

impl fmt::Display for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lookup of an id this pool never allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownNameId(pub NameId);

impl fmt::Display for UnknownNameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameId out of range: {}", self.0 .0)
    }
}

impl std::error::Error for UnknownNameId {}

/// Interning pool for element and attribute names
///
/// Memory layout:
/// - `names`: interned strings indexed by id
/// - `index`: string -> id for deduplication
#[derive(Debug, Default, Clone)]
pub struct NamePool {
    names: Vec<Box<str>>,
    index: HashMap<Box<str>, NameId>,
}

impl NamePool {
    /// Create a new empty pool
    pub fn new() -> Self {
        NamePool {
            names: Vec::with_capacity(64),
            index: HashMap::with_capacity(64),
        }
    }

    /// Intern a name, returning the existing id if it was seen before
    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }

        let id = NameId(self.names.len() as u32);
        self.names.push(name.into());
        self.index.insert(name.into(), id);
        id
    }

    /// Resolve an id back to its string
    pub fn resolve(&self, id: NameId) -> Result<&str, UnknownNameId> {
        self.get(id).ok_or(UnknownNameId(id))
    }

    /// Resolve an id, returning None if this pool never allocated it
    #[inline]
    pub fn get(&self, id: NameId) -> Option<&str> {
        self.names.get(id.index()).map(|s| s.as_ref())
    }

    /// Render an id for diagnostics: the name if known, `#N` otherwise
    pub fn display(&self, id: NameId) -> String {
        match self.get(id) {
            Some(name) => name.to_string(),
            None => id.to_string(),
        }
    }

    /// Number of distinct names interned
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if nothing was interned yet
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Check if byte may start an XML name: ASCII letter, underscore or colon
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':')
}

/// Check if byte may continue an XML name: name-start chars plus digits, hyphen, period
#[inline]
pub fn is_name_char(b: u8) -> bool {
    is_name_start_char(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}
