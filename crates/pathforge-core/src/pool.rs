//! Content-addressed literal storage and per-terminal parameter key ranges.
//!
//! Grounded on the teacher's `StaticString` / `ClassNameDictionary`
//! offset+length pools: one growable byte buffer, addressed by
//! `(offset, length)` pairs stashed in instruction words rather than by
//! separate heap allocations per literal.

use std::collections::HashMap;

/// Append-only byte buffer backing every `MATCH_LITERAL*` instruction operand.
///
/// Literals are interned by content: two templates that both match on
/// `"-thumb.png"` share one region of the pool. This is what lets
/// `programs_equal` compare two param-edge programs by their embedded
/// pool offsets and have identical text always produce identical offsets,
/// even across independent `insert` calls.
#[derive(Debug, Default)]
pub struct LiteralPool {
    bytes: Vec<u8>,
    intern: HashMap<Box<[u8]>, u32>,
}

impl LiteralPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `data`, returning its byte offset into the pool.
    pub fn intern(&mut self, data: &[u8]) -> u32 {
        if let Some(&offset) = self.intern.get(data) {
            return offset;
        }
        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(data);
        self.intern.insert(data.into(), offset);
        offset
    }

    #[inline]
    pub fn slice(&self, offset: u32, len: u32) -> &[u8] {
        let start = offset as usize;
        &self.bytes[start..start + len as usize]
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Parameter-name strings for terminal nodes, stored as contiguous runs.
///
/// A terminal node with N params points at `keys[keys_start..keys_start+N]`
/// via `NodeRecord::terminal_param_keys_start`/`terminal_param_count`.
#[derive(Debug, Default)]
pub struct KeyPool {
    keys: Vec<Box<str>>,
}

impl KeyPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a contiguous run of keys, returning its start index.
    pub fn push_run(&mut self, names: &[Box<str>]) -> u32 {
        let start = self.keys.len() as u32;
        self.keys.extend_from_slice(names);
        start
    }

    #[inline]
    pub fn run(&self, start: u32, count: u32) -> &[Box<str>] {
        let start = start as usize;
        &self.keys[start..start + count as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates_identical_literals() {
        let mut pool = LiteralPool::new();
        let a = pool.intern(b".png");
        let b = pool.intern(b".png");
        assert_eq!(a, b);
        assert_eq!(pool.slice(a, 4), b".png");
    }

    #[test]
    fn distinct_literals_get_distinct_offsets() {
        let mut pool = LiteralPool::new();
        let a = pool.intern(b"-thumb");
        let b = pool.intern(b".png");
        assert_ne!(a, b);
        assert_eq!(pool.slice(a, 6), b"-thumb");
        assert_eq!(pool.slice(b, 4), b".png");
    }

    #[test]
    fn key_pool_round_trips_runs() {
        let mut keys = KeyPool::new();
        let names: Vec<Box<str>> = vec!["userId".into(), "postId".into()];
        let start = keys.push_run(&names);
        assert_eq!(keys.run(start, 2), &*names);
    }
}
