//! The search hot path: priority walk over static transitions, param
//! edges, then the wildcard edge, with a caller-owned capture buffer.
//!
//! Grounded on `dx-core::MemoryManager`'s zero-allocation slice-walk
//! discipline, here over arena-indexed nodes instead of raw linear-memory
//! offsets. Nothing in this file allocates or panics: an input the engine
//! can't match falls through to `SearchResult::default()`, never a `Result`.

use crate::instr;
use crate::{Engine, SearchResult};

impl<T> Engine<T> {
    /// Matches `path` against every registered template, static routes
    /// beating param edges beating the wildcard edge at each node, param
    /// edges tried in the order they were inserted.
    ///
    /// `caps` receives `(start, end)` byte-offset pairs for every capture
    /// on the winning route, two `u32` per capture; it must hold at least
    /// `2 * max_param_count()` entries. A caller-held wildcard tail is
    /// reported separately via `SearchResult::wildcard_start`/`_end`,
    /// since it never occupies a capture slot.
    pub fn search<'a>(&'a self, path: &str, caps: &mut [u32]) -> SearchResult<'a, T> {
        let bytes = path.as_bytes();
        if !self.assume_ascii {
            for &b in bytes {
                if b >= 0x80 {
                    return SearchResult::default();
                }
            }
        }

        let mut cursor = crate::arena::NodeArena::root();
        let mut i = 0usize;
        let mut cap_base = 0u32;
        let mut wildcard_start = None;
        let mut wildcard_end = None;

        while i < bytes.len() {
            let b = bytes[i];
            let next = self.arena.transition(cursor, b);
            if !next.is_sentinel() {
                cursor = next;
                i += 1;
                continue;
            }

            let node = self.arena.get(cursor);
            let mut took_param_edge = false;
            for slot in 0..node.param_edge_count as usize {
                let start = node.param_instr[slot].0;
                if let Some(new_i) = instr::run(
                    &self.instr,
                    start,
                    self.literal_pool.as_bytes(),
                    bytes,
                    i,
                    self.delimiter,
                    cap_base,
                    caps,
                ) {
                    cap_base += instr::count_captures(&self.instr, start);
                    cursor = crate::ids::NodeId(node.param_child[slot]);
                    i = new_i;
                    took_param_edge = true;
                    break;
                }
            }
            if took_param_edge {
                continue;
            }

            if node.has_wildcard() {
                // reached only when `i < bytes.len()`, so the tail is
                // guaranteed non-empty: the wildcard never matches "".
                cursor = crate::ids::NodeId(node.wildcard_child);
                wildcard_start = Some(i as u32);
                wildcard_end = Some(bytes.len() as u32);
                i = bytes.len();
                continue;
            }

            return SearchResult::default();
        }

        let node = self.arena.get(cursor);
        if !node.is_terminal() {
            return SearchResult::default();
        }
        SearchResult {
            found: true,
            value: self.values[node.value_index.0 as usize].as_ref(),
            node: cursor,
            param_count: node.terminal_param_count,
            wildcard_start,
            wildcard_end,
        }
    }
}
