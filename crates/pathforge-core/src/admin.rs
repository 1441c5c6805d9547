//! Mutation and introspection operations beyond `insert`/`search`:
//! tombstone delete, prefix queries, and batched insertion.
//!
//! The DFS in [`Engine::prefix_search`] needs no visited set. Node indices
//! only ever increase (`alloc_node` appends), so the trie is a DAG even
//! where param-edge destinations are shared across templates — there is no
//! path back to an already-visited node. That's simpler than the teacher's
//! `dx-compiler::parser::parse_module_recursive`, which walks a graph that
//! can have real cycles and does need a visited set.

use std::collections::HashMap;

use crate::arena::TERMINAL;
use crate::error::PathForgeError;
use crate::ids::{NodeId, ValueId};
use crate::Engine;

impl<T> Engine<T> {
    /// Removes `template`'s registration. Clears the terminal flag, value
    /// and param metadata on its node but leaves trie structure in place —
    /// other templates may share the same static prefix or param-edge
    /// program. Idempotent: deleting an already-absent template is a no-op
    /// success, not an error.
    pub fn delete(&mut self, template: &str) -> Result<(), PathForgeError> {
        if self.frozen {
            return Err(PathForgeError::Frozen);
        }
        let Some(map) = &mut self.intern_map else {
            return Err(PathForgeError::Unavailable);
        };
        let Some(node_id) = map.remove(template) else {
            return Ok(());
        };
        let node = self.arena.get_mut(node_id);
        node.flags &= !TERMINAL;
        node.value_index = ValueId::NONE;
        node.terminal_param_count = 0;
        node.terminal_param_keys_start = 0;
        tracing::debug!(template, "template removed");
        Ok(())
    }

    /// True if any registered template begins with the literal prefix
    /// `prefix` followed by the delimiter or end of string, walked purely
    /// over static transitions (param and wildcard edges don't participate
    /// in a literal prefix walk).
    pub fn is_prefix(&self, prefix: &str) -> bool {
        let bytes = prefix.as_bytes();
        let mut cursor = NodeId::ROOT;
        for &b in bytes {
            if b >= 0x80 {
                return false;
            }
            let next = self.arena.transition(cursor, b);
            if next.is_sentinel() {
                return false;
            }
            cursor = next;
        }
        true
    }

    /// Collects the values of every non-tombstoned terminal reachable from
    /// `prefix`, across static, param and wildcard edges.
    pub fn prefix_search<'a>(&'a self, prefix: &str) -> Vec<&'a T> {
        let bytes = prefix.as_bytes();
        let mut cursor = NodeId::ROOT;
        for &b in bytes {
            if b >= 0x80 {
                return Vec::new();
            }
            let next = self.arena.transition(cursor, b);
            if next.is_sentinel() {
                return Vec::new();
            }
            cursor = next;
        }
        let mut out = Vec::new();
        self.collect_terminals(cursor, &mut out);
        out
    }

    fn collect_terminals<'a>(&'a self, node_id: NodeId, out: &mut Vec<&'a T>) {
        let node = self.arena.get(node_id);
        if node.is_terminal() {
            if let Some(value) = self.values[node.value_index.0 as usize].as_ref() {
                out.push(value);
            }
        }
        for byte in 0u16..128 {
            let child = self.arena.transition(node_id, byte as u8);
            if !child.is_sentinel() {
                self.collect_terminals(child, out);
            }
        }
        for slot in 0..node.param_edge_count as usize {
            self.collect_terminals(NodeId(node.param_child[slot]), out);
        }
        if node.has_wildcard() {
            self.collect_terminals(NodeId(node.wildcard_child), out);
        }
    }

    /// Inserts every `(template, value)` pair. Templates within the batch,
    /// and against the already-registered set when the intern map is still
    /// around, are checked for exact-text duplicates up front, so a
    /// `Duplicate` error never leaves a partial batch installed in that
    /// case. Without the intern map (see [`Engine::finalize`]), the
    /// against-existing-set check falls back to each row's own structural
    /// duplicate check inside `insert`, which runs mid-loop, so a
    /// `Duplicate` there can leave earlier rows installed. Any other
    /// per-template error (malformed syntax, too many param variants on a
    /// shared node) can likewise leave earlier entries in this call already
    /// installed — callers that need full atomicity against those errors
    /// should validate templates before calling this.
    pub fn insert_batch(&mut self, entries: Vec<(String, T)>) -> Result<(), PathForgeError> {
        if self.frozen {
            return Err(PathForgeError::Frozen);
        }
        for i in 0..entries.len() {
            if let Some(map) = &self.intern_map {
                if map.contains_key(entries[i].0.as_str()) {
                    tracing::warn!(template = entries[i].0.as_str(), "batch insert: already registered");
                    return Err(PathForgeError::Duplicate);
                }
            }
            for j in (i + 1)..entries.len() {
                if entries[i].0 == entries[j].0 {
                    tracing::warn!(template = entries[i].0.as_str(), "batch insert: duplicated within batch");
                    return Err(PathForgeError::Duplicate);
                }
            }
        }
        for (template, value) in entries {
            if let Err(err) = self.insert(&template, value) {
                tracing::warn!(template = template.as_str(), error = %err, "batch insert: row failed");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Convenience wrapper over [`Engine::insert_batch`] for callers already
    /// holding a `template -> value` map; map keys are inherently unique, so
    /// only cross-checking against the already-registered set applies.
    pub fn insert_batch_from_map(&mut self, entries: HashMap<String, T>) -> Result<(), PathForgeError> {
        self.insert_batch(entries.into_iter().collect())
    }
}
