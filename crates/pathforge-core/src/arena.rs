//! Index-addressed node arena and the shared ASCII transitions buffer.
//!
//! `NodeRecord` is a flat, `Pod` record living in a plain `Vec`, the same
//! shape as the teacher's `CapabilityManifest` / `RenderOp` — no pointers,
//! no `Rc`, just integers naming positions in sibling arenas. This is what
//! makes the arena safe to share across readers once frozen: nothing here
//! borrows anything else.

use bytemuck::{Pod, Zeroable};

use crate::ids::{InstrPtr, NodeId, ValueId};

pub const TERMINAL: u32 = 1 << 0;
pub const HAS_PARAM_EDGE: u32 = 1 << 1;
pub const HAS_WILDCARD_EDGE: u32 = 1 << 2;

pub const MAX_PARAM_VARIANTS: usize = 4;

/// One trie node. 56 bytes, no padding, safe to bulk-zero on arena growth.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct NodeRecord {
    pub flags: u32,
    pub param_edge_count: u32,
    pub value_index: ValueId,
    pub terminal_param_count: u32,
    pub terminal_param_keys_start: u32,
    pub wildcard_child: u32,
    pub param_instr: [InstrPtr; MAX_PARAM_VARIANTS],
    pub param_child: [u32; MAX_PARAM_VARIANTS],
}

impl NodeRecord {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.flags & TERMINAL != 0
    }

    #[inline]
    pub fn has_wildcard(&self) -> bool {
        self.flags & HAS_WILDCARD_EDGE != 0
    }
}

/// Node records plus the shared 128-wide ASCII transitions table.
///
/// Node `N`'s static transitions live at `transitions[N*128 .. N*128+128]`;
/// `0` means "no transition", any other value is a 1-based child [`NodeId`].
pub struct NodeArena {
    nodes: Vec<NodeRecord>,
    transitions: Vec<u32>,
    capacity: usize,
}

impl NodeArena {
    pub fn with_capacity_hint(hint: u32) -> Self {
        let capacity = hint.max(2) as usize;
        let mut nodes = Vec::with_capacity(capacity);
        // Index 0 is the sentinel; index 1 is root. Both start zeroed.
        nodes.push(NodeRecord::zeroed());
        nodes.push(NodeRecord::zeroed());
        Self {
            nodes,
            transitions: vec![0u32; capacity * 128],
            capacity,
        }
    }

    #[inline]
    pub fn root() -> NodeId {
        NodeId::ROOT
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &NodeRecord {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeRecord {
        &mut self.nodes[id.0 as usize]
    }

    pub fn alloc_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord::zeroed());
        self.grow_transitions_if_needed();
        id
    }

    #[inline]
    pub fn transition(&self, id: NodeId, byte: u8) -> NodeId {
        NodeId(self.transitions[id.0 as usize * 128 + byte as usize])
    }

    pub fn set_transition(&mut self, id: NodeId, byte: u8, child: NodeId) {
        self.transitions[id.0 as usize * 128 + byte as usize] = child.0;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn grow_transitions_if_needed(&mut self) {
        if self.nodes.len() <= self.capacity {
            return;
        }
        let new_capacity = self.capacity * 2;
        let mut grown = vec![0u32; new_capacity * 128];
        grown[..self.transitions.len()].copy_from_slice(&self.transitions);
        self.transitions = grown;
        self.capacity = new_capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_record_has_no_padding() {
        // 6 scalar u32 fields + two [u32; 4] arrays.
        assert_eq!(std::mem::size_of::<NodeRecord>(), (6 + 4 + 4) * 4);
    }

    #[test]
    fn root_starts_with_no_edges() {
        let arena = NodeArena::with_capacity_hint(4);
        let root = arena.get(NodeArena::root());
        assert_eq!(root.flags, 0);
        assert_eq!(arena.transition(NodeArena::root(), b'/'), NodeId::SENTINEL);
    }

    #[test]
    fn alloc_and_link_static_transition() {
        let mut arena = NodeArena::with_capacity_hint(2);
        let child = arena.alloc_node();
        arena.set_transition(NodeArena::root(), b'/', child);
        assert_eq!(arena.transition(NodeArena::root(), b'/'), child);
    }

    #[test]
    fn transitions_buffer_grows_and_preserves_existing_edges() {
        let mut arena = NodeArena::with_capacity_hint(2);
        let mut last = NodeArena::root();
        for i in 0..20u8 {
            let next = arena.alloc_node();
            arena.set_transition(last, b'a' + (i % 26), next);
            last = next;
        }
        // re-walk from root to confirm nothing was lost across a grow
        let mut cur = NodeArena::root();
        for i in 0..20u8 {
            cur = arena.transition(cur, b'a' + (i % 26));
            assert_ne!(cur, NodeId::SENTINEL);
        }
    }
}
