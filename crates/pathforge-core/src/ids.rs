//! Typed indices into the engine's flat arenas.
//!
//! The source design this crate is built from passes raw integers between a
//! node arena, an instruction stream and a values list. Wrapping each in its
//! own newtype means the compiler catches a node index handed to a function
//! expecting an instruction pointer, at zero runtime cost. `InstrPtr` and
//! `ValueId` are `repr(transparent)` over `u32` and `Pod`/`Zeroable` so they
//! can sit directly in `NodeRecord::value_index`/`param_instr` in `arena.rs`
//! without disturbing its flat, bulk-zeroable layout. `wildcard_child` and
//! `param_child` stay raw `u32` there, wrapped in a `NodeId` at the call
//! site when `compiler.rs`/`vm.rs` read them back out.

use bytemuck::{Pod, Zeroable};

/// Index into the node arena. `NodeId(0)` is the sentinel; `NodeId(1)` is root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const SENTINEL: NodeId = NodeId(0);
    pub const ROOT: NodeId = NodeId(1);

    #[inline]
    pub fn is_sentinel(self) -> bool {
        self.0 == 0
    }
}

/// Offset of a program's first word in the shared instruction stream.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct InstrPtr(pub u32);

/// Index into the values arena. `ValueId(0)` is reserved (no value).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct ValueId(pub u32);

impl ValueId {
    pub const NONE: ValueId = ValueId(0);
}
