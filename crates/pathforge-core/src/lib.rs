//! A radix-trie, instruction-VM router core for path-like strings.
//!
//! ```text
//!                    ┌─────────────┐        ┌──────────────┐
//!   insert/delete ──▶│ NodeArena    │◀──────▶│ instruction   │
//!   (mutation path)  │ (flat, Pod)  │  param  │ stream + pool │
//!                    └──────┬───────┘  edges  └──────┬────────┘
//!                           │                          │
//!                           ▼                          ▼
//!                    search(path, caps) ──────▶ SearchResult<'_, T>
//!                    (hot path, never panics, never allocates)
//! ```
//!
//! [`Engine`] owns three flat arenas — trie nodes, a packed instruction
//! stream, and an interned literal pool — addressed entirely by index, no
//! pointers between them. Mutation (`insert`, `delete`) runs single-writer;
//! [`Engine::search`] takes `&self` and a caller-owned capture buffer, so
//! any number of readers can call it concurrently once the engine is done
//! being built. Call [`Engine::finalize`] to mark that point explicitly and,
//! optionally, release the bookkeeping `insert`/`delete` need but `search`
//! doesn't.

mod admin;
mod arena;
mod compiler;
pub mod config;
pub mod error;
pub mod ids;
mod instr;
mod pool;
mod vm;

use std::collections::HashMap;

use arena::NodeArena;
use pool::{KeyPool, LiteralPool};

pub use config::{EngineOptions, EngineOptionsBuilder};
pub use error::{PathForgeError, TemplateErrorReason};
pub use ids::{NodeId, ValueId};

/// Index-addressed pattern-matching engine over paths, URLs, and similar
/// delimiter-separated strings.
pub struct Engine<T> {
    arena: NodeArena,
    literal_pool: LiteralPool,
    instr: Vec<u32>,
    values: Vec<Option<T>>,
    keys: KeyPool,
    delimiter: u8,
    assume_ascii: bool,
    frozen: bool,
    intern_map: Option<HashMap<Box<str>, NodeId>>,
    max_param_count: u32,
}

/// The outcome of [`Engine::search`].
///
/// `value` borrows from the engine, so a `SearchResult` cannot outlive it.
/// A wildcard tail is reported as a byte-offset pair into the searched
/// path rather than through `caps`, since it doesn't occupy a capture slot.
#[derive(Debug)]
pub struct SearchResult<'a, T> {
    pub found: bool,
    pub value: Option<&'a T>,
    pub node: NodeId,
    pub param_count: u32,
    pub wildcard_start: Option<u32>,
    pub wildcard_end: Option<u32>,
}

impl<'a, T> Default for SearchResult<'a, T> {
    fn default() -> Self {
        Self {
            found: false,
            value: None,
            node: NodeId::SENTINEL,
            param_count: 0,
            wildcard_start: None,
            wildcard_end: None,
        }
    }
}

impl<'a, T> SearchResult<'a, T> {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl<T> Engine<T> {
    /// Builds an empty engine. Fails only if `options` themselves are
    /// invalid (an unsupported delimiter); never fails on account of `T`.
    pub fn new(options: EngineOptions) -> Result<Self, PathForgeError> {
        options.validate()?;
        Ok(Self {
            arena: NodeArena::with_capacity_hint(options.node_pool_size_hint),
            literal_pool: LiteralPool::new(),
            instr: Vec::new(),
            values: Vec::new(),
            keys: KeyPool::new(),
            delimiter: options.delimiter,
            assume_ascii: options.assume_ascii,
            frozen: false,
            intern_map: Some(HashMap::new()),
            max_param_count: 0,
        })
    }

    /// The capture count of the largest registered template. Size a
    /// `search` caller's `caps` buffer to `2 * max_param_count()` u32s.
    pub fn max_param_count(&self) -> u32 {
        self.max_param_count
    }

    /// Parameter names for a terminal node, in declaration order, matching
    /// the slot order `search` wrote into `caps`. Empty for non-terminal or
    /// tombstoned nodes.
    pub fn get_param_keys_for_node(&self, node: NodeId) -> &[Box<str>] {
        let record = self.arena.get(node);
        if !record.is_terminal() {
            return &[];
        }
        self.keys
            .run(record.terminal_param_keys_start, record.terminal_param_count)
    }

    /// Marks a point in the build phase. The two flags are independent:
    /// `freeze` makes `insert`/`delete`/`insert_batch*` start returning
    /// [`PathForgeError::Frozen`]; `drop_intern_map` releases the
    /// template-text lookup table that `delete` needs to find a template's
    /// node, after which `delete` returns [`PathForgeError::Unavailable`]
    /// instead. `insert`/`insert_batch*` keep working without it — they
    /// fall back to the structural terminal-collision check already needed
    /// to reject duplicate param programs, so dropping the map only gives
    /// up best-effort exact-text duplicate detection, not the ability to
    /// insert. `search` never depends on the intern map and is unaffected
    /// either way.
    pub fn finalize(&mut self, freeze: bool, drop_intern_map: bool) {
        self.frozen = freeze;
        if drop_intern_map {
            self.intern_map = None;
        }
    }

    /// True once [`Engine::finalize`] has been called with `freeze: true`.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine<&'static str> {
        Engine::new(EngineOptions::default()).unwrap()
    }

    // The eight end-to-end scenarios, reproduced literally.

    #[test]
    fn scenario_1_static_route() {
        let mut engine = engine();
        engine.insert("/api/health", "H").unwrap();
        let mut caps = [];
        let result = engine.search("/api/health", &mut caps);
        assert!(result.found);
        assert_eq!(result.value, Some(&"H"));
        assert_eq!(result.param_count, 0);
    }

    #[test]
    fn scenario_2_single_param_route() {
        let mut engine = engine();
        engine.insert("/api/users/{id}", "U").unwrap();
        let mut caps = [0u32; 2];
        let path = "/api/users/123";
        let result = engine.search(path, &mut caps);
        assert!(result.found);
        assert_eq!(result.value, Some(&"U"));
        let keys = engine.get_param_keys_for_node(result.node);
        assert_eq!(keys, &[Box::from("id")]);
        assert_eq!(&path[caps[0] as usize..caps[1] as usize], "123");
    }

    #[test]
    fn scenario_3_multi_param_route_preserves_declaration_order() {
        let mut engine = engine();
        engine
            .insert("/api/users/{userId}/posts/{postId}", "P")
            .unwrap();
        let mut caps = [0u32; 4];
        let path = "/api/users/42/posts/99";
        let result = engine.search(path, &mut caps);
        assert!(result.found);
        let keys = engine.get_param_keys_for_node(result.node);
        assert_eq!(keys, &[Box::from("userId"), Box::from("postId")]);
        assert_eq!(&path[caps[0] as usize..caps[1] as usize], "42");
        assert_eq!(&path[caps[2] as usize..caps[3] as usize], "99");
    }

    #[test]
    fn scenario_4_name_dot_ext_route() {
        let mut engine = engine();
        engine.insert("/files/{name}.{ext}", "F").unwrap();
        let mut caps = [0u32; 4];
        let path = "/files/report.pdf";
        let result = engine.search(path, &mut caps);
        assert!(result.found);
        assert_eq!(&path[caps[0] as usize..caps[1] as usize], "report");
        assert_eq!(&path[caps[2] as usize..caps[3] as usize], "pdf");
    }

    #[test]
    fn scenario_5_trailing_wildcard_route() {
        let mut engine = engine();
        engine.insert("/static/*", "S").unwrap();
        let mut caps = [];
        let path = "/static/a/b/c.png";
        let result = engine.search(path, &mut caps);
        assert!(result.found);
        assert_eq!(result.value, Some(&"S"));
        assert_eq!(result.wildcard_start, Some(8));
        assert_eq!(result.wildcard_end, Some(17));
        assert_eq!(path.len(), 17);
    }

    #[test]
    fn scenario_6_static_beats_param_at_the_same_node() {
        let mut engine = engine();
        engine.insert("/a/{x}", "P").unwrap();
        engine.insert("/a/b", "E").unwrap();
        let mut caps = [0u32; 2];
        let result = engine.search("/a/b", &mut caps);
        assert!(result.found);
        assert_eq!(result.value, Some(&"E"));
        assert_eq!(result.param_count, 0);
    }

    #[test]
    fn scenario_7_versioned_param_prefix_route() {
        let mut engine = engine();
        engine.insert("/v{n}/users/{id}", "V").unwrap();
        let mut caps = [0u32; 4];
        let path = "/v2/users/7";
        let result = engine.search(path, &mut caps);
        assert!(result.found);
        let keys = engine.get_param_keys_for_node(result.node);
        assert_eq!(keys, &[Box::from("n"), Box::from("id")]);
        assert_eq!(&path[caps[0] as usize..caps[1] as usize], "2");
        assert_eq!(&path[caps[2] as usize..caps[3] as usize], "7");
    }

    #[test]
    fn scenario_8_no_route_matches() {
        let mut engine = engine();
        engine.insert("/api/users/{id}", "U").unwrap();
        let mut caps = [0u32; 2];
        let result = engine.search("/does/not/exist", &mut caps);
        assert!(!result.found);
        assert_eq!(result.value, None);
    }

    #[test]
    fn identical_param_programs_share_one_instruction_copy() {
        let mut engine = engine();
        engine.insert("/a/{x}", "a").unwrap();
        let len_after_first = engine.instr.len();
        engine.insert("/b/{y}", "b").unwrap();
        // The second template's param program is byte-identical to the
        // first's (single trailing capture, no stop literal), so no new
        // words should have been appended.
        assert_eq!(engine.instr.len(), len_after_first);
    }

    #[test]
    fn max_param_count_tracks_the_richest_template() {
        let mut engine = engine();
        engine.insert("/a/{x}", "a").unwrap();
        assert_eq!(engine.max_param_count(), 1);
        engine.insert("/b/{x}/{y}/{z}", "b").unwrap();
        assert_eq!(engine.max_param_count(), 3);
    }

    #[test]
    fn frozen_engine_rejects_further_mutation() {
        let mut engine = engine();
        engine.insert("/a", "a").unwrap();
        engine.finalize(true, true);
        assert!(engine.is_frozen());
        assert!(matches!(engine.insert("/b", "b"), Err(PathForgeError::Frozen)));
        assert!(matches!(engine.delete("/a"), Err(PathForgeError::Frozen)));
        // search keeps working after freezing.
        let mut caps = [];
        assert!(engine.search("/a", &mut caps).found);
    }

    #[test]
    fn unfinalized_engine_keeps_accepting_inserts() {
        let mut engine = engine();
        engine.insert("/a", "a").unwrap();
        engine.finalize(false, false);
        assert!(!engine.is_frozen());
        assert!(engine.insert("/b", "b").is_ok());
    }

    #[test]
    fn dropping_the_intern_map_without_freezing_blocks_delete_but_not_insert() {
        let mut engine = engine();
        engine.insert("/a", "a").unwrap();
        engine.finalize(false, true);
        assert!(!engine.is_frozen());
        // insert falls back to the structural duplicate check and keeps
        // working; delete has no other way to find "/a"'s node.
        assert!(engine.insert("/b", "b").is_ok());
        assert!(matches!(engine.delete("/a"), Err(PathForgeError::Unavailable)));
        let mut caps = [];
        assert!(engine.search("/a", &mut caps).found);
        assert!(engine.search("/b", &mut caps).found);
    }
}
