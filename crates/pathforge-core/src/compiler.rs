//! Template parsing and trie construction for [`crate::Engine::insert`].
//!
//! Grounded on `dx-compiler::parser`'s single-pass, regex-free byte walk:
//! one cursor over the template text, early `return Err` on the first
//! malformed byte, no backtracking. The walk treats everything up to the
//! first `{` in a delimiter-bounded segment as an ordinary static trie
//! prefix, and only the `{...}` portion (plus any literal trailing it) as
//! an instruction program — so `/v{n}/users/{id}` shares its leading `v`
//! byte as a normal trie edge with any other template under `/v.../`.

use crate::arena::{HAS_PARAM_EDGE, HAS_WILDCARD_EDGE, TERMINAL};
use crate::error::{PathForgeError, TemplateErrorReason};
use crate::ids::{InstrPtr, NodeId, ValueId};
use crate::instr::{self, programs_equal};
use crate::Engine;

enum Token {
    Literal(Vec<u8>),
    Capture(Box<str>),
}

fn is_param_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Tokenizes one delimiter-bounded segment's param portion (starting at its
/// first `{`) into literal runs and capture names.
fn tokenize_param_segment(bytes: &[u8], base_index: usize) -> Result<Vec<Token>, PathForgeError> {
    let mut tokens = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                let close = bytes[i + 1..].iter().position(|&b| b == b'}');
                let Some(rel) = close else {
                    return Err(invalid(TemplateErrorReason::UnclosedBrace, base_index + i));
                };
                let name_start = i + 1;
                let name_end = name_start + rel;
                let name_bytes = &bytes[name_start..name_end];
                if name_bytes.is_empty() {
                    return Err(invalid(TemplateErrorReason::EmptyParamName, base_index + i));
                }
                for (off, &b) in name_bytes.iter().enumerate() {
                    if !is_param_char(b) {
                        return Err(invalid(
                            TemplateErrorReason::InvalidParamChar,
                            base_index + name_start + off,
                        ));
                    }
                }
                // Every byte just passed `is_param_char`, which only accepts
                // ASCII alphanumerics and `_`, so this never loses information.
                let name: Box<str> = name_bytes.iter().map(|&b| b as char).collect();
                tokens.push(Token::Capture(name));
                i = name_end + 1;
            }
            b'}' => return Err(invalid(TemplateErrorReason::StrayRBrace, base_index + i)),
            b'\\' => {
                if i + 1 >= bytes.len() {
                    return Err(invalid(TemplateErrorReason::TrailingEscape, base_index + i));
                }
                push_literal_byte(&mut tokens, bytes[i + 1]);
                i += 2;
            }
            b => {
                push_literal_byte(&mut tokens, b);
                i += 1;
            }
        }
    }
    reject_adjacent_captures(bytes, base_index)?;
    Ok(tokens)
}

fn push_literal_byte(tokens: &mut Vec<Token>, b: u8) {
    if let Some(Token::Literal(last)) = tokens.last_mut() {
        last.push(b);
    } else {
        tokens.push(Token::Literal(vec![b]));
    }
}

/// A second `{` immediately following a capture's closing `}`, with no
/// literal byte between them, leaves the VM no way to know where the first
/// capture ends.
fn reject_adjacent_captures(bytes: &[u8], base_index: usize) -> Result<(), PathForgeError> {
    let mut prev_was_capture_close = false;
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if prev_was_capture_close {
                return Err(invalid(TemplateErrorReason::AdjacentParams, base_index + i));
            }
            // skip to the matching close; malformed braces are reported
            // by the token scan above, not here.
            if let Some(rel) = bytes[i + 1..].iter().position(|&b| b == b'}') {
                i = i + 1 + rel + 1;
                prev_was_capture_close = true;
                continue;
            }
            break;
        }
        prev_was_capture_close = false;
        i += 1;
    }
    Ok(())
}

fn invalid(reason: TemplateErrorReason, index: usize) -> PathForgeError {
    PathForgeError::InvalidTemplate { reason, index }
}

/// Any `*` must be the final byte of the template, immediately preceded by
/// the delimiter. An escaped `\*` is a literal byte, not a wildcard, and is
/// skipped entirely — same with every other `\X` pair, so an escaped
/// delimiter byte can't be mistaken for the one that makes a `*` trailing.
fn validate_wildcard_placement(bytes: &[u8], delimiter: u8) -> Result<(), PathForgeError> {
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'*' => {
                let is_last = i == bytes.len() - 1;
                let preceded_by_delimiter_or_start = i == 0 || bytes[i - 1] == delimiter;
                if !is_last || !preceded_by_delimiter_or_start {
                    return Err(invalid(TemplateErrorReason::WildcardNotTrailing, i));
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    Ok(())
}

impl<T> Engine<T> {
    /// Registers `template` with `value`. Templates are ASCII, segments are
    /// delimiter-bounded, and each segment holds at most one run of `{name}`
    /// captures with optional surrounding literal text, or a single
    /// trailing `*` wildcard as the entire final segment.
    pub fn insert(&mut self, template: &str, value: T) -> Result<(), PathForgeError> {
        if self.frozen {
            return Err(PathForgeError::Frozen);
        }
        // Duplicate-by-text detection only runs when the intern map is still
        // around; without it, `insert` falls back to the structural
        // terminal-collision check below. Unlike `delete`, which has no
        // other way to find a template's node, `insert` can still make
        // forward progress, so a dropped map isn't a hard failure here.
        if let Some(map) = &self.intern_map {
            if map.contains_key(template) {
                return Err(PathForgeError::Duplicate);
            }
        }

        let bytes = template.as_bytes();
        if bytes.first() != Some(&self.delimiter) {
            return Err(invalid(TemplateErrorReason::MissingLeadingDelimiter, 0));
        }
        for (i, &b) in bytes.iter().enumerate() {
            if b >= 0x80 {
                return Err(invalid(TemplateErrorReason::NonAscii, i));
            }
        }
        validate_wildcard_placement(bytes, self.delimiter)?;

        let mut cursor = NodeId::ROOT;
        let mut captured_names: Vec<Box<str>> = Vec::new();
        let mut i = 0usize;
        while i < bytes.len() {
            match bytes[i] {
                b'{' => {
                    let seg_end = bytes[i..]
                        .iter()
                        .position(|&b| b == self.delimiter)
                        .map(|p| i + p)
                        .unwrap_or(bytes.len());
                    let tokens = tokenize_param_segment(&bytes[i..seg_end], i)?;
                    let (words, names) = self.compile_tokens(&tokens);
                    for name in &names {
                        if captured_names.iter().any(|n| n == name) {
                            return Err(invalid(TemplateErrorReason::DuplicateParamName, i));
                        }
                    }
                    cursor = self.install_param_edge(cursor, &words)?;
                    captured_names.extend(names);
                    i = seg_end;
                }
                b'}' => return Err(invalid(TemplateErrorReason::StrayRBrace, i)),
                b'*' => {
                    cursor = self.install_wildcard_edge(cursor);
                    i += 1;
                }
                b'\\' => {
                    if i + 1 >= bytes.len() {
                        return Err(invalid(TemplateErrorReason::TrailingEscape, i));
                    }
                    cursor = self.install_literal_edge(cursor, bytes[i + 1]);
                    i += 2;
                }
                b => {
                    cursor = self.install_literal_edge(cursor, b);
                    i += 1;
                }
            }
        }

        if self.arena.get(cursor).is_terminal() {
            return Err(PathForgeError::Duplicate);
        }

        let value_index = ValueId(self.values.len() as u32);
        self.values.push(Some(value));
        let keys_start = self.keys.push_run(&captured_names);
        let param_count = captured_names.len() as u32;

        let node = self.arena.get_mut(cursor);
        node.flags |= TERMINAL;
        node.value_index = value_index;
        node.terminal_param_count = param_count;
        node.terminal_param_keys_start = keys_start;

        if param_count > self.max_param_count {
            self.max_param_count = param_count;
        }
        if let Some(map) = &mut self.intern_map {
            map.insert(template.into(), cursor);
        }
        tracing::debug!(template, params = param_count, "template registered");
        Ok(())
    }

    fn compile_tokens(&mut self, tokens: &[Token]) -> (Vec<u32>, Vec<Box<str>>) {
        let mut words = Vec::new();
        let mut names = Vec::new();
        let mut local_idx: u8 = 0;
        for (i, tok) in tokens.iter().enumerate() {
            match tok {
                Token::Literal(lit) => {
                    if lit.len() == 1 {
                        instr::push_match_literal(&mut words, lit[0]);
                    } else {
                        let offset = self.literal_pool.intern(lit);
                        instr::push_match_literal_seq(&mut words, offset, lit.len() as u32);
                    }
                }
                Token::Capture(name) => {
                    let stop = match tokens.get(i + 1) {
                        Some(Token::Literal(lit)) => Some(lit[0]),
                        _ => None,
                    };
                    instr::push_capture_until(&mut words, local_idx, stop);
                    names.push(name.clone());
                    local_idx += 1;
                }
            }
        }
        instr::push_end(&mut words);
        (words, names)
    }

    /// Installs a single static trie edge for one literal byte, allocating
    /// a fresh child node the first time any template takes it.
    fn install_literal_edge(&mut self, node_id: NodeId, byte: u8) -> NodeId {
        let child = self.arena.transition(node_id, byte);
        if !child.is_sentinel() {
            return child;
        }
        let new_child = self.arena.alloc_node();
        self.arena.set_transition(node_id, byte, new_child);
        new_child
    }

    fn install_param_edge(&mut self, node_id: NodeId, words: &[u32]) -> Result<NodeId, PathForgeError> {
        let node = *self.arena.get(node_id);
        for slot in 0..node.param_edge_count as usize {
            if programs_equal(&self.instr, node.param_instr[slot].0, words) {
                return Ok(NodeId(node.param_child[slot]));
            }
        }
        if node.param_edge_count as usize >= crate::arena::MAX_PARAM_VARIANTS {
            return Err(PathForgeError::TooManyParamVariants);
        }
        let start = InstrPtr(self.instr.len() as u32);
        self.instr.extend_from_slice(words);
        let child = self.arena.alloc_node();

        let node = self.arena.get_mut(node_id);
        let slot = node.param_edge_count as usize;
        node.param_instr[slot] = start;
        node.param_child[slot] = child.0;
        node.param_edge_count += 1;
        node.flags |= HAS_PARAM_EDGE;
        Ok(child)
    }

    fn install_wildcard_edge(&mut self, node_id: NodeId) -> NodeId {
        let node = self.arena.get(node_id);
        if node.has_wildcard() {
            return NodeId(node.wildcard_child);
        }
        let child = self.arena.alloc_node();
        let node = self.arena.get_mut(node_id);
        node.wildcard_child = child.0;
        node.flags |= HAS_WILDCARD_EDGE;
        child
    }
}
