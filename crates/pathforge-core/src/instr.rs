//! Packed instruction words and the param-edge interpreter.
//!
//! Four opcodes, locked and numbered the way the teacher's `OpcodeV1` is:
//! adding a fifth later must not renumber the first four. Every word packs
//! an 8-bit opcode into its low byte and an operand into the high 24 bits,
//! the same `(operand << 8) | opcode` shape the teacher's `RenderOp` stream
//! uses so the interpreter never branches on word width.
//!
//! A capture occupies two `u32` slots in the caller's `caps` buffer: byte
//! offsets `[start, end)` into the searched path. `CAPTURE_UNTIL`'s embedded
//! index is LOCAL to its own program (0, 1, 2, ...); the VM adds the node's
//! `cap_written` base to land on the absolute slot. This is what lets two
//! different templates that compile to the identical param-edge program
//! share one copy of it in the instruction stream.

pub const OP_MATCH_LITERAL: u8 = 1;
pub const OP_MATCH_LITERAL_SEQ: u8 = 2;
pub const OP_CAPTURE_UNTIL: u8 = 3;
pub const OP_END: u8 = 4;

#[inline]
fn opcode(word: u32) -> u8 {
    (word & 0xff) as u8
}

#[inline]
fn operand(word: u32) -> u32 {
    word >> 8
}

#[inline]
fn make_word(op: u8, operand: u32) -> u32 {
    (operand << 8) | op as u32
}

/// Appends `MATCH_LITERAL byte`. One word.
pub fn push_match_literal(instr: &mut Vec<u32>, byte: u8) {
    instr.push(make_word(OP_MATCH_LITERAL, byte as u32));
}

/// Appends `MATCH_LITERAL_SEQ offset len`. Two words: operand word then the
/// plain pool offset.
pub fn push_match_literal_seq(instr: &mut Vec<u32>, pool_offset: u32, len: u32) {
    instr.push(make_word(OP_MATCH_LITERAL_SEQ, len));
    instr.push(pool_offset);
}

/// Appends `CAPTURE_UNTIL capture_index stop_byte?`. One word. `stop_byte`
/// is `None` when the capture runs to the next delimiter (the common case);
/// `Some(b)` when a literal immediately follows the capture in the segment
/// (e.g. the `.` in `{name}.{ext}`), so the capture must stop there even if
/// it's not the delimiter.
pub fn push_capture_until(instr: &mut Vec<u32>, capture_index: u8, stop_byte: Option<u8>) {
    let (has_stop, stop) = match stop_byte {
        Some(b) => (1u32, b as u32),
        None => (0u32, 0u32),
    };
    let bits = capture_index as u32 | (has_stop << 8) | (stop << 9);
    instr.push(make_word(OP_CAPTURE_UNTIL, bits));
}

/// Appends `END`. One word.
pub fn push_end(instr: &mut Vec<u32>) {
    instr.push(make_word(OP_END, 0));
}

fn decode_capture(word: u32) -> (u8, Option<u8>) {
    let bits = operand(word);
    let capture_index = (bits & 0xff) as u8;
    let has_stop = (bits >> 8) & 0x1;
    let stop = ((bits >> 9) & 0xff) as u8;
    (capture_index, if has_stop != 0 { Some(stop) } else { None })
}

/// Two program shapes account for the overwhelming majority of real
/// templates; matching them without the generic dispatch loop keeps the
/// search hot path branch-light.
#[inline]
fn run_single_capture_fast_path(
    instr: &[u32],
    start: u32,
    path: &[u8],
    cursor: usize,
    delimiter: u8,
    cap_base: u32,
    caps: &mut [u32],
) -> Option<usize> {
    let base = start as usize;
    if instr.len() < base + 2 {
        return None;
    }
    if opcode(instr[base]) != OP_CAPTURE_UNTIL || opcode(instr[base + 1]) != OP_END {
        return None;
    }
    let (local_idx, stop_byte) = decode_capture(instr[base]);
    let stop = stop_byte.unwrap_or(delimiter);
    let rel = path[cursor..].iter().position(|&b| b == stop);
    let end = match rel {
        Some(0) => return None, // a capture must consume at least one byte
        Some(r) => cursor + r,
        None if stop_byte.is_none() => path.len(),
        None => return None,
    };
    write_capture(caps, cap_base, local_idx, cursor as u32, end as u32);
    Some(end)
}

/// `{name}.{ext}`-shaped programs: capture, one literal byte, capture, end.
#[inline]
fn run_name_ext_fast_path(
    instr: &[u32],
    start: u32,
    path: &[u8],
    cursor: usize,
    delimiter: u8,
    cap_base: u32,
    caps: &mut [u32],
) -> Option<usize> {
    let base = start as usize;
    if instr.len() < base + 3 {
        return None;
    }
    if opcode(instr[base]) != OP_CAPTURE_UNTIL
        || opcode(instr[base + 1]) != OP_MATCH_LITERAL
        || opcode(instr[base + 2]) != OP_CAPTURE_UNTIL
    {
        return None;
    }
    if instr.len() < base + 4 || opcode(instr[base + 3]) != OP_END {
        return None;
    }
    let (first_idx, first_stop) = decode_capture(instr[base]);
    let sep = operand(instr[base + 1]) as u8;
    if first_stop != Some(sep) {
        return None;
    }
    let (second_idx, second_stop) = decode_capture(instr[base + 2]);

    let rel = path[cursor..].iter().position(|&b| b == sep);
    let sep_pos = match rel {
        Some(0) => return None,
        Some(r) => cursor + r,
        None => return None,
    };
    let after_sep = sep_pos + 1;
    let stop = second_stop.unwrap_or(delimiter);
    let rel2 = path[after_sep..].iter().position(|&b| b == stop);
    let end = match rel2 {
        Some(0) => return None,
        Some(r) => after_sep + r,
        None if second_stop.is_none() => path.len(),
        None => return None,
    };
    write_capture(caps, cap_base, first_idx, cursor as u32, sep_pos as u32);
    write_capture(caps, cap_base, second_idx, after_sep as u32, end as u32);
    Some(end)
}

fn run_generic(
    instr: &[u32],
    start: u32,
    pool: &[u8],
    path: &[u8],
    mut cursor: usize,
    delimiter: u8,
    cap_base: u32,
    caps: &mut [u32],
) -> Option<usize> {
    let mut pc = start as usize;
    loop {
        let word = *instr.get(pc)?;
        match opcode(word) {
            OP_MATCH_LITERAL => {
                let byte = operand(word) as u8;
                if path.get(cursor) != Some(&byte) {
                    return None;
                }
                cursor += 1;
                pc += 1;
            }
            OP_MATCH_LITERAL_SEQ => {
                let len = operand(word) as usize;
                let offset = *instr.get(pc + 1)? as usize;
                let literal = pool.get(offset..offset + len)?;
                if path.get(cursor..cursor + len) != Some(literal) {
                    return None;
                }
                cursor += len;
                pc += 2;
            }
            OP_CAPTURE_UNTIL => {
                let (local_idx, stop_byte) = decode_capture(word);
                let stop = stop_byte.unwrap_or(delimiter);
                let rel = path[cursor..].iter().position(|&b| b == stop);
                let end = match rel {
                    Some(0) => return None,
                    Some(r) => cursor + r,
                    None if stop_byte.is_none() => path.len(),
                    None => return None,
                };
                write_capture(caps, cap_base, local_idx, cursor as u32, end as u32);
                cursor = end;
                pc += 1;
            }
            OP_END => return Some(cursor),
            _ => return None,
        }
    }
}

#[inline]
fn write_capture(caps: &mut [u32], cap_base: u32, local_idx: u8, start: u32, end: u32) {
    let slot = (cap_base + local_idx as u32) as usize * 2;
    if let Some(pair) = caps.get_mut(slot..slot + 2) {
        pair[0] = start;
        pair[1] = end;
    }
}

/// Runs the param-edge program starting at `start` against `path[cursor..]`.
/// Returns the new cursor on success, `None` on failure. Never panics and
/// never allocates: bounds are checked, not asserted.
#[allow(clippy::too_many_arguments)]
pub fn run(
    instr: &[u32],
    start: u32,
    pool: &[u8],
    path: &[u8],
    cursor: usize,
    delimiter: u8,
    cap_base: u32,
    caps: &mut [u32],
) -> Option<usize> {
    if let Some(end) = run_single_capture_fast_path(instr, start, path, cursor, delimiter, cap_base, caps) {
        return Some(end);
    }
    if let Some(end) = run_name_ext_fast_path(instr, start, path, cursor, delimiter, cap_base, caps) {
        return Some(end);
    }
    run_generic(instr, start, pool, path, cursor, delimiter, cap_base, caps)
}

/// Number of `CAPTURE_UNTIL` instructions in the program at `start`. The VM
/// uses this to advance its running absolute-capture-base counter as it
/// crosses param edges, since each edge's local indices start back at 0.
pub fn count_captures(instr: &[u32], start: u32) -> u32 {
    let mut pc = start as usize;
    let mut count = 0u32;
    loop {
        let Some(&word) = instr.get(pc) else { return count };
        match opcode(word) {
            OP_CAPTURE_UNTIL => {
                count += 1;
                pc += 1;
            }
            OP_MATCH_LITERAL_SEQ => pc += 2,
            OP_END => return count,
            _ => pc += 1,
        }
    }
}

/// True if the program at `candidate_start` is word-for-word identical to
/// the one at `existing_start`, including any embedded literal-pool
/// offsets. Two templates whose param segments reduce to the same bytes
/// here can share one copy of the program (the pool offsets only agree if
/// the segments are byte-identical, since the pool interns by content).
pub fn programs_equal(instr: &[u32], existing_start: u32, candidate: &[u32]) -> bool {
    let mut i = existing_start as usize;
    let mut j = 0usize;
    loop {
        let Some(&existing_word) = instr.get(i) else {
            return false;
        };
        let Some(&candidate_word) = candidate.get(j) else {
            return false;
        };
        if existing_word != candidate_word {
            return false;
        }
        if opcode(existing_word) == OP_END {
            return true;
        }
        let width = if opcode(existing_word) == OP_MATCH_LITERAL_SEQ { 2 } else { 1 };
        i += width;
        j += width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(ops: &[(u8, Option<u8>)]) -> Vec<u32> {
        let mut instr = Vec::new();
        for &(idx, stop) in ops {
            push_capture_until(&mut instr, idx, stop);
        }
        push_end(&mut instr);
        instr
    }

    #[test]
    fn single_capture_runs_to_delimiter() {
        let instr = build(&[(0, None)]);
        let path = b"42/rest";
        let mut caps = [0u32; 2];
        let end = run(&instr, 0, &[], path, 0, b'/', 0, &mut caps).unwrap();
        assert_eq!(end, 2);
        assert_eq!(caps, [0, 2]);
    }

    #[test]
    fn single_capture_runs_to_end_of_path() {
        let instr = build(&[(0, None)]);
        let path = b"42";
        let mut caps = [0u32; 2];
        let end = run(&instr, 0, &[], path, 0, b'/', 0, &mut caps).unwrap();
        assert_eq!(end, 2);
        assert_eq!(caps, [0, 2]);
    }

    #[test]
    fn name_ext_fast_path_splits_on_literal_dot() {
        let mut instr = Vec::new();
        push_capture_until(&mut instr, 0, Some(b'.'));
        push_match_literal(&mut instr, b'.');
        push_capture_until(&mut instr, 1, None);
        push_end(&mut instr);

        let path = b"photo.png";
        let mut caps = [0u32; 4];
        let end = run(&instr, 0, &[], path, 0, b'/', 0, &mut caps).unwrap();
        assert_eq!(end, path.len());
        assert_eq!(&path[caps[0] as usize..caps[1] as usize], b"photo");
        assert_eq!(&path[caps[2] as usize..caps[3] as usize], b"png");
    }

    #[test]
    fn capture_must_be_non_empty() {
        let instr = build(&[(0, None)]);
        let path = b"/rest";
        let mut caps = [0u32; 2];
        assert!(run(&instr, 0, &[], path, 0, b'/', 0, &mut caps).is_none());
    }

    #[test]
    fn literal_seq_matches_interned_bytes() {
        let mut pool = Vec::new();
        pool.extend_from_slice(b"-thumb");
        let mut instr = Vec::new();
        push_match_literal_seq(&mut instr, 0, 6);
        push_end(&mut instr);

        let path = b"-thumb/next";
        let mut caps: [u32; 0] = [];
        let end = run(&instr, 0, &pool, path, 0, b'/', 0, &mut caps).unwrap();
        assert_eq!(end, 6);
    }

    #[test]
    fn programs_equal_compares_word_for_word() {
        let a = build(&[(0, None)]);
        let b = build(&[(0, None)]);
        let c = build(&[(1, None)]);
        assert!(programs_equal(&a, 0, &b));
        assert!(!programs_equal(&a, 0, &c));
    }
}
