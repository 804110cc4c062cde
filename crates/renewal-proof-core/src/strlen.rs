//! Branch-free emulation of the registrar's `strlen`.
//!
//! The on-chain library walks the byte string and advances by 1..=6 bytes
//! depending on the lead byte, counting one character per step. Here the
//! walk becomes a fixed pass over `NAME_WINDOW` bytes carrying two
//! accumulators: `len` and the number of continuation bytes left to `skip`.

use primitive_types::U256;

use crate::{
    config::{BYTE_BITS, LEAD_BYTE_THRESHOLDS, NAME_WINDOW},
    gadget::{Gate, GateResult},
};

/// Character count of a name and the pricing flags derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameLength {
    pub len: U256,
    pub is_full_price: U256,
    pub is_three: U256,
    pub is_four: U256,
}

/// Bytes consumed by a character whose lead byte is `byte`:
/// six minus the number of thresholds the byte falls below.
pub fn char_width(gate: &mut Gate, byte: U256) -> GateResult<U256> {
    let mut below = [U256::zero(); LEAD_BYTE_THRESHOLDS.len()];
    for (flag, threshold) in below.iter_mut().zip(LEAD_BYTE_THRESHOLDS) {
        *flag = gate.is_less_than(byte, U256::from(threshold), BYTE_BITS)?;
    }
    let below_count = gate.sum(below)?;
    gate.sub(U256::from(6u64), below_count)
}

/// Counts characters among the first `name_len` bytes of `bytes`.
///
/// `name_len` must fit in 8 bits. Bytes past `NAME_WINDOW` never count,
/// so longer names are measured on their first 24 bytes only.
pub fn emulate_name_length(
    gate: &mut Gate,
    bytes: &[U256; NAME_WINDOW],
    name_len: U256,
) -> GateResult<NameLength> {
    gate.range_check(name_len, BYTE_BITS)?;

    let mut len = U256::zero();
    let mut skip = U256::zero();
    for (i, byte) in bytes.iter().enumerate() {
        let width = char_width(gate, *byte)?;
        let in_bounds = gate.is_less_than(U256::from(i), name_len, BYTE_BITS)?;
        let at_char_start = gate.is_zero(skip);
        let counts = gate.and(in_bounds, at_char_start)?;

        // A new character restarts the countdown at its width; otherwise the
        // running skip (>= 1 here) carries on. Either way the decrement stays >= 0.
        let next_skip = gate.select(at_char_start, width, skip)?;
        skip = gate.sub(next_skip, U256::one())?;
        len = gate.add(len, counts)?;
    }

    let is_full_price = gate.is_less_than(U256::from(4u64), len, BYTE_BITS)?;
    let is_three = gate.is_equal(len, U256::from(3u64));
    let is_four = gate.is_equal(len, U256::from(4u64));

    Ok(NameLength {
        len,
        is_full_price,
        is_three,
        is_four,
    })
}

/// Plain branching `strlen` over an arbitrary byte string.
pub fn reference_strlen(bytes: &[u8]) -> usize {
    let mut len = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        i += if b < 0x80 {
            1
        } else if b < 0xe0 {
            2
        } else if b < 0xf0 {
            3
        } else if b < 0xf8 {
            4
        } else if b < 0xfc {
            5
        } else {
            6
        };
        len += 1;
    }
    len
}
