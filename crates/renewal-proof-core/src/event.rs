//! Access to one claim's renewal log and decoding of the packed name word.
//!
//! The log is `NameRenewed(string name, bytes32 indexed label, uint256 cost, uint256 expires)`.
//! Its ABI data is laid out as `[name offset, cost, expires, name length, name bytes...]`.

use alloc::{collections::BTreeMap, vec::Vec};

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{
    canonical::ClaimLocator,
    config::{BYTE_BITS, NAME_WINDOW},
    gadget::{ConstraintError, Gate},
};

pub const PAID_WORD: usize = 1;
pub const EXPIRES_WORD: usize = 2;
pub const NAME_LEN_WORD: usize = 3;
pub const NAME_WORD: usize = 4;

const HI_BYTES: usize = 16;
const LO_BYTES: usize = NAME_WINDOW - HI_BYTES;
const LO_WORD_BITS: usize = 128;
const LO_SHIFT_BITS: usize = 80;

/// A 256-bit ABI word split into its high and low 128-bit halves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub hi: u128,
    pub lo: u128,
}

impl Word {
    pub const fn new(hi: u128, lo: u128) -> Self {
        Self { hi, lo }
    }

    pub const fn from_u128(value: u128) -> Self {
        Self { hi: 0, lo: value }
    }

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let mut hi = [0u8; 16];
        let mut lo = [0u8; 16];
        hi.copy_from_slice(&bytes[..16]);
        lo.copy_from_slice(&bytes[16..]);
        Self {
            hi: u128::from_be_bytes(hi),
            lo: u128::from_be_bytes(lo),
        }
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..16].copy_from_slice(&self.hi.to_be_bytes());
        out[16..].copy_from_slice(&self.lo.to_be_bytes());
        out
    }

    pub fn hi(&self) -> U256 {
        U256::from(self.hi)
    }

    pub fn lo(&self) -> U256 {
        U256::from(self.lo)
    }

    /// `hi * 2^128 + lo`.
    pub fn value(&self) -> U256 {
        (self.hi() << 128) | self.lo()
    }
}

/// Decoded content of one renewal log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub emitter: [u8; 20],
    pub topics: Vec<[u8; 32]>,
    pub data: Vec<Word>,
}

impl EventRecord {
    pub fn emitter_address(&self) -> U256 {
        U256::from_big_endian(&self.emitter)
    }

    pub fn data_word(&self, index: usize) -> Option<Word> {
        self.data.get(index).copied()
    }
}

/// Lookup seam to whatever fetched the logs.
pub trait EventSource {
    fn event(&self, locator: &ClaimLocator) -> Option<&EventRecord>;
}

impl EventSource for BTreeMap<ClaimLocator, EventRecord> {
    fn event(&self, locator: &ClaimLocator) -> Option<&EventRecord> {
        self.get(locator)
    }
}

/// Why a name-byte witness was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameDecodeError {
    ByteOutOfRange { index: usize },
    WordMismatch,
}

/// The first `NAME_WINDOW` bytes of the packed name word, big-endian.
pub fn name_byte_witness(word: &Word) -> [U256; NAME_WINDOW] {
    let bytes = word.to_be_bytes();
    let mut out = [U256::zero(); NAME_WINDOW];
    for (slot, byte) in out.iter_mut().zip(bytes.iter()) {
        *slot = U256::from(*byte);
    }
    out
}

/// Constrains `witness` to be the exact byte decomposition of the top
/// `NAME_WINDOW` bytes of `word`: sixteen bytes of `hi` and the upper eight
/// bytes of `lo`.
pub fn constrain_name_bytes(
    gate: &mut Gate,
    word: &Word,
    witness: &[U256; NAME_WINDOW],
) -> Result<(), NameDecodeError> {
    for (index, byte) in witness.iter().enumerate() {
        gate.range_check(*byte, BYTE_BITS)
            .map_err(|_| NameDecodeError::ByteOutOfRange { index })?;
    }

    let hi = recompose(gate, &witness[..HI_BYTES])?;
    gate.constrain_equal(word.hi(), hi)
        .map_err(|_| NameDecodeError::WordMismatch)?;

    let lo = recompose(gate, &witness[HI_BYTES..])?;
    let (lo_top, _) = gate
        .div_mod(word.lo(), U256::one() << 64, LO_WORD_BITS, LO_SHIFT_BITS)
        .map_err(|_| NameDecodeError::WordMismatch)?;
    gate.constrain_equal(lo_top, lo)
        .map_err(|_| NameDecodeError::WordMismatch)?;

    Ok(())
}

/// Decomposes and constrains the name word in one step.
pub fn split_name_bytes(
    gate: &mut Gate,
    word: &Word,
) -> Result<[U256; NAME_WINDOW], NameDecodeError> {
    let witness = name_byte_witness(word);
    constrain_name_bytes(gate, word, &witness)?;
    Ok(witness)
}

fn recompose(gate: &mut Gate, bytes: &[U256]) -> Result<U256, NameDecodeError> {
    debug_assert!(bytes.len() == HI_BYTES || bytes.len() == LO_BYTES);
    let base = U256::from(256u64);
    let mut acc = U256::zero();
    for byte in bytes {
        acc = gate
            .mul_add(acc, base, *byte)
            .map_err(|_: ConstraintError| NameDecodeError::WordMismatch)?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_word(name: &[u8]) -> Word {
        let mut bytes = [0u8; 32];
        bytes[..name.len()].copy_from_slice(name);
        Word::from_be_bytes(bytes)
    }

    #[test]
    fn word_value_joins_halves() {
        let word = Word::new(1, 2);
        assert_eq!(word.value(), (U256::one() << 128) + U256::from(2u64));
        assert_eq!(Word::from_be_bytes(word.to_be_bytes()), word);
    }

    #[test]
    fn split_reads_first_24_bytes() {
        let name = b"abcdefghijklmnopqrstuvwxyz0123";
        let word = name_word(name);
        let mut gate = Gate::new();
        let bytes = split_name_bytes(&mut gate, &word).unwrap();
        for (i, byte) in bytes.iter().enumerate() {
            assert_eq!(*byte, U256::from(name[i]));
        }
    }

    #[test]
    fn oversized_byte_is_rejected() {
        let word = name_word(b"vitalik");
        let mut witness = name_byte_witness(&word);
        witness[3] = U256::from(256u64);
        let mut gate = Gate::new();
        assert_eq!(
            constrain_name_bytes(&mut gate, &word, &witness),
            Err(NameDecodeError::ByteOutOfRange { index: 3 })
        );
    }

    #[test]
    fn tampered_hi_byte_is_rejected() {
        let word = name_word(b"vitalik");
        let mut witness = name_byte_witness(&word);
        witness[0] = U256::from(b'w');
        let mut gate = Gate::new();
        assert_eq!(
            constrain_name_bytes(&mut gate, &word, &witness),
            Err(NameDecodeError::WordMismatch)
        );
    }

    #[test]
    fn tampered_lo_byte_is_rejected() {
        let word = name_word(b"a-very-long-name-with-24b");
        let mut witness = name_byte_witness(&word);
        witness[20] = U256::zero();
        let mut gate = Gate::new();
        assert_eq!(
            constrain_name_bytes(&mut gate, &word, &witness),
            Err(NameDecodeError::WordMismatch)
        );
    }

    #[test]
    fn missing_data_word_is_none() {
        let record = EventRecord {
            emitter: [0u8; 20],
            topics: Vec::new(),
            data: alloc::vec![Word::default(); 2],
        };
        assert!(record.data_word(PAID_WORD).is_some());
        assert!(record.data_word(NAME_WORD).is_none());
    }
}
