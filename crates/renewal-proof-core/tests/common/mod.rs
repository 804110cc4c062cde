#![allow(dead_code)]

use std::collections::BTreeMap;

use renewal_proof_core::{BatchInput, ClaimLocator, EventRecord, RenewalConfig, Word, MAX_CLAIMS};

pub const BLOCK: u64 = 5_203_518;
/// 2026-01-01T00:00:00Z; a multiple of one day.
pub const DAY_ALIGNED_EXPIRY: u128 = 1_767_225_600;

/// ABI data of `NameRenewed(string, bytes32 indexed, uint256, uint256)`.
pub fn renewal_record(name: &[u8], paid: u128, expires: u128) -> EventRecord {
    let mut data = vec![
        Word::from_u128(0x60),
        Word::from_u128(paid),
        Word::from_u128(expires),
        Word::from_u128(name.len() as u128),
    ];
    for chunk in name.chunks(32) {
        let mut word = [0u8; 32];
        word[..chunk.len()].copy_from_slice(chunk);
        data.push(Word::from_be_bytes(word));
    }
    if name.is_empty() {
        data.push(Word::default());
    }

    EventRecord {
        emitter: RenewalConfig::SEPOLIA.contract_address,
        topics: Vec::new(),
        data,
    }
}

pub fn locator(tx_idx: u32) -> ClaimLocator {
    ClaimLocator::new(BLOCK, tx_idx, 1)
}

/// A batch whose slots point at `records` in order, with `num_claims` in range.
pub struct Fixture {
    pub input: BatchInput,
    pub events: BTreeMap<ClaimLocator, EventRecord>,
}

impl Fixture {
    /// One distinct, ascending locator per slot.
    pub fn full(records: Vec<EventRecord>, num_claims: u8) -> Self {
        assert_eq!(records.len(), MAX_CLAIMS);
        let locators: Vec<_> = (0..MAX_CLAIMS as u32).map(|i| locator(100 + i)).collect();
        let mut input = BatchInput::from_claims(&locators).expect("valid claim count");
        input.num_claims = num_claims;
        let events = locators.into_iter().zip(records).collect();
        Self { input, events }
    }

    /// `claims` in range, padding slots repeating slot 0.
    pub fn padded(records: Vec<EventRecord>) -> Self {
        let locators: Vec<_> = (0..records.len() as u32).map(|i| locator(100 + i)).collect();
        let input = BatchInput::from_claims(&locators).expect("valid claim count");
        let events = locators.into_iter().zip(records).collect();
        Self { input, events }
    }
}
