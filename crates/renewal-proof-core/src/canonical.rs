//! Claim ids, the in-range mask, and slot ordering.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{
    config::{CLAIM_ID_BITS, IN_RANGE_BITS, MAX_CLAIMS},
    error::BatchValidationError,
    gadget::{Gate, GateResult},
    BatchInput,
};

/// Position of one renewal log in chain history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLocator {
    pub block_number: u64,
    pub tx_idx: u32,
    pub log_idx: u32,
}

impl ClaimLocator {
    pub const fn new(block_number: u64, tx_idx: u32, log_idx: u32) -> Self {
        Self {
            block_number,
            tx_idx,
            log_idx,
        }
    }
}

/// Ids and mask for all `MAX_CLAIMS` slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalBatch {
    pub num_claims: U256,
    pub in_range: [U256; MAX_CLAIMS],
    pub claim_ids: [U256; MAX_CLAIMS],
}

impl CanonicalBatch {
    /// Slots past `MAX_CLAIMS` are never in range.
    pub fn is_in_range(&self, slot: usize) -> bool {
        self.in_range.get(slot).is_some_and(|mask| !mask.is_zero())
    }
}

fn two_pow_64() -> U256 {
    U256::one() << 64
}

/// `(block * 2^64 + tx) * 2^64 + log`.
pub fn claim_key(gate: &mut Gate, locator: &ClaimLocator) -> GateResult<U256> {
    let base = two_pow_64();
    let block_tx = gate.mul_add(
        U256::from(locator.block_number),
        base,
        U256::from(locator.tx_idx),
    )?;
    gate.mul_add(block_tx, base, U256::from(locator.log_idx))
}

/// Derives the in-range mask and zero-padded claim ids, then enforces
/// `id[i-1] < id[i] || id[i] == 0` for every adjacent pair.
pub fn canonicalize(
    gate: &mut Gate,
    input: &BatchInput,
) -> Result<CanonicalBatch, BatchValidationError> {
    if input.block_numbers.len() != MAX_CLAIMS
        || input.tx_idxs.len() != MAX_CLAIMS
        || input.log_idxs.len() != MAX_CLAIMS
    {
        return Err(BatchValidationError::InvalidInputLengths);
    }

    let num_claims = U256::from(input.num_claims);
    gate.check_less_than(U256::zero(), num_claims, IN_RANGE_BITS)
        .map_err(|_| BatchValidationError::InvalidClaimCount)?;
    gate.check_less_than(num_claims, U256::from(MAX_CLAIMS + 1), IN_RANGE_BITS)
        .map_err(|_| BatchValidationError::InvalidClaimCount)?;

    let mut in_range = [U256::zero(); MAX_CLAIMS];
    let mut claim_ids = [U256::zero(); MAX_CLAIMS];
    for slot in 0..MAX_CLAIMS {
        let unsatisfied = BatchValidationError::unsatisfied(slot);
        let locator = input
            .locator(slot)
            .ok_or(BatchValidationError::InvalidInputLengths)?;
        let id = claim_key(gate, &locator).map_err(&unsatisfied)?;
        let is_in_range = gate
            .is_less_than(U256::from(slot), num_claims, IN_RANGE_BITS)
            .map_err(&unsatisfied)?;
        in_range[slot] = is_in_range;
        claim_ids[slot] = gate.mul(id, is_in_range).map_err(&unsatisfied)?;
    }

    for slot in 1..MAX_CLAIMS {
        let unsatisfied = BatchValidationError::unsatisfied(slot);
        let is_less = gate
            .is_less_than(claim_ids[slot - 1], claim_ids[slot], CLAIM_ID_BITS)
            .map_err(&unsatisfied)?;
        let is_padding = gate.is_zero(claim_ids[slot]);
        let ordered = gate.or(is_less, is_padding).map_err(&unsatisfied)?;
        gate.constrain_equal(ordered, U256::one())
            .map_err(|_| BatchValidationError::ClaimsNotAscending { slot })?;
    }

    Ok(CanonicalBatch {
        num_claims,
        in_range,
        claim_ids,
    })
}
