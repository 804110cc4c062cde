#![no_std]

extern crate alloc;

pub mod aggregate;
pub mod canonical;
pub mod config;
pub mod error;
pub mod event;
pub mod gadget;
pub mod journal;
pub mod pricing;
pub mod strlen;

use alloc::vec::Vec;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

pub use aggregate::{referrer_from_expires, BatchAccumulator};
pub use canonical::{canonicalize, claim_key, CanonicalBatch, ClaimLocator};
pub use config::{RenewalConfig, MAX_CLAIMS, NAME_WINDOW};
pub use error::{BatchValidationError, ErrorCategory};
pub use event::{EventRecord, EventSource, Word};
pub use gadget::{ConstraintError, Gate};
pub use journal::{
    pack_journal, unpack_journal, BatchJournal, PackedJournalError, PACKED_JOURNAL_LEN,
};
pub use pricing::{price_claim, PriceTier};
pub use strlen::{emulate_name_length, reference_strlen, NameLength};

use config::{EXPIRES_BITS, PAID_BITS};
use event::{NameDecodeError, EXPIRES_WORD, NAME_LEN_WORD, NAME_WORD, PAID_WORD};

/// One batch of renewal claims: `MAX_CLAIMS` locator slots, of which the
/// first `num_claims` are in range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInput {
    pub block_numbers: Vec<u64>,
    pub tx_idxs: Vec<u32>,
    pub log_idxs: Vec<u32>,
    pub num_claims: u8,
}

impl BatchInput {
    /// Builds a full batch from 1..=`MAX_CLAIMS` claims, filling the padding
    /// slots with copies of the first claim so they carry a matching referrer.
    pub fn from_claims(claims: &[ClaimLocator]) -> Result<Self, BatchValidationError> {
        let first = match claims.first() {
            Some(first) if claims.len() <= MAX_CLAIMS => *first,
            _ => return Err(BatchValidationError::InvalidClaimCount),
        };

        let slots = claims
            .iter()
            .copied()
            .chain(core::iter::repeat(first))
            .take(MAX_CLAIMS);

        let mut input = Self {
            block_numbers: Vec::with_capacity(MAX_CLAIMS),
            tx_idxs: Vec::with_capacity(MAX_CLAIMS),
            log_idxs: Vec::with_capacity(MAX_CLAIMS),
            num_claims: claims.len() as u8,
        };
        for locator in slots {
            input.block_numbers.push(locator.block_number);
            input.tx_idxs.push(locator.tx_idx);
            input.log_idxs.push(locator.log_idx);
        }
        Ok(input)
    }

    /// Locator of `slot`, or `None` if any array is shorter than `slot + 1`.
    pub fn locator(&self, slot: usize) -> Option<ClaimLocator> {
        Some(ClaimLocator::new(
            *self.block_numbers.get(slot)?,
            *self.tx_idxs.get(slot)?,
            *self.log_idxs.get(slot)?,
        ))
    }

    /// All slot locators, padding included. Stops at the shortest array.
    pub fn locators(&self) -> impl Iterator<Item = ClaimLocator> + '_ {
        self.block_numbers
            .iter()
            .zip(&self.tx_idxs)
            .zip(&self.log_idxs)
            .map(|((block, tx), log)| ClaimLocator::new(*block, *tx, *log))
    }
}

/// Per-slot view of what the batch evaluation computed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimBreakdown {
    pub slot: usize,
    pub locator: ClaimLocator,
    pub claim_id: U256,
    pub in_range: bool,
    pub name_byte_len: U256,
    pub char_len: U256,
    pub tier: PriceTier,
    pub paid: U256,
    pub amount: U256,
    pub referrer: U256,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport {
    pub journal: BatchJournal,
    pub claims: Vec<ClaimBreakdown>,
    pub constraint_count: usize,
}

pub fn evaluate_batch<S: EventSource + ?Sized>(
    input: &BatchInput,
    source: &S,
    config: &RenewalConfig,
) -> Result<BatchJournal, BatchValidationError> {
    evaluate_batch_detailed(input, source, config).map(|report| report.journal)
}

/// Runs every check over the batch and returns the journal with a per-slot
/// breakdown. Any failed check rejects the whole batch.
pub fn evaluate_batch_detailed<S: EventSource + ?Sized>(
    input: &BatchInput,
    source: &S,
    config: &RenewalConfig,
) -> Result<BatchReport, BatchValidationError> {
    let mut gate = Gate::new();
    let canonical = canonicalize(&mut gate, input)?;
    let contract_address = config.contract_address_value();

    let mut acc = BatchAccumulator::new();
    let mut claims = Vec::with_capacity(MAX_CLAIMS);
    for slot in 0..MAX_CLAIMS {
        let locator = input
            .locator(slot)
            .ok_or(BatchValidationError::InvalidInputLengths)?;
        let unsatisfied = BatchValidationError::unsatisfied(slot);
        let record = source
            .event(&locator)
            .ok_or(BatchValidationError::MissingEventRecord { slot })?;
        let data_word = |index: usize| {
            record
                .data_word(index)
                .ok_or(BatchValidationError::MissingDataWord { slot, index })
        };

        let expires = data_word(EXPIRES_WORD)?.value();
        let referrer = referrer_from_expires(&mut gate, expires, config).map_err(|e| match e {
            ConstraintError::RangeCheck { bits } if bits == EXPIRES_BITS => {
                BatchValidationError::ExpiryOutOfRange { slot }
            }
            other => unsatisfied(other),
        })?;
        acc.absorb_referrer(&mut gate, slot, referrer)?;

        gate.constrain_equal(contract_address, record.emitter_address())
            .map_err(|_| BatchValidationError::EmitterMismatch { slot })?;

        let name_word = data_word(NAME_WORD)?;
        let name_len = data_word(NAME_LEN_WORD)?.value();
        let name_bytes =
            event::split_name_bytes(&mut gate, &name_word).map_err(|e| match e {
                NameDecodeError::ByteOutOfRange { index } => {
                    BatchValidationError::NameByteOutOfRange { slot, index }
                }
                NameDecodeError::WordMismatch => BatchValidationError::NameWordMismatch { slot },
            })?;
        let length = emulate_name_length(&mut gate, &name_bytes, name_len).map_err(|e| match e {
            ConstraintError::RangeCheck { .. } => {
                BatchValidationError::NameLengthOutOfRange { slot }
            }
            other => unsatisfied(other),
        })?;

        let paid = data_word(PAID_WORD)?.value();
        let amount = price_claim(&mut gate, paid, &length, canonical.in_range[slot], config)
            .map_err(|e| match e {
                ConstraintError::RangeCheck { bits } if bits == PAID_BITS => {
                    BatchValidationError::PaidAmountOutOfRange { slot }
                }
                other => unsatisfied(other),
            })?;
        acc.absorb_amount(&mut gate, amount).map_err(&unsatisfied)?;

        claims.push(ClaimBreakdown {
            slot,
            locator,
            claim_id: canonical.claim_ids[slot],
            in_range: canonical.is_in_range(slot),
            name_byte_len: name_len,
            char_len: length.len,
            tier: PriceTier::of(&length),
            paid,
            amount,
            referrer,
        });
    }

    let journal = acc.finish(&mut gate, &canonical.claim_ids, canonical.num_claims)?;
    Ok(BatchReport {
        journal,
        claims,
        constraint_count: gate.constraint_count(),
    })
}
