use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// The four public outputs of a batch, in callback order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJournal {
    pub first_claim_id: U256,
    pub last_claim_id: U256,
    pub referrer_id: U256,
    pub total_amount: U256,
}

impl BatchJournal {
    /// Callback words in submission order.
    pub fn words(&self) -> [U256; 4] {
        [
            self.first_claim_id,
            self.last_claim_id,
            self.referrer_id,
            self.total_amount,
        ]
    }
}

pub const PACKED_JOURNAL_LEN: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedJournalError {
    pub expected: usize,
    pub actual: usize,
}

impl PackedJournalError {
    pub const fn invalid_length(actual: usize) -> Self {
        Self {
            expected: PACKED_JOURNAL_LEN,
            actual,
        }
    }
}

impl core::fmt::Display for PackedJournalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "invalid packed journal length: expected {}, got {}",
            self.expected, self.actual
        )
    }
}

/// Four big-endian 32-byte words, the layout a callback contract reads.
pub fn pack_journal(journal: &BatchJournal) -> [u8; PACKED_JOURNAL_LEN] {
    let mut out = [0u8; PACKED_JOURNAL_LEN];
    for (chunk, word) in out.chunks_exact_mut(32).zip(journal.words()) {
        word.to_big_endian(chunk);
    }
    out
}

pub fn unpack_journal(bytes: &[u8]) -> Result<BatchJournal, PackedJournalError> {
    if bytes.len() != PACKED_JOURNAL_LEN {
        return Err(PackedJournalError::invalid_length(bytes.len()));
    }

    Ok(BatchJournal {
        first_claim_id: U256::from_big_endian(&bytes[0..32]),
        last_claim_id: U256::from_big_endian(&bytes[32..64]),
        referrer_id: U256::from_big_endian(&bytes[64..96]),
        total_amount: U256::from_big_endian(&bytes[96..128]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_amount_lands_in_last_word() {
        let journal = BatchJournal {
            first_claim_id: U256::one() << 130,
            last_claim_id: U256::one() << 131,
            referrer_id: U256::from(42u64),
            total_amount: U256::from(0x0102u64),
        };
        let packed = pack_journal(&journal);
        assert_eq!(packed[95], 42);
        assert_eq!(&packed[126..], &[0x01, 0x02]);
        assert_eq!(unpack_journal(&packed).unwrap(), journal);
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(
            unpack_journal(&[0u8; 127]),
            Err(PackedJournalError {
                expected: PACKED_JOURNAL_LEN,
                actual: 127
            })
        );
    }
}
