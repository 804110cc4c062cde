use primitive_types::U256;

use crate::{
    config::{RenewalConfig, EXPIRES_BITS, MAX_CLAIMS, MODULUS_BITS},
    error::BatchValidationError,
    gadget::{Gate, GateResult},
    journal::BatchJournal,
};

/// `expires mod referrer_modulus`; `expires` must fit in `EXPIRES_BITS`.
pub fn referrer_from_expires(
    gate: &mut Gate,
    expires: U256,
    config: &RenewalConfig,
) -> GateResult<U256> {
    let (_, referrer) = gate.div_mod(
        expires,
        U256::from(config.referrer_modulus),
        EXPIRES_BITS,
        MODULUS_BITS,
    )?;
    Ok(referrer)
}

/// Running batch totals, fed one slot at a time in slot order.
#[derive(Clone, Debug, Default)]
pub struct BatchAccumulator {
    referrer_id: Option<U256>,
    total_amount: U256,
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot 0 fixes the referrer; every later slot, in range or not, must match it.
    pub fn absorb_referrer(
        &mut self,
        gate: &mut Gate,
        slot: usize,
        referrer: U256,
    ) -> Result<(), BatchValidationError> {
        match self.referrer_id {
            None => {
                self.referrer_id = Some(referrer);
                Ok(())
            }
            Some(expected) => gate
                .constrain_equal(expected, referrer)
                .map_err(|_| BatchValidationError::ReferrerMismatch { slot }),
        }
    }

    pub fn absorb_amount(&mut self, gate: &mut Gate, amount: U256) -> GateResult<()> {
        self.total_amount = gate.add(self.total_amount, amount)?;
        Ok(())
    }

    /// Selects `claim_ids[num_claims - 1]` and closes the batch.
    pub fn finish(
        self,
        gate: &mut Gate,
        claim_ids: &[U256; MAX_CLAIMS],
        num_claims: U256,
    ) -> Result<BatchJournal, BatchValidationError> {
        let unsatisfied = |source| BatchValidationError::Unsatisfied { slot: None, source };
        let referrer_id = self.referrer_id.unwrap_or_default();
        let last_idx = gate.sub(num_claims, U256::one()).map_err(unsatisfied)?;
        let last_claim_id = gate
            .select_from_idx(claim_ids, last_idx)
            .map_err(unsatisfied)?;

        Ok(BatchJournal {
            first_claim_id: claim_ids[0],
            last_claim_id,
            referrer_id,
            total_amount: self.total_amount,
        })
    }
}
