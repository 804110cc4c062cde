use primitive_types::U256;

use crate::{
    config::{RenewalConfig, DIVISOR_BITS, PAID_BITS},
    gadget::{Gate, GateResult},
    strlen::NameLength,
};

/// Price tier of a renewal, chosen by character count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceTier {
    Full,
    ThreeChar,
    FourChar,
    None,
}

impl PriceTier {
    pub fn of(length: &NameLength) -> Self {
        if !length.is_full_price.is_zero() {
            Self::Full
        } else if !length.is_three.is_zero() {
            Self::ThreeChar
        } else if !length.is_four.is_zero() {
            Self::FourChar
        } else {
            Self::None
        }
    }
}

/// Referral-eligible amount of one claim.
///
/// Full-price names count `paid` as is; three- and four-character names
/// count `paid` scaled down by their tier divisor; everything else and every
/// out-of-range slot counts zero. `paid` must fit in `PAID_BITS`.
pub fn price_claim(
    gate: &mut Gate,
    paid: U256,
    length: &NameLength,
    in_range: U256,
    config: &RenewalConfig,
) -> GateResult<U256> {
    let full_price_or_zero = gate.mul(length.is_full_price, paid)?;

    let (three_char_scaled, _) = gate.div_mod(
        paid,
        U256::from(config.three_char_divisor),
        PAID_BITS,
        DIVISOR_BITS,
    )?;
    let three_price_or_zero = gate.mul(length.is_three, three_char_scaled)?;

    let (four_char_scaled, _) = gate.div_mod(
        paid,
        U256::from(config.four_char_divisor),
        PAID_BITS,
        DIVISOR_BITS,
    )?;
    let four_price_or_zero = gate.mul(length.is_four, four_char_scaled)?;

    let amount = gate.sum([full_price_or_zero, three_price_or_zero, four_price_or_zero])?;
    gate.mul(amount, in_range)
}
