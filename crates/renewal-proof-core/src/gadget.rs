//! Fixed-width arithmetic and bit primitives.
//!
//! Every operation is total: it either yields a value or reports which
//! constraint would be unsatisfied. Comparisons and divisions range-check
//! their operands against an explicit bit width before using them, so a
//! value that does not fit the declared width can never slip through an
//! inequality.

use primitive_types::U256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintError {
    /// A value does not fit in the declared number of bits.
    RangeCheck { bits: usize },
    NotLessThan,
    NotEqual,
    NotBoolean,
    Overflow,
    Underflow,
    DivisionByZero,
}

impl ConstraintError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RangeCheck { .. } => "value exceeds declared bit width",
            Self::NotLessThan => "less-than constraint failed",
            Self::NotEqual => "equality constraint failed",
            Self::NotBoolean => "value is not a boolean",
            Self::Overflow => "arithmetic overflow",
            Self::Underflow => "arithmetic underflow",
            Self::DivisionByZero => "division by zero",
        }
    }
}

impl core::fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RangeCheck { bits } => write!(f, "{} ({} bits)", self.as_str(), bits),
            _ => f.write_str(self.as_str()),
        }
    }
}

pub type GateResult<T> = Result<T, ConstraintError>;

/// Emits range-checked arithmetic and counts the constraints it would cost.
#[derive(Clone, Debug, Default)]
pub struct Gate {
    constraints: usize,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of primitive constraints emitted so far.
    pub fn constraint_count(&self) -> usize {
        self.constraints
    }

    fn emit(&mut self, cost: usize) {
        self.constraints += cost;
    }

    pub fn add(&mut self, a: U256, b: U256) -> GateResult<U256> {
        self.emit(1);
        a.checked_add(b).ok_or(ConstraintError::Overflow)
    }

    pub fn sub(&mut self, a: U256, b: U256) -> GateResult<U256> {
        self.emit(1);
        a.checked_sub(b).ok_or(ConstraintError::Underflow)
    }

    pub fn mul(&mut self, a: U256, b: U256) -> GateResult<U256> {
        self.emit(1);
        a.checked_mul(b).ok_or(ConstraintError::Overflow)
    }

    /// `a * b + c` as a single gate.
    pub fn mul_add(&mut self, a: U256, b: U256, c: U256) -> GateResult<U256> {
        self.emit(1);
        a.checked_mul(b)
            .and_then(|ab| ab.checked_add(c))
            .ok_or(ConstraintError::Overflow)
    }

    pub fn sum<I>(&mut self, values: I) -> GateResult<U256>
    where
        I: IntoIterator<Item = U256>,
    {
        let mut acc = U256::zero();
        for value in values {
            acc = self.add(acc, value)?;
        }
        Ok(acc)
    }

    /// Constrain `a < 2^bits`.
    pub fn range_check(&mut self, a: U256, bits: usize) -> GateResult<()> {
        // One lookup per byte-sized limb.
        self.emit(bits.div_ceil(8).max(1));
        if a.bits() > bits {
            return Err(ConstraintError::RangeCheck { bits });
        }
        Ok(())
    }

    pub fn assert_bit(&mut self, a: U256) -> GateResult<()> {
        self.emit(1);
        if a > U256::one() {
            return Err(ConstraintError::NotBoolean);
        }
        Ok(())
    }

    /// Returns 1 if `a < b`, else 0. Both operands must fit in `bits`.
    pub fn is_less_than(&mut self, a: U256, b: U256, bits: usize) -> GateResult<U256> {
        self.range_check(a, bits)?;
        self.range_check(b, bits)?;
        self.emit(1);
        Ok(bool_value(a < b))
    }

    pub fn check_less_than(&mut self, a: U256, b: U256, bits: usize) -> GateResult<()> {
        let lt = self.is_less_than(a, b, bits)?;
        self.constrain_equal(lt, U256::one())
            .map_err(|_| ConstraintError::NotLessThan)
    }

    pub fn is_zero(&mut self, a: U256) -> U256 {
        self.emit(2);
        bool_value(a.is_zero())
    }

    pub fn is_equal(&mut self, a: U256, b: U256) -> U256 {
        self.emit(3);
        bool_value(a == b)
    }

    pub fn and(&mut self, a: U256, b: U256) -> GateResult<U256> {
        self.assert_bit(a)?;
        self.assert_bit(b)?;
        self.mul(a, b)
    }

    /// `a + b - a*b` over booleans.
    pub fn or(&mut self, a: U256, b: U256) -> GateResult<U256> {
        self.assert_bit(a)?;
        self.assert_bit(b)?;
        let ab = self.mul(a, b)?;
        let a_plus_b = self.add(a, b)?;
        self.sub(a_plus_b, ab)
    }

    pub fn not(&mut self, a: U256) -> GateResult<U256> {
        self.assert_bit(a)?;
        self.sub(U256::one(), a)
    }

    /// `mask * a + (1 - mask) * b`.
    pub fn select(&mut self, mask: U256, a: U256, b: U256) -> GateResult<U256> {
        let inv = self.not(mask)?;
        let picked_b = self.mul(inv, b)?;
        self.mul_add(mask, a, picked_b)
    }

    /// Dot product of `values` with the indicator vector of `idx`.
    ///
    /// An index past the end selects nothing and yields zero.
    pub fn select_from_idx(&mut self, values: &[U256], idx: U256) -> GateResult<U256> {
        let mut acc = U256::zero();
        for (i, value) in values.iter().enumerate() {
            let hit = self.is_equal(idx, U256::from(i));
            acc = self.mul_add(hit, *value, acc)?;
        }
        Ok(acc)
    }

    /// Quotient and remainder of `a / b` with `a < 2^a_bits` and `b < 2^b_bits`.
    ///
    /// The remainder is constrained strictly below `b`, which pins the
    /// quotient to the unique floor division.
    pub fn div_mod(
        &mut self,
        a: U256,
        b: U256,
        a_bits: usize,
        b_bits: usize,
    ) -> GateResult<(U256, U256)> {
        self.range_check(a, a_bits)?;
        self.range_check(b, b_bits)?;
        if b.is_zero() {
            return Err(ConstraintError::DivisionByZero);
        }
        let (quotient, remainder) = a.div_mod(b);
        self.range_check(quotient, a_bits)?;
        self.check_less_than(remainder, b, b_bits)?;
        let recomposed = self.mul_add(quotient, b, remainder)?;
        self.constrain_equal(recomposed, a)?;
        Ok((quotient, remainder))
    }

    pub fn constrain_equal(&mut self, a: U256, b: U256) -> GateResult<()> {
        self.emit(1);
        if a != b {
            return Err(ConstraintError::NotEqual);
        }
        Ok(())
    }
}

pub(crate) fn bool_value(flag: bool) -> U256 {
    if flag {
        U256::one()
    } else {
        U256::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: u64) -> U256 {
        U256::from(x)
    }

    #[test]
    fn is_less_than_respects_bit_bound() {
        let mut gate = Gate::new();
        assert_eq!(gate.is_less_than(v(3), v(9), 8).unwrap(), v(1));
        assert_eq!(gate.is_less_than(v(9), v(3), 8).unwrap(), v(0));
        assert_eq!(gate.is_less_than(v(5), v(5), 8).unwrap(), v(0));
        assert_eq!(
            gate.is_less_than(v(256), v(3), 8),
            Err(ConstraintError::RangeCheck { bits: 8 })
        );
    }

    #[test]
    fn check_less_than_rejects_equal_operands() {
        let mut gate = Gate::new();
        assert!(gate.check_less_than(v(0), v(1), 20).is_ok());
        assert_eq!(
            gate.check_less_than(v(10), v(10), 20),
            Err(ConstraintError::NotLessThan)
        );
    }

    #[test]
    fn boolean_ops_reject_non_bits() {
        let mut gate = Gate::new();
        assert_eq!(gate.or(v(1), v(0)).unwrap(), v(1));
        assert_eq!(gate.or(v(1), v(1)).unwrap(), v(1));
        assert_eq!(gate.or(v(0), v(0)).unwrap(), v(0));
        assert_eq!(gate.and(v(1), v(0)).unwrap(), v(0));
        assert_eq!(gate.not(v(0)).unwrap(), v(1));
        assert_eq!(gate.and(v(2), v(1)), Err(ConstraintError::NotBoolean));
    }

    #[test]
    fn select_picks_by_mask() {
        let mut gate = Gate::new();
        assert_eq!(gate.select(v(1), v(7), v(9)).unwrap(), v(7));
        assert_eq!(gate.select(v(0), v(7), v(9)).unwrap(), v(9));
    }

    #[test]
    fn select_from_idx_out_of_range_is_zero() {
        let mut gate = Gate::new();
        let values = [v(10), v(20), v(30)];
        assert_eq!(gate.select_from_idx(&values, v(1)).unwrap(), v(20));
        assert_eq!(gate.select_from_idx(&values, v(3)).unwrap(), v(0));
    }

    #[test]
    fn div_mod_bounds_operands() {
        let mut gate = Gate::new();
        assert_eq!(gate.div_mod(v(645), v(128), 80, 10).unwrap(), (v(5), v(5)));
        assert_eq!(
            gate.div_mod(U256::one() << 80, v(128), 80, 10),
            Err(ConstraintError::RangeCheck { bits: 80 })
        );
        assert_eq!(
            gate.div_mod(v(1), v(0), 80, 10),
            Err(ConstraintError::DivisionByZero)
        );
    }

    #[test]
    fn sub_underflow_is_reported() {
        let mut gate = Gate::new();
        assert_eq!(gate.sub(v(0), v(1)), Err(ConstraintError::Underflow));
    }

    #[test]
    fn constraint_count_grows() {
        let mut gate = Gate::new();
        let before = gate.constraint_count();
        gate.add(v(1), v(2)).unwrap();
        gate.is_zero(v(0));
        assert!(gate.constraint_count() > before);
    }
}
