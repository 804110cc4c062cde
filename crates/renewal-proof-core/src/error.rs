use crate::gadget::ConstraintError;

/// Which class of check rejected a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Ordering,
    Provenance,
    Consistency,
    Decoding,
    Retrieval,
    Arithmetic,
}

/// Reason a batch was rejected. Every variant is fatal for the whole batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchValidationError {
    InvalidClaimCount,
    InvalidInputLengths,
    ClaimsNotAscending { slot: usize },
    MissingEventRecord { slot: usize },
    MissingDataWord { slot: usize, index: usize },
    EmitterMismatch { slot: usize },
    ReferrerMismatch { slot: usize },
    ExpiryOutOfRange { slot: usize },
    NameByteOutOfRange { slot: usize, index: usize },
    NameWordMismatch { slot: usize },
    NameLengthOutOfRange { slot: usize },
    PaidAmountOutOfRange { slot: usize },
    Unsatisfied { slot: Option<usize>, source: ConstraintError },
}

impl BatchValidationError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidClaimCount => "numClaims must be in [1, MAX_CLAIMS]",
            Self::InvalidInputLengths => "input arrays must hold exactly MAX_CLAIMS entries",
            Self::ClaimsNotAscending { .. } => "claim ids are not strictly ascending",
            Self::MissingEventRecord { .. } => "no event record for claim locator",
            Self::MissingDataWord { .. } => "event record is missing a data word",
            Self::EmitterMismatch { .. } => "log emitter is not the renewal contract",
            Self::ReferrerMismatch { .. } => "referrer token differs from slot 0",
            Self::ExpiryOutOfRange { .. } => "expiry exceeds its bit width",
            Self::NameByteOutOfRange { .. } => "decoded name byte exceeds 8 bits",
            Self::NameWordMismatch { .. } => "name bytes do not recompose the packed word",
            Self::NameLengthOutOfRange { .. } => "name byte-length exceeds 8 bits",
            Self::PaidAmountOutOfRange { .. } => "paid amount exceeds its bit width",
            Self::Unsatisfied { .. } => "arithmetic constraint unsatisfied",
        }
    }

    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidClaimCount | Self::InvalidInputLengths => ErrorCategory::Configuration,
            Self::ClaimsNotAscending { .. } => ErrorCategory::Ordering,
            Self::EmitterMismatch { .. } => ErrorCategory::Provenance,
            Self::ReferrerMismatch { .. } => ErrorCategory::Consistency,
            Self::MissingEventRecord { .. } | Self::MissingDataWord { .. } => {
                ErrorCategory::Retrieval
            }
            Self::ExpiryOutOfRange { .. }
            | Self::NameByteOutOfRange { .. }
            | Self::NameWordMismatch { .. }
            | Self::NameLengthOutOfRange { .. }
            | Self::PaidAmountOutOfRange { .. } => ErrorCategory::Decoding,
            Self::Unsatisfied { .. } => ErrorCategory::Arithmetic,
        }
    }

    /// Batch slot the failing check belongs to, if any.
    pub const fn slot(&self) -> Option<usize> {
        match self {
            Self::InvalidClaimCount | Self::InvalidInputLengths => None,
            Self::ClaimsNotAscending { slot }
            | Self::MissingEventRecord { slot }
            | Self::MissingDataWord { slot, .. }
            | Self::EmitterMismatch { slot }
            | Self::ReferrerMismatch { slot }
            | Self::ExpiryOutOfRange { slot }
            | Self::NameByteOutOfRange { slot, .. }
            | Self::NameWordMismatch { slot }
            | Self::NameLengthOutOfRange { slot }
            | Self::PaidAmountOutOfRange { slot } => Some(*slot),
            Self::Unsatisfied { slot, .. } => *slot,
        }
    }

    pub(crate) fn unsatisfied(slot: usize) -> impl Fn(ConstraintError) -> Self {
        move |source| Self::Unsatisfied {
            slot: Some(slot),
            source,
        }
    }
}

impl core::fmt::Display for BatchValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())?;
        match self {
            Self::MissingDataWord { slot, index } => {
                write!(f, " (slot {slot}, data word {index})")
            }
            Self::NameByteOutOfRange { slot, index } => write!(f, " (slot {slot}, byte {index})"),
            Self::Unsatisfied { source, .. } => {
                write!(f, ": {source}")?;
                match self.slot() {
                    Some(slot) => write!(f, " (slot {slot})"),
                    None => Ok(()),
                }
            }
            _ => match self.slot() {
                Some(slot) => write!(f, " (slot {slot})"),
                None => Ok(()),
            },
        }
    }
}
