use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Number of claim slots in every batch.
pub const MAX_CLAIMS: usize = 9;
/// Leading name bytes fed to the length emulator.
pub const NAME_WINDOW: usize = 24;

pub const IN_RANGE_BITS: usize = 20;
pub const CLAIM_ID_BITS: usize = 192;
pub const BYTE_BITS: usize = 8;
pub const PAID_BITS: usize = 80;
pub const DIVISOR_BITS: usize = 10;
pub const EXPIRES_BITS: usize = 50;
pub const MODULUS_BITS: usize = 20;

/// Lead-byte thresholds of the on-chain `strlen`, smallest first.
pub const LEAD_BYTE_THRESHOLDS: [u64; 5] = [0x80, 0xe0, 0xf0, 0xf8, 0xfc];

/// Constant material shared by every claim of every batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalConfig {
    /// Registrar controller that must have emitted each renewal log.
    pub contract_address: [u8; 20],
    /// `expires mod referrer_modulus` is the referrer token.
    pub referrer_modulus: u64,
    /// Divisor applied to the paid amount of three-character names (640 / 5).
    pub three_char_divisor: u64,
    /// Divisor applied to the paid amount of four-character names (160 / 5).
    pub four_char_divisor: u64,
}

impl RenewalConfig {
    /// ENS registrar controller on Sepolia, `0xFED6a969AaA60E4961FCD3EBF1A2e8913ac65B72`.
    pub const SEPOLIA: Self = Self {
        contract_address: [
            0xfe, 0xd6, 0xa9, 0x69, 0xaa, 0xa6, 0x0e, 0x49, 0x61, 0xfc, 0xd3, 0xeb, 0xf1, 0xa2,
            0xe8, 0x91, 0x3a, 0xc6, 0x5b, 0x72,
        ],
        referrer_modulus: 86_400,
        three_char_divisor: 640 / 5,
        four_char_divisor: 160 / 5,
    };

    pub const fn with_contract_address(mut self, contract_address: [u8; 20]) -> Self {
        self.contract_address = contract_address;
        self
    }

    pub fn contract_address_value(&self) -> U256 {
        U256::from_big_endian(&self.contract_address)
    }
}

impl Default for RenewalConfig {
    fn default() -> Self {
        Self::SEPOLIA
    }
}
