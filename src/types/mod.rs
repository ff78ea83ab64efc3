mod request;

pub use request::*;

use alloy::primitives::{Address, I256};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Expiry sentinel of the perpetual (non-expiring) market.
pub const PERP_EXPIRY: u32 = u32::MAX;

/// Market identifier: an instrument plus one of its expiries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairId {
    instrument: Address,
    expiry: u32,
}

impl PairId {
    pub fn new(instrument: Address, expiry: u32) -> Self {
        Self { instrument, expiry }
    }

    pub fn perp(instrument: Address) -> Self {
        Self::new(instrument, PERP_EXPIRY)
    }

    /// Address of the instrument contract.
    pub fn instrument(&self) -> Address {
        self.instrument
    }

    /// Expiry timestamp, or [`PERP_EXPIRY`] for the perpetual market.
    pub fn expiry(&self) -> u32 {
        self.expiry
    }

    pub fn is_perp(&self) -> bool {
        self.expiry == PERP_EXPIRY
    }
}

/// Direction of a position, trade, or resting order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
    Flat,
}

impl Side {
    /// Side carried by the sign of a size.
    pub fn of_size(size: I256) -> Self {
        if size.is_zero() {
            Side::Flat
        } else if size.is_negative() {
            Side::Short
        } else {
            Side::Long
        }
    }

    /// +1 for long, -1 for short. Flat has no sign; contexts requiring a
    /// direction must reject it.
    pub fn sign(self) -> Result<I256, SimError> {
        match self {
            Side::Long => Ok(I256::ONE),
            Side::Short => Ok(-I256::ONE),
            Side::Flat => Err(SimError::FlatSide),
        }
    }

    pub fn is_long(self) -> bool {
        matches!(self, Side::Long)
    }

    pub fn is_short(self) -> bool {
        matches!(self, Side::Short)
    }
}

/// Lifecycle status of a market.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Dormant,
    Trading,
    Settling,
    Settled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_of_size() {
        assert_eq!(Side::of_size(I256::ONE), Side::Long);
        assert_eq!(Side::of_size(-I256::ONE), Side::Short);
        assert_eq!(Side::of_size(I256::ZERO), Side::Flat);
    }

    #[test]
    fn test_side_predicates() {
        assert!(Side::Long.is_long() && !Side::Long.is_short());
        assert!(Side::Short.is_short() && !Side::Short.is_long());
        assert!(!Side::Flat.is_long() && !Side::Flat.is_short());
    }

    #[test]
    fn test_flat_sign_is_error() {
        assert_eq!(Side::Long.sign().unwrap(), I256::ONE);
        assert_eq!(Side::Short.sign().unwrap(), -I256::ONE);
        assert!(matches!(Side::Flat.sign(), Err(SimError::FlatSide)));
    }
}
