use alloy::primitives::{I256, U256};
use fastnum::{
    D256, UD256, bint,
    decimal::{Context, RoundingMode},
};

/// Scale of WAD fixed-point values.
pub const WAD_DECIMALS: u8 = 18;

/// Fixed-point to decimal converter.
///
/// The simulation core works on raw WAD/Q96 integers for bit-exactness with
/// the on-chain contracts; this converter produces human-readable decimal
/// views of those values for reporting and UI layers.
#[derive(Clone, Copy, Debug)]
pub struct Converter {
    decimals: i32,
}

impl Default for Converter {
    fn default() -> Self {
        Self::wad()
    }
}

impl Converter {
    /// Converter for WAD (1e18) scaled values.
    pub fn wad() -> Self {
        Self::new(WAD_DECIMALS)
    }

    /// Converter for an arbitrary fixed-point scale, e.g. a quote token
    /// with 6 decimals.
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn from_unsigned(&self, value: U256) -> UD256 {
        let unscaled = bint::UInt::<4>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<4>");
        UD256::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    pub fn from_signed(&self, value: I256) -> D256 {
        let unscaled = bint::UInt::<4>::from_le_slice(value.unsigned_abs().as_le_slice())
            .expect("Converter: abs(I256) -> UInt::<4>");
        D256::from_parts(
            unscaled,
            -self.decimals,
            match value.sign() {
                alloy::primitives::Sign::Negative => fastnum::decimal::Sign::Minus,
                alloy::primitives::Sign::Positive => fastnum::decimal::Sign::Plus,
            },
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    pub fn to_unsigned(&self, value: UD256) -> U256 {
        let rescaled = value.rescale(self.decimals as i16);
        U256::from_le_slice(rescaled.digits().to_radix_le(256).as_slice())
    }

    pub fn to_signed(&self, value: D256) -> I256 {
        let rescaled = value.rescale(self.decimals as i16);
        let mut res = I256::try_from_le_slice(rescaled.digits().to_radix_le(256).as_slice())
            .unwrap_or_default();
        if value.is_negative() {
            res = res.saturating_neg();
        }
        res
    }
}
