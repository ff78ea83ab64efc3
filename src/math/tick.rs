//! Tick / price / sqrt-price conversions.
//!
//! Ticks index a geometric price grid: `price(tick) = 1.0001^tick`. On
//! chain the price lives as a Q96 sqrt price; the simulation layer works in
//! WAD. The per-bit factor tables (`1.0001^(2^i)` and its square root, both
//! Q128) are derived once from the exact rational 10001/10000, so the
//! forward and inverse maps are consistent to the last bit.

use std::sync::LazyLock;

use alloy::primitives::{U256, U512};

use super::wad::{self, RATIO_BASE, WAD};
use crate::{error::SimError, types::Side};

/// Lowest representable tick.
pub const MIN_TICK: i32 = -887_272;

/// Highest representable tick.
pub const MAX_TICK: i32 = 887_272;

const BITS: usize = 20; // MAX_TICK < 2^20

struct FactorTables {
    /// `1.0001^(2^i)` in Q128.
    price: [U256; BITS],
    /// `sqrt(1.0001)^(2^i)` in Q128.
    sqrt: [U256; BITS],
}

static TABLES: LazyLock<FactorTables> = LazyLock::new(|| {
    let mut price = [U256::ZERO; BITS];
    let mut sqrt = [U256::ZERO; BITS];
    price[0] = (U256::from(10_001u32) << 128) / U256::from(10_000u32);
    for i in 1..BITS {
        price[i] = mul_shift(price[i - 1], price[i - 1]);
    }
    for i in 0..BITS {
        sqrt[i] = narrow(isqrt(U512::from(price[i]) << 128));
    }
    FactorTables { price, sqrt }
});

/// `a * b >> 128` for Q128 factors.
fn mul_shift(a: U256, b: U256) -> U256 {
    narrow((U512::from(a) * U512::from(b)) >> 128)
}

fn narrow(value: U512) -> U256 {
    let limbs = value.as_limbs();
    debug_assert!(limbs[4..].iter().all(|l| *l == 0));
    U256::from_limbs([limbs[0], limbs[1], limbs[2], limbs[3]])
}

/// Integer square root by Newton iteration.
fn isqrt(x: U512) -> U512 {
    if x.is_zero() {
        return x;
    }
    let one = U512::from(1u8);
    let mut z = one << x.bit_len().div_ceil(2);
    let mut y = (z + x / z) >> 1;
    while y < z {
        z = y;
        y = (z + x / z) >> 1;
    }
    z
}

fn check_tick(tick: i32) -> Result<(), SimError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(SimError::TickOutOfRange(tick));
    }
    Ok(())
}

/// Product of the Q128 factors selected by the bits of `tick_abs`.
fn factor_product(tick_abs: u32, table: &[U256; BITS]) -> U512 {
    let mut acc = U512::from(1u8) << 128;
    for (i, factor) in table.iter().enumerate() {
        if tick_abs & (1 << i) != 0 {
            acc = (acc * U512::from(*factor)) >> 128;
        }
    }
    acc
}

/// WAD price at `tick`: `1.0001^tick * 1e18`, truncated.
pub fn wad_at_tick(tick: i32) -> Result<U256, SimError> {
    check_tick(tick)?;
    let acc = factor_product(tick.unsigned_abs(), &TABLES.price);
    let wad = if tick >= 0 {
        (acc * U512::from(WAD)) >> 128
    } else {
        (U512::from(WAD) << 128) / acc
    };
    Ok(narrow(wad))
}

/// Q96 sqrt price at `tick`: `sqrt(1.0001^tick) * 2^96`.
pub fn sqrt_ratio_at_tick(tick: i32) -> Result<U256, SimError> {
    check_tick(tick)?;
    let acc = factor_product(tick.unsigned_abs(), &TABLES.sqrt);
    let ratio = if tick >= 0 {
        acc >> 32
    } else {
        (U512::from(1u8) << 224) / acc
    };
    Ok(narrow(ratio))
}

/// Greatest tick whose price does not exceed `price_wad`.
pub fn tick_at_wad(price_wad: U256) -> Result<i32, SimError> {
    if price_wad.is_zero()
        || price_wad < wad_at_tick(MIN_TICK)?
        || price_wad > wad_at_tick(MAX_TICK)?
    {
        return Err(SimError::PriceOutOfRange(price_wad));
    }
    let (mut lo, mut hi) = (MIN_TICK, MAX_TICK);
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if wad_at_tick(mid)? <= price_wad {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(lo)
}

/// Greatest tick whose sqrt ratio does not exceed `sqrt_px96`.
pub fn tick_at_sqrt_ratio(sqrt_px96: U256) -> Result<i32, SimError> {
    if sqrt_px96 < sqrt_ratio_at_tick(MIN_TICK)? || sqrt_px96 > sqrt_ratio_at_tick(MAX_TICK)? {
        return Err(SimError::PriceOutOfRange(sqrt_px96));
    }
    let (mut lo, mut hi) = (MIN_TICK, MAX_TICK);
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if sqrt_ratio_at_tick(mid)? <= sqrt_px96 {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(lo)
}

/// Squares a Q96 sqrt price and rescales to a WAD price.
pub fn sqrt_x96_to_wad(sqrt_px96: U256) -> U256 {
    let s = U512::from(sqrt_px96);
    narrow((s * s * U512::from(WAD)) >> 192)
}

/// Rounds `tick` to the nearest tick aligned to `spacing`.
pub fn normalize_tick(tick: i32, spacing: i32) -> Result<i32, SimError> {
    assert!(spacing > 0, "normalize_tick: non-positive spacing");
    let rem = tick.rem_euclid(spacing);
    let aligned = if 2 * rem >= spacing {
        tick - rem + spacing
    } else {
        tick - rem
    };
    check_tick(aligned)?;
    Ok(aligned)
}

pub(crate) fn check_aligned(tick: i32, spacing: i32) -> Result<(), SimError> {
    check_tick(tick)?;
    if spacing <= 0 || tick % spacing != 0 {
        return Err(SimError::MisalignedTick { tick, spacing });
    }
    Ok(())
}

/// Worst acceptable execution tick for a trade at `price_wad` given a
/// slippage tolerance in basis points of [`RATIO_BASE`]. Longs tolerate a
/// higher price, shorts a lower one.
pub fn limit_tick(price_wad: U256, slippage: u32, side: Side) -> Result<i32, SimError> {
    let sign = side.sign()?;
    if sign.is_positive() {
        let limit = wad::mul_div(
            price_wad,
            U256::from(RATIO_BASE + slippage),
            U256::from(RATIO_BASE),
        );
        tick_at_wad(limit)
    } else {
        let limit = wad::mul_div_up(
            price_wad,
            U256::from(RATIO_BASE.saturating_sub(slippage)),
            U256::from(RATIO_BASE),
        );
        // Smallest tick whose price is not below the limit
        let tick = tick_at_wad(limit)?;
        if wad_at_tick(tick)? < limit {
            check_tick(tick + 1)?;
            Ok(tick + 1)
        } else {
            Ok(tick)
        }
    }
}

/// Packs the ticks of two sqrt-price bounds into a single value for
/// liquidity-removal slippage protection: `(upper_int24 << 24) | lower_int24`.
pub fn encode_limit_ticks(lower_sqrt_px96: U256, upper_sqrt_px96: U256) -> Result<u64, SimError> {
    let lower = tick_at_sqrt_ratio(lower_sqrt_px96)?;
    let upper = tick_at_sqrt_ratio(upper_sqrt_px96)?;
    if lower >= upper {
        return Err(SimError::InvalidRange { lower, upper });
    }
    const INT24_MASK: u64 = 0xFF_FFFF;
    Ok(((upper as u32 as u64 & INT24_MASK) << 24) | (lower as u32 as u64 & INT24_MASK))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wad_at_tick_base_points() {
        assert_eq!(wad_at_tick(0).unwrap(), WAD);
        // One tick is a 0.01% step, modulo Q128 truncation
        let up = wad_at_tick(1).unwrap();
        let expected = WAD + WAD / U256::from(10_000u32);
        assert!(up.abs_diff(expected) <= U256::from(2u8), "{up}");
        let down = wad_at_tick(-1).unwrap();
        assert!(down < WAD && down > WAD - WAD / U256::from(9_000u32));
    }

    #[test]
    fn test_sqrt_ratio_at_tick_zero_is_q96() {
        assert_eq!(sqrt_ratio_at_tick(0).unwrap(), U256::from(1u8) << 96);
    }

    #[test]
    fn test_sqrt_and_wad_agree() {
        for tick in [-100_000, -5_000, -1, 0, 1, 64, 12_345, 200_000] {
            let via_sqrt = sqrt_x96_to_wad(sqrt_ratio_at_tick(tick).unwrap());
            let direct = wad_at_tick(tick).unwrap();
            let diff = via_sqrt.abs_diff(direct);
            // Fixed-point rounding tolerance only
            assert!(
                diff <= direct / U256::from(1_000_000_000_000u64) + U256::from(2u8),
                "tick {tick}: {via_sqrt} vs {direct}"
            );
        }
    }

    #[test]
    fn test_tick_at_wad_round_trip() {
        for tick in [-250_000, -33_333, -1, 0, 1, 777, 100_001, 300_000] {
            let price = wad_at_tick(tick).unwrap();
            let back = tick_at_wad(price).unwrap();
            assert!((back - tick).abs() <= 1, "tick {tick} -> {back}");
        }
    }

    #[test]
    fn test_tick_at_sqrt_ratio_round_trip() {
        for tick in [MIN_TICK, -887_271, -400_000, -1, 0, 1, 400_000, MAX_TICK] {
            let ratio = sqrt_ratio_at_tick(tick).unwrap();
            assert_eq!(tick_at_sqrt_ratio(ratio).unwrap(), tick);
        }
    }

    #[test]
    fn test_out_of_range_tick_fails() {
        assert!(matches!(
            wad_at_tick(MAX_TICK + 1),
            Err(SimError::TickOutOfRange(_))
        ));
        assert!(matches!(
            sqrt_ratio_at_tick(MIN_TICK - 1),
            Err(SimError::TickOutOfRange(_))
        ));
        assert!(matches!(
            tick_at_wad(U256::ZERO),
            Err(SimError::PriceOutOfRange(_))
        ));
    }

    #[test]
    fn test_normalize_tick() {
        assert_eq!(normalize_tick(7, 5).unwrap(), 5);
        assert_eq!(normalize_tick(8, 5).unwrap(), 10);
        assert_eq!(normalize_tick(-7, 5).unwrap(), -5);
        assert_eq!(normalize_tick(-8, 5).unwrap(), -10);
        assert_eq!(normalize_tick(10, 5).unwrap(), 10);
    }

    #[test]
    fn test_limit_tick_direction() {
        let price = wad_at_tick(1_000).unwrap();
        let long = limit_tick(price, 500, Side::Long).unwrap();
        let short = limit_tick(price, 500, Side::Short).unwrap();
        // 5% is about 488 ticks
        assert!(long > 1_400 && long < 1_500, "long limit {long}");
        assert!(short > -600 + 1_000 && short < 1_000 - 400, "short limit {short}");
        assert!(limit_tick(price, 500, Side::Flat).is_err());
    }

    #[test]
    fn test_encode_limit_ticks() {
        let lower = sqrt_ratio_at_tick(-100).unwrap();
        let upper = sqrt_ratio_at_tick(100).unwrap();
        let packed = encode_limit_ticks(lower, upper).unwrap();
        assert_eq!(packed >> 24, 100);
        assert_eq!(packed & 0xFF_FFFF, (-100i32 as u32 & 0xFF_FFFF) as u64);
        assert!(encode_limit_ticks(upper, lower).is_err());
    }
}
