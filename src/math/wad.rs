use alloy::primitives::{I256, Sign, U256, U512};

/// One WAD: 1e18, the fixed-point scale of all monetary values.
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Base of basis-point-like ratios (margin ratios, fee ratios, slippage,
/// batch allocation ratios).
pub const RATIO_BASE: u32 = 10_000;

const WAD_PER_RATIO: U256 = U256::from_limbs([100_000_000_000_000, 0, 0, 0]);

/// `a * b / denom` with a 512-bit intermediate, truncating.
///
/// Panics on a zero denominator: denominators here are notional/liquidity
/// values the caller must guarantee positive, so a zero is a caller contract
/// violation mirroring an on-chain revert, not a recoverable condition.
pub fn mul_div(a: U256, b: U256, denom: U256) -> U256 {
    assert!(!denom.is_zero(), "mul_div: zero denominator");
    narrow(U512::from(a) * U512::from(b) / U512::from(denom))
}

/// `a * b / denom` rounding the quotient up.
pub fn mul_div_up(a: U256, b: U256, denom: U256) -> U256 {
    assert!(!denom.is_zero(), "mul_div_up: zero denominator");
    let prod = U512::from(a) * U512::from(b);
    let denom = U512::from(denom);
    let quot = prod / denom;
    if prod % denom != U512::ZERO {
        narrow(quot + U512::from(1u8))
    } else {
        narrow(quot)
    }
}

fn narrow(value: U512) -> U256 {
    let limbs = value.as_limbs();
    assert!(
        limbs[4..].iter().all(|l| *l == 0),
        "mul_div: result overflows U256"
    );
    U256::from_limbs([limbs[0], limbs[1], limbs[2], limbs[3]])
}

fn signed(negative: bool, abs: U256) -> I256 {
    let sign = if negative && !abs.is_zero() {
        Sign::Negative
    } else {
        Sign::Positive
    };
    I256::checked_from_sign_and_abs(sign, abs).expect("wad value overflows I256")
}

/// WAD multiply, truncating toward zero.
pub fn wmul(a: I256, b: I256) -> I256 {
    signed(
        a.is_negative() != b.is_negative(),
        mul_div(a.unsigned_abs(), b.unsigned_abs(), WAD),
    )
}

/// WAD multiply, rounding away from zero. Used wherever rounding toward
/// zero could understate a margin requirement.
pub fn wmul_up(a: I256, b: I256) -> I256 {
    signed(
        a.is_negative() != b.is_negative(),
        mul_div_up(a.unsigned_abs(), b.unsigned_abs(), WAD),
    )
}

/// WAD divide, truncating toward zero.
pub fn wdiv(a: I256, b: I256) -> I256 {
    signed(
        a.is_negative() != b.is_negative(),
        mul_div(a.unsigned_abs(), WAD, b.unsigned_abs()),
    )
}

/// WAD divide, rounding away from zero.
pub fn wdiv_up(a: I256, b: I256) -> I256 {
    signed(
        a.is_negative() != b.is_negative(),
        mul_div_up(a.unsigned_abs(), WAD, b.unsigned_abs()),
    )
}

/// Unsigned WAD multiply, truncating.
pub fn wmulu(a: U256, b: U256) -> U256 {
    mul_div(a, b, WAD)
}

/// Unsigned WAD multiply, rounding up.
pub fn wmulu_up(a: U256, b: U256) -> U256 {
    mul_div_up(a, b, WAD)
}

/// Unsigned WAD divide, truncating.
pub fn wdivu(a: U256, b: U256) -> U256 {
    mul_div(a, WAD, b)
}

/// Unsigned WAD divide, rounding up.
pub fn wdivu_up(a: U256, b: U256) -> U256 {
    mul_div_up(a, WAD, b)
}

/// Converts a ratio with base [`RATIO_BASE`] to WAD.
pub fn r2w(ratio: u32) -> U256 {
    U256::from(ratio) * WAD_PER_RATIO
}

/// Sign-preserving proportional split `x * num / denom`, rounding the
/// magnitude away from zero. Used when partially closing a position or
/// cancelling part of an order.
pub fn frac(x: I256, num: I256, denom: I256) -> I256 {
    signed(
        (x.is_negative() != num.is_negative()) != denom.is_negative(),
        mul_div_up(x.unsigned_abs(), num.unsigned_abs(), denom.unsigned_abs()),
    )
}

/// Sign-preserving proportional split, truncating the magnitude toward zero.
pub fn frac_down(x: I256, num: I256, denom: I256) -> I256 {
    signed(
        (x.is_negative() != num.is_negative()) != denom.is_negative(),
        mul_div(x.unsigned_abs(), num.unsigned_abs(), denom.unsigned_abs()),
    )
}

/// U256 -> I256, panicking past `I256::MAX`.
pub fn u2i(value: U256) -> I256 {
    I256::checked_from_sign_and_abs(Sign::Positive, value).expect("wad value overflows I256")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i(v: i128) -> I256 {
        I256::try_from(v).unwrap()
    }

    fn w(v: i128) -> I256 {
        i(v) * I256::try_from(WAD).unwrap()
    }

    #[test]
    fn test_wmul_truncates_toward_zero() {
        assert_eq!(wmul(w(3), w(2)), w(6));
        assert_eq!(wmul(i(1), i(1)), I256::ZERO);
        assert_eq!(wmul(i(-1), i(1)), I256::ZERO);
        assert_eq!(wmul(w(-3), w(2)), w(-6));
    }

    #[test]
    fn test_wmul_up_rounds_away_from_zero() {
        assert_eq!(wmul_up(i(1), i(1)), i(1));
        assert_eq!(wmul_up(i(-1), i(1)), i(-1));
        assert_eq!(wmul_up(w(3), w(2)), w(6));
    }

    #[test]
    fn test_wdiv() {
        assert_eq!(wdiv(w(6), w(2)), w(3));
        assert_eq!(wdiv(i(1), w(3)), I256::ZERO);
        assert_eq!(wdiv_up(i(1), w(3)), i(1));
        assert_eq!(wdiv_up(i(-1), w(3)), i(-1));
    }

    #[test]
    fn test_r2w() {
        assert_eq!(r2w(RATIO_BASE), WAD);
        assert_eq!(r2w(50), WAD / U256::from(200));
        assert_eq!(r2w(0), U256::ZERO);
    }

    #[test]
    fn test_frac_preserves_sign() {
        assert_eq!(frac(w(10), i(1), i(3)), w(10) / i(3) + i(1));
        assert_eq!(frac_down(w(10), i(1), i(3)), w(10) / i(3));
        assert_eq!(frac(w(-10), i(1), i(3)), -(w(10) / i(3) + i(1)));
        assert_eq!(frac_down(w(-10), i(1), i(3)), -(w(10) / i(3)));
        assert_eq!(frac(w(10), i(-1), i(-3)), w(10) / i(3) + i(1));
    }

    #[test]
    #[should_panic(expected = "zero denominator")]
    fn test_zero_denominator_panics() {
        mul_div(U256::from(1u8), U256::from(1u8), U256::ZERO);
    }
}
