//! Range-liquidity simulation: minting a range from margin, previewing its
//! boundary positions, and converting a range back into a position on
//! removal.

use alloy::primitives::{I256, U256};
use serde::Serialize;

use crate::{
    error::SimError,
    math::{
        self, encode_limit_ticks, limit_tick, mul_div, sqrt_ratio_at_tick, u2i, wdivu, wmulu,
        wmulu_up, WAD,
    },
    state::{Amm, InstrumentSetting, Position, Range},
    types::{AddLiquidityRequest, Side, Status},
};

/// Preview of minting range liquidity from a margin amount.
#[derive(Clone, Debug, Serialize)]
pub struct AddLiquiditySimulation {
    pub liquidity: U256,
    pub range: Range,
    /// Position the range turns into if the price sweeps to the lower
    /// bound (all margin converted to base, a long).
    pub lower_position: Position,
    /// Position at the upper bound (all base sold on the way up, a short).
    pub upper_position: Position,
    pub margin: U256,
    /// Packed tick bounds for on-chain slippage protection.
    pub limit_ticks: u64,
}

/// Preview of removing a liquidity range.
#[derive(Clone, Debug, Serialize)]
pub struct RemoveLiquiditySimulation {
    /// Position swept out of the range before merging.
    pub swept: Position,
    /// Account position after merging the swept range.
    pub position: Position,
    pub realized: I256,
    pub closed_size: I256,
    /// Packed tick bounds for on-chain slippage protection.
    pub limit_ticks: u64,
}

/// Sqrt price rescaled from Q96 to WAD.
fn sqrt_wad(sqrt_px96: U256) -> U256 {
    mul_div(sqrt_px96, WAD, U256::from(1u8) << 96)
}

/// Packed worst-case tick bounds `slippage` away from the current fair
/// price, at least one tick wide.
fn slippage_limit_ticks(amm: &Amm, slippage: u32) -> Result<u64, SimError> {
    let fair = amm.fair_price();
    let lower = limit_tick(fair, slippage, Side::Short)?;
    let upper = limit_tick(fair, slippage, Side::Long)?.max(lower + 1);
    encode_limit_ticks(sqrt_ratio_at_tick(lower)?, sqrt_ratio_at_tick(upper)?)
}

/// Simulates minting liquidity over `[lower, upper]` from a margin amount.
///
/// The current price must sit inside the range; the minted liquidity is
/// `margin / (2·√p − √p_lower − p/√p_upper)`, all in WAD sqrt-price terms.
pub fn simulate_add_liquidity(
    amm: &Amm,
    setting: &InstrumentSetting,
    request: &AddLiquidityRequest,
) -> Result<AddLiquiditySimulation, SimError> {
    if amm.status() != Status::Trading {
        return Err(SimError::MarketNotTrading(amm.status()));
    }
    let (lower, upper) = (request.lower_tick(), request.upper_tick());
    if lower >= upper || amm.tick() < lower || amm.tick() >= upper {
        return Err(SimError::InvalidRange { lower, upper });
    }
    math::check_aligned(lower, setting.tick_spacing())?;
    math::check_aligned(upper, setting.tick_spacing())?;
    if request.margin() <= I256::ZERO {
        return Err(SimError::InvalidSize(request.margin()));
    }
    let margin = request.margin().unsigned_abs();

    let sp = sqrt_wad(amm.sqrt_px96());
    let sl = sqrt_wad(sqrt_ratio_at_tick(lower)?);
    let su = sqrt_wad(sqrt_ratio_at_tick(upper)?);
    let price = wmulu(sp, sp);
    // 2√p − √p_lower − p/√p_upper, as a sum of two non-negative terms
    let denom = (sp - sl) + (sp - wdivu(price, su));
    if denom.is_zero() {
        return Err(SimError::InvalidRange { lower, upper });
    }
    let liquidity = wdivu(margin, denom);

    let lower_size = wdivu(wmulu(liquidity, sp - sl), wmulu(sl, sp));
    let lower_position = Position::new(
        u2i(lower_size),
        u2i(margin),
        wmulu(liquidity, sp - sl),
        amm.long_social_loss_index(),
        amm.long_funding_index(),
    );
    let upper_size = wdivu(wmulu(liquidity, su - sp), wmulu(sp, su));
    let upper_position = Position::new(
        -u2i(upper_size),
        u2i(margin),
        wmulu(liquidity, su - sp),
        amm.short_social_loss_index(),
        amm.short_funding_index(),
    );

    Ok(AddLiquiditySimulation {
        liquidity,
        range: Range::new(
            liquidity,
            amm.fee_index(),
            margin,
            amm.sqrt_px96(),
            lower,
            upper,
        ),
        lower_position,
        upper_position,
        margin,
        limit_ticks: slippage_limit_ticks(amm, request.slippage())?,
    })
}

/// Converts a liquidity range into the position its removal sweeps out at
/// the current price: base acquired (or sold) between the entry sqrt price
/// and the current one, with accrued fees credited to the balance.
pub fn range_to_position(amm: &Amm, range: &Range) -> Result<Position, SimError> {
    let sl96 = sqrt_ratio_at_tick(range.lower_tick())?;
    let su96 = sqrt_ratio_at_tick(range.upper_tick())?;
    let current = sqrt_wad(amm.sqrt_px96().clamp(sl96, su96));
    let entry = sqrt_wad(range.sqrt_entry_px96());

    let size = u2i(wdivu(range.liquidity(), current)) - u2i(wdivu(range.liquidity(), entry));
    let entry_notional = wmulu(range.liquidity(), entry.abs_diff(current));
    let fee_credit = wmulu(
        amm.fee_index().saturating_sub(range.entry_fee_index()),
        range.liquidity(),
    );
    Ok(Position::new(
        size,
        u2i(range.balance() + fee_credit),
        entry_notional,
        amm.social_loss_index_of(size),
        amm.funding_index_of(size),
    ))
}

/// Simulates removing a range and merging the swept position into the
/// account position. The merged result must stay maintenance-margin safe.
pub fn simulate_remove_liquidity(
    amm: &Amm,
    setting: &InstrumentSetting,
    position: &Position,
    range: &Range,
    slippage: u32,
) -> Result<RemoveLiquiditySimulation, SimError> {
    if amm.status() != Status::Trading {
        return Err(SimError::MarketNotTrading(amm.status()));
    }
    let swept = range_to_position(amm, range)?;
    let merged = Position::combine(amm, position, &swept);

    let fair = amm.fair_price();
    let tally = merged.position.tally(amm, fair);
    let requirement = wmulu_up(merged.position.value(fair), setting.mmr_wad());
    if tally.equity < u2i(requirement) {
        return Err(SimError::InsufficientMargin);
    }

    Ok(RemoveLiquiditySimulation {
        swept,
        position: merged.position,
        realized: merged.realized,
        closed_size: merged.closed_size,
        limit_ticks: slippage_limit_ticks(amm, slippage)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PERP_EXPIRY;

    fn w(v: i64) -> I256 {
        I256::try_from(v).unwrap() * I256::try_from(WAD).unwrap()
    }

    fn wu(v: u64) -> U256 {
        U256::from(v) * WAD
    }

    fn setting() -> InstrumentSetting {
        InstrumentSetting::new(1_000, 300, 10, 5, 0, wu(1), 5)
    }

    fn amm_at(tick: i32) -> Amm {
        amm_with_fee_index(tick, U256::ZERO)
    }

    fn amm_with_fee_index(tick: i32, fee_index: U256) -> Amm {
        Amm::new(
            PERP_EXPIRY,
            1_000,
            Status::Trading,
            tick,
            sqrt_ratio_at_tick(tick).unwrap(),
            wu(1_000_000),
            wu(500),
            wu(500),
            fee_index,
            U256::ZERO,
            U256::ZERO,
            I256::ZERO,
            I256::ZERO,
            U256::ZERO,
            U256::ZERO,
        )
    }

    #[test]
    fn test_add_liquidity_symmetric_range() {
        let amm = amm_at(0);
        let req = AddLiquidityRequest::new(-1_000, 1_000, w(100), 100);
        let sim = simulate_add_liquidity(&amm, &setting(), &req).unwrap();
        assert!(sim.liquidity > U256::ZERO);
        assert_eq!(sim.margin, wu(100));
        assert_eq!(sim.range.liquidity(), sim.liquidity);
        assert_eq!(sim.range.sqrt_entry_px96(), amm.sqrt_px96());

        // Boundary previews: long at the lower bound, short at the upper,
        // near-equal magnitudes for a symmetric range around the price
        assert!(sim.lower_position.size() > I256::ZERO);
        assert!(sim.upper_position.size() < I256::ZERO);
        let long = sim.lower_position.size().unsigned_abs();
        let short = sim.upper_position.size().unsigned_abs();
        let diff = long.abs_diff(short);
        assert!(diff < long / U256::from(10u8), "{long} vs {short}");
    }

    #[test]
    fn test_add_liquidity_validation() {
        let amm = amm_at(0);
        let set = setting();
        assert!(matches!(
            simulate_add_liquidity(&amm, &set, &AddLiquidityRequest::new(1_000, -1_000, w(100), 100)),
            Err(SimError::InvalidRange { .. })
        ));
        // Price outside the range
        assert!(matches!(
            simulate_add_liquidity(&amm, &set, &AddLiquidityRequest::new(500, 1_000, w(100), 100)),
            Err(SimError::InvalidRange { .. })
        ));
        assert!(matches!(
            simulate_add_liquidity(&amm, &set, &AddLiquidityRequest::new(-1_002, 1_000, w(100), 100)),
            Err(SimError::MisalignedTick { .. })
        ));
        assert!(matches!(
            simulate_add_liquidity(&amm, &set, &AddLiquidityRequest::new(-1_000, 1_000, w(0), 100)),
            Err(SimError::InvalidSize(_))
        ));
    }

    #[test]
    fn test_range_sweeps_long_when_price_falls() {
        let minted = amm_at(0);
        let req = AddLiquidityRequest::new(-1_000, 1_000, w(100), 100);
        let sim = simulate_add_liquidity(&minted, &setting(), &req).unwrap();

        let moved = amm_at(-500);
        let swept = range_to_position(&moved, &sim.range).unwrap();
        assert!(swept.size() > I256::ZERO);
        assert!(swept.entry_notional() > U256::ZERO);
        assert_eq!(swept.balance(), u2i(wu(100)));

        // Swept size never exceeds the lower-bound preview
        assert!(swept.size() < sim.lower_position.size());
    }

    #[test]
    fn test_range_sweeps_short_when_price_rises() {
        let minted = amm_at(0);
        let req = AddLiquidityRequest::new(-1_000, 1_000, w(100), 100);
        let sim = simulate_add_liquidity(&minted, &setting(), &req).unwrap();

        let moved = amm_at(400);
        let swept = range_to_position(&moved, &sim.range).unwrap();
        assert!(swept.size() < I256::ZERO);
    }

    #[test]
    fn test_range_clamps_outside_price_to_bound() {
        let minted = amm_at(0);
        let req = AddLiquidityRequest::new(-1_000, 1_000, w(100), 100);
        let sim = simulate_add_liquidity(&minted, &setting(), &req).unwrap();

        // Price far below the range: sweep matches the lower-bound preview
        // up to fixed-point rounding
        let moved = amm_at(-5_000);
        let swept = range_to_position(&moved, &sim.range).unwrap();
        let diff = (swept.size() - sim.lower_position.size()).unsigned_abs();
        assert!(diff <= U256::from(10u8), "diff {diff}");
    }

    #[test]
    fn test_fee_index_credited_on_removal() {
        let minted = amm_at(0);
        let req = AddLiquidityRequest::new(-1_000, 1_000, w(100), 100);
        let sim = simulate_add_liquidity(&minted, &setting(), &req).unwrap();

        // Fee index grew by 0.01 per unit of liquidity
        let fee_index = WAD / U256::from(100u8);
        let moved = amm_with_fee_index(0, fee_index);
        let swept = range_to_position(&moved, &sim.range).unwrap();
        let credit = wmulu(fee_index, sim.liquidity);
        assert_eq!(swept.balance(), u2i(wu(100) + credit));
        // Price unchanged: nothing swept
        assert_eq!(swept.size(), I256::ZERO);
    }

    #[test]
    fn test_remove_liquidity_merges_and_checks_margin() {
        let minted = amm_at(0);
        let req = AddLiquidityRequest::new(-1_000, 1_000, w(100), 100);
        let sim = simulate_add_liquidity(&minted, &setting(), &req).unwrap();

        let moved = amm_at(-500);
        let removal =
            simulate_remove_liquidity(&moved, &setting(), &Position::default(), &sim.range, 100)
                .unwrap();
        assert_eq!(removal.position.size(), removal.swept.size());
        assert_eq!(removal.realized, I256::ZERO);

        // An underwater account position makes the merged result fail MMR
        let debt = Position::flat(w(-200));
        assert!(matches!(
            simulate_remove_liquidity(&moved, &setting(), &debt, &sim.range, 100),
            Err(SimError::InsufficientMargin)
        ));
    }

    #[test]
    fn test_limit_ticks_bracket_current_tick() {
        let amm = amm_at(1_000);
        let packed = slippage_limit_ticks(&amm, 100).unwrap();
        let lower = ((packed & 0xFF_FFFF) as u32 as i32) << 8 >> 8;
        let upper = ((packed >> 24) as u32 as i32) << 8 >> 8;
        assert!(lower < 1_000 && 1_000 < upper, "{lower}..{upper}");
    }
}
