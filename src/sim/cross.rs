//! Cross-market order: split one intent into an immediate market trade that
//! walks the AMM price to a target tick, plus a resting order for the
//! remainder.

use alloy::primitives::{I256, U256};
use serde::Serialize;

use crate::{
    error::SimError,
    math::{self, u2i},
    provider::Inquiry,
    sim::{
        order::{OrderSimulation, min_order_size, simulate_order},
        trade::{TradeSimulation, simulate_trade},
    },
    state::{Amm, InstrumentSetting, Position, Quotation},
    types::{CrossMarketRequest, PairId, PlaceOrderRequest, Status, TradeRequest},
};

/// Preview of a cross-market order.
#[derive(Clone, Debug, Serialize)]
pub struct CrossMarketSimulation {
    /// Whether the requested size covers both the market sweep and a
    /// minimum viable resting order. When false, `order_size` carries the
    /// minimum viable order size instead of the remainder and no previews
    /// are produced for the resting leg.
    pub can_place_order: bool,
    /// Signed size of the immediate market leg.
    pub swap_size: I256,
    /// Size of the resting leg, or the minimum viable order size when the
    /// split is unsatisfiable.
    pub order_size: I256,
    /// Market-leg preview, absent when the AMM already sits at or past the
    /// target tick.
    pub trade: Option<TradeSimulation>,
    /// Resting-leg preview, absent when the split is unsatisfiable.
    pub order: Option<OrderSimulation>,
}

/// Simulates walking the AMM to `request.target_tick` and resting the
/// remainder of `request.base_size` there.
///
/// The market-leg size comes from the tick-targeted inquiry; if the quoted
/// post-trade tick does not strictly reach the target, one retry is made a
/// spacing step past it.
pub fn simulate_cross_market_order(
    inquiry: &impl Inquiry,
    pair: &PairId,
    amm: &Amm,
    setting: &InstrumentSetting,
    position: &Position,
    request: &CrossMarketRequest,
    now: u64,
) -> Result<CrossMarketSimulation, SimError> {
    if amm.status() != Status::Trading {
        return Err(SimError::MarketNotTrading(amm.status()));
    }
    if request.base_size() <= I256::ZERO {
        return Err(SimError::InvalidSize(request.base_size()));
    }
    request.side().sign()?;
    math::check_aligned(request.target_tick(), setting.tick_spacing())?;

    let (swap_size, quotation) = inquire_to_tick(inquiry, pair, setting, request)?;
    let swap_abs = swap_size.unsigned_abs();
    let min_order = u2i(min_order_size(setting, request.target_tick())?);

    let remainder = request.base_size() - u2i(swap_abs);
    let market_too_small = position.is_flat()
        && !swap_abs.is_zero()
        && quotation.entry_notional() < setting.min_trade_value();
    if remainder < min_order || market_too_small {
        return Ok(CrossMarketSimulation {
            can_place_order: false,
            swap_size,
            order_size: min_order,
            trade: None,
            order: None,
        });
    }

    let trade = if swap_abs.is_zero() {
        None
    } else {
        let trade_request = TradeRequest::with_leverage(
            request.side(),
            u2i(swap_abs),
            request.leverage(),
            request.slippage(),
        );
        Some(simulate_trade(
            amm,
            setting,
            position,
            &quotation,
            &trade_request,
            now,
        )?)
    };

    // The resting leg sits at the target tick, which the market leg has
    // just swept the price to; validate it against the post-trade tick
    let post_amm = Amm::new(
        amm.expiry(),
        amm.timestamp(),
        amm.status(),
        quotation.post_tick(),
        quotation.sqrt_post_fair_px96(),
        amm.liquidity(),
        amm.total_long(),
        amm.total_short(),
        amm.fee_index(),
        amm.long_social_loss_index(),
        amm.short_social_loss_index(),
        amm.long_funding_index(),
        amm.short_funding_index(),
        amm.insurance_fund(),
        amm.settlement_price(),
    );
    let order_request =
        PlaceOrderRequest::new(request.target_tick(), request.side(), remainder, request.leverage());
    let order = match simulate_order(&post_amm, setting, &order_request) {
        Ok(sim) => Some(sim),
        // The sweep stopped exactly on the target tick: an order there
        // would sit at the current price, which the contract rejects
        Err(SimError::SideTickMismatch { .. }) => None,
        Err(err) => return Err(err),
    };

    Ok(CrossMarketSimulation {
        can_place_order: true,
        swap_size,
        order_size: remainder,
        trade,
        order,
    })
}

/// Asks the inquiry for the size that walks the price to the target tick,
/// retrying once a spacing step further when the quoted post-trade tick
/// falls short.
fn inquire_to_tick(
    inquiry: &impl Inquiry,
    pair: &PairId,
    setting: &InstrumentSetting,
    request: &CrossMarketRequest,
) -> Result<(I256, Quotation), SimError> {
    let sign = request.side().sign()?;
    let target = request.target_tick();
    let (size, quotation) = inquiry.inquire_by_tick(pair, target)?;
    let reached = if sign.is_positive() {
        quotation.post_tick() >= target
    } else {
        quotation.post_tick() <= target
    };
    if reached || size.is_zero() {
        return Ok((size, quotation));
    }
    let adjusted = if sign.is_positive() {
        target + setting.tick_spacing()
    } else {
        target - setting.tick_spacing()
    };
    tracing::debug!(target, adjusted, "post-trade tick short of target, retrying");
    inquiry.inquire_by_tick(pair, adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        math::{WAD, sqrt_ratio_at_tick, wad_at_tick, wmulu},
        types::{PERP_EXPIRY, Side},
    };
    use alloy::primitives::Address;

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
        Amm::new(
            PERP_EXPIRY,
            1_000,
            Status::Trading,
            tick,
            sqrt_ratio_at_tick(tick).unwrap(),
            wu(1_000_000),
            wu(500),
            wu(500),
            U256::ZERO,
            U256::ZERO,
            U256::ZERO,
            I256::ZERO,
            I256::ZERO,
            U256::ZERO,
            U256::ZERO,
        )
    }

    /// Quotes a fixed size to any target, filling at the tick's price.
    struct FixedSweep {
        amm_tick: i32,
        size: I256,
    }

    impl Inquiry for FixedSweep {
        fn inquire_by_size(&self, _pair: &PairId, size: I256) -> Result<Quotation, SimError> {
            let price = wad_at_tick(self.amm_tick).unwrap();
            let sqrt = sqrt_ratio_at_tick(self.amm_tick).unwrap();
            Ok(Quotation::new(
                price,
                price,
                sqrt,
                sqrt,
                self.amm_tick,
                wmulu(price, size.unsigned_abs()),
                U256::ZERO,
            ))
        }

        fn inquire_by_tick(&self, pair: &PairId, tick: i32) -> Result<(I256, Quotation), SimError> {
            let base = self.inquire_by_size(pair, self.size)?;
            // A zero sweep leaves the price where it is
            let post_tick = if self.size.is_zero() { self.amm_tick } else { tick };
            let quotation = Quotation::new(
                base.benchmark(),
                base.mark_price(),
                base.sqrt_fair_px96(),
                sqrt_ratio_at_tick(post_tick).unwrap(),
                post_tick,
                base.entry_notional(),
                base.fee(),
            );
            Ok((self.size, quotation))
        }
    }

    #[test]
    fn test_splits_market_and_resting_legs() {
        let amm = amm_at(1_000);
        let set = setting();
        let pair = PairId::perp(Address::ZERO);
        // Sweep up to tick 1100 takes 10 units (~11 notional, above the
        // flat-account minimum trade value), 20 requested
        let inquiry = FixedSweep {
            amm_tick: 1_000,
            size: w(10),
        };
        let req = CrossMarketRequest::new(1_100, Side::Long, w(20), wu(5), 100);
        let sim =
            simulate_cross_market_order(&inquiry, &pair, &amm, &set, &Position::default(), &req, 1_000)
                .unwrap();
        assert!(sim.can_place_order);
        assert_eq!(sim.swap_size, w(10));
        assert_eq!(sim.order_size, w(10));
        assert!(sim.trade.is_some());
        // The sweep stops exactly on the target tick, so the resting leg
        // cannot sit there yet and its preview is skipped
        assert!(sim.order.is_none());
    }

    #[test]
    fn test_short_cross_market_splits() {
        let amm = amm_at(1_000);
        let set = setting();
        let pair = PairId::perp(Address::ZERO);
        let inquiry = FixedSweep {
            amm_tick: 1_000,
            size: w(10),
        };
        // Short walking the price down: remainder rests at the target
        let req = CrossMarketRequest::new(900, Side::Short, w(20), wu(5), 100);
        let sim =
            simulate_cross_market_order(&inquiry, &pair, &amm, &set, &Position::default(), &req, 1_000)
                .unwrap();
        assert!(sim.can_place_order);
        assert_eq!(sim.swap_size, w(10));
        assert_eq!(sim.order_size, w(10));
    }

    #[test]
    fn test_unsatisfiable_remainder_reports_min_order_size() {
        let amm = amm_at(1_000);
        let set = setting();
        let pair = PairId::perp(Address::ZERO);
        // Sweep eats 9.5 of 10; min order size at tick 1100 is ~9 units
        // (10 WAD value at price ~1.1), so the remainder cannot rest
        let inquiry = FixedSweep {
            amm_tick: 1_000,
            size: w(19) / I256::try_from(2).unwrap(),
        };
        let req = CrossMarketRequest::new(1_100, Side::Long, w(10), wu(5), 100);
        let sim =
            simulate_cross_market_order(&inquiry, &pair, &amm, &set, &Position::default(), &req, 1_000)
                .unwrap();
        assert!(!sim.can_place_order);
        assert_eq!(
            sim.order_size,
            u2i(min_order_size(&set, 1_100).unwrap())
        );
        assert!(sim.trade.is_none());
        assert!(sim.order.is_none());
    }

    #[test]
    fn test_flat_account_market_leg_below_min_trade_value() {
        let amm = amm_at(1_000);
        let set = setting();
        let pair = PairId::perp(Address::ZERO);
        // Tiny sweep: notional ~1.1, min trade value is 10
        let inquiry = FixedSweep {
            amm_tick: 1_000,
            size: w(1),
        };
        assert!(wmulu(wad_at_tick(1_000).unwrap(), WAD) < set.min_trade_value());
        let req = CrossMarketRequest::new(1_100, Side::Long, w(100), wu(5), 100);
        let sim =
            simulate_cross_market_order(&inquiry, &pair, &amm, &set, &Position::default(), &req, 1_000)
                .unwrap();
        assert!(!sim.can_place_order);
        assert_eq!(sim.order_size, u2i(min_order_size(&set, 1_100).unwrap()));
    }

    /// Quotes a post-trade tick short of the target on the first call.
    struct ShortFirst {
        amm_tick: i32,
        calls: std::cell::Cell<u32>,
    }

    impl Inquiry for ShortFirst {
        fn inquire_by_size(&self, _pair: &PairId, _size: I256) -> Result<Quotation, SimError> {
            unreachable!("cross-market only inquires by tick")
        }

        fn inquire_by_tick(&self, _pair: &PairId, tick: i32) -> Result<(I256, Quotation), SimError> {
            let calls = self.calls.get();
            self.calls.set(calls + 1);
            let price = wad_at_tick(self.amm_tick).unwrap();
            let sqrt = sqrt_ratio_at_tick(self.amm_tick).unwrap();
            let post_tick = if calls == 0 { tick - 1 } else { tick };
            let size = w(10);
            Ok((
                size,
                Quotation::new(
                    price,
                    price,
                    sqrt,
                    sqrt_ratio_at_tick(post_tick).unwrap(),
                    post_tick,
                    wmulu(price, size.unsigned_abs()),
                    U256::ZERO,
                ),
            ))
        }
    }

    #[test]
    fn test_retries_once_when_target_not_reached() {
        let amm = amm_at(1_000);
        let set = setting();
        let pair = PairId::perp(Address::ZERO);
        let inquiry = ShortFirst {
            amm_tick: 1_000,
            calls: std::cell::Cell::new(0),
        };
        let req = CrossMarketRequest::new(1_100, Side::Long, w(20), wu(5), 100);
        let sim =
            simulate_cross_market_order(&inquiry, &pair, &amm, &set, &Position::default(), &req, 1_000)
                .unwrap();
        assert_eq!(inquiry.calls.get(), 2);
        assert!(sim.can_place_order);
        assert_eq!(sim.swap_size, w(10));
    }

    #[test]
    fn test_zero_sweep_rests_everything() {
        let amm = amm_at(1_000);
        let set = setting();
        let pair = PairId::perp(Address::ZERO);
        let inquiry = FixedSweep {
            amm_tick: 1_000,
            size: I256::ZERO,
        };
        // Short resting above the AMM tick: full size becomes the order
        let req = CrossMarketRequest::new(1_100, Side::Short, w(10), wu(5), 100);
        let sim =
            simulate_cross_market_order(&inquiry, &pair, &amm, &set, &Position::default(), &req, 1_000)
                .unwrap();
        assert!(sim.can_place_order);
        assert!(sim.trade.is_none());
        assert_eq!(sim.order_size, w(10));
        let order = sim.order.unwrap();
        assert_eq!(order.order.size(), -w(10));
    }
}
