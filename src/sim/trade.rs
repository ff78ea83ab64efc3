//! Market trade simulation.
//!
//! Mirrors the on-chain trade path against a point-in-time snapshot: the
//! quotation prices the swap, margin/leverage are derived from the equity
//! identity, the fill is merged into the existing position, and the result
//! is checked against the margin requirements. Initial-margin violations on
//! opening trades self-heal by topping up the returned margin; maintenance
//! violations on closing trades are fatal.

use alloy::primitives::{I256, U256};
use serde::Serialize;

use crate::{
    error::SimError,
    math::{
        frac_down, limit_tick, r2w, u2i, wad_at_tick, wdivu, wmul_up, wmulu, wmulu_up,
        sqrt_x96_to_wad,
    },
    state::{Amm, InstrumentSetting, Position, Quotation},
    types::{Status, TradeRequest},
};

/// Withdrawal haircut numerator/denominator: 0.1% shaved off any
/// negative-margin withdrawal so boundary rounding cannot leave the
/// position exactly at the requirement.
const HAIRCUT_NUM: u64 = 999;
const HAIRCUT_DENOM: u64 = 1_000;

/// Preview of a market trade.
#[derive(Clone, Debug, Serialize)]
pub struct TradeSimulation {
    /// Average execution price, WAD.
    pub trade_price: U256,
    /// Quote notional of the fill, WAD.
    pub trade_value: U256,
    /// Advisory notional floor for flat accounts; never enforced here.
    pub min_trade_value: U256,
    /// Quoted fee net of the stability portion, WAD.
    pub trading_fee: U256,
    /// Fee quoted above the base trading+protocol portion, capped at the
    /// stability ratio applied to the entry notional, WAD.
    pub stability_fee: U256,
    /// Margin to post (negative: withdrawal), after clamping and self-heal.
    pub margin: I256,
    /// Effective leverage of the resulting position, zero when flat.
    pub leverage: U256,
    /// Signed relative fair-price move caused by the trade, WAD.
    pub price_impact: I256,
    /// Simulated resulting position.
    pub position: Position,
    /// Pnl realized by closing against the existing position.
    pub realized: I256,
    /// Mutually closed size, zero when the trade only adds exposure.
    pub closed_size: I256,
    /// Worst acceptable execution tick under the slippage tolerance.
    pub limit_tick: i32,
    /// Set when the requested margin/leverage was not honored: either a
    /// withdrawal was clamped or margin was injected to restore
    /// initial-margin safety.
    pub exceed_max_leverage: bool,
    /// Margin netted against the available vault balance; filled by the
    /// provider-aware caller, zero from the pure simulation.
    pub deposit: U256,
}

/// Simulates trading `request.base_size` against `quotation`.
///
/// `now` drives the perp funding look-ahead; pass the AMM timestamp to
/// suppress it.
pub fn simulate_trade(
    amm: &Amm,
    setting: &InstrumentSetting,
    position: &Position,
    quotation: &Quotation,
    request: &TradeRequest,
    now: u64,
) -> Result<TradeSimulation, SimError> {
    if amm.status() != Status::Trading {
        return Err(SimError::MarketNotTrading(amm.status()));
    }
    if request.base_size() <= I256::ZERO {
        return Err(SimError::InvalidSize(request.base_size()));
    }
    let sign = request.side().sign()?;
    let base_abs = request.base_size().unsigned_abs();
    let signed_size = sign * request.base_size();
    let mark = quotation.mark_price();

    // Funding look-ahead on a local clone; never observed by other callers
    let amm = amm.with_funding_advanced(mark, now);

    let trade_price = quotation.trade_price(base_abs);
    let limit_tick = limit_tick(trade_price, request.slippage(), request.side())?;
    let limit_price = wad_at_tick(limit_tick)?;
    // Reserve for executing at the worst allowed price instead of mark
    let trade_loss = wmul_up(sign * (u2i(limit_price) - u2i(mark)), u2i(base_abs)).max(I256::ZERO);

    let fee = quotation.fee();
    let base_fee = wmulu_up(
        quotation.entry_notional(),
        r2w(setting.trading_fee_ratio() + setting.protocol_fee_ratio()),
    );
    let stability_cap = wmulu_up(quotation.entry_notional(), r2w(setting.stability_fee_ratio()));
    let stability_fee = fee.saturating_sub(base_fee).min(stability_cap);
    let trading_fee = fee - stability_fee;

    let old_equity = position.tally(&amm, mark).equity;
    let net_size = position.size() + signed_size;

    let mut margin = match (request.margin(), request.leverage()) {
        (Some(margin), _) => margin,
        (None, Some(leverage)) => {
            let new_equity = wdivu(wmulu(mark, net_size.unsigned_abs()), leverage);
            u2i(new_equity) - old_equity + trade_loss + u2i(fee)
        }
        (None, None) => I256::ZERO,
    };

    // Merge the fill; margin is layered on afterwards so withdrawal
    // clamping can see the margin-free equity
    let leg = Position::new(
        signed_size,
        -u2i(fee),
        quotation.entry_notional(),
        amm.social_loss_index_of(signed_size),
        amm.funding_index_of(signed_size),
    );
    let merged = Position::combine(&amm, position, &leg);
    let mut result = merged.position;
    let mut exceed_max_leverage = false;

    if margin < I256::ZERO {
        let tally = result.tally(&amm, mark);
        let requirement = wmulu_up(result.value(mark), setting.imr_wad());
        let cap = (tally.equity - u2i(requirement)).max(I256::ZERO);
        let mut withdraw = -margin;
        if withdraw > cap {
            withdraw = cap;
            exceed_max_leverage = true;
        }
        withdraw = frac_down(
            withdraw,
            u2i(U256::from(HAIRCUT_NUM)),
            u2i(U256::from(HAIRCUT_DENOM)),
        );
        margin = -withdraw;
    }
    result = result.with_balance(result.balance() + margin);

    // A surviving position on the trade side opened or increased exposure;
    // anything else closed or reduced it
    let increased = !result.is_flat() && result.size().is_negative() == signed_size.is_negative();
    let tally = result.tally(&amm, mark);
    if increased {
        let buffered_price = mark.max(limit_price);
        let requirement = wmulu_up(
            wmulu(buffered_price, result.size().unsigned_abs()),
            setting.imr_wad(),
        );
        if tally.equity < u2i(requirement) {
            let top_up = u2i(requirement) - tally.equity;
            tracing::debug!(%top_up, "injecting margin to restore initial-margin safety");
            margin += top_up;
            result = result.with_balance(result.balance() + top_up);
            exceed_max_leverage = true;
        }
    } else {
        let requirement = wmulu_up(result.value(mark), setting.mmr_wad());
        if tally.equity < u2i(requirement) {
            return Err(SimError::InsufficientMargin);
        }
    }

    let pre = u2i(sqrt_x96_to_wad(quotation.sqrt_fair_px96()));
    let post = u2i(sqrt_x96_to_wad(quotation.sqrt_post_fair_px96()));
    let price_impact = crate::math::wdiv(post - pre, pre);

    let leverage = if result.is_flat() {
        // Full close: report the freed balance as a withdrawal
        margin = -result.balance();
        U256::ZERO
    } else {
        let equity = result.tally(&amm, mark).equity;
        wdivu(result.value(mark), equity.unsigned_abs())
    };

    Ok(TradeSimulation {
        trade_price,
        trade_value: quotation.entry_notional(),
        min_trade_value: setting.min_trade_value(),
        trading_fee,
        stability_fee,
        margin,
        leverage,
        price_impact,
        position: result,
        realized: merged.realized,
        closed_size: merged.closed_size,
        limit_tick,
        exceed_max_leverage,
        deposit: U256::ZERO,
    })
}
