//! Resting-order simulation: single placement, explicit-ratio batches, and
//! generated batch distributions over a tick range.

use alloy::primitives::{I256, U256};
use itertools::Itertools;
use rand::Rng;
use serde::Serialize;

use crate::{
    error::SimError,
    math::{self, RATIO_BASE, frac_down, mul_div, mul_div_up, u2i, wad_at_tick, wdivu_up, wmulu_up},
    state::{Amm, InstrumentSetting, Order},
    types::{BatchOrderRequest, BatchPlaceRequest, Distribution, PlaceOrderRequest, Status},
};

/// Allowed number of orders in one batch.
pub const MIN_BATCH_ORDERS: usize = 2;
pub const MAX_BATCH_ORDERS: usize = 9;

/// Mark-price drift buffer applied to the IMR floor of an order's margin:
/// an order may rest unfilled while the mark moves, so the floor prices it
/// 0.5% above the current mark.
const BUFFER_RATIO: u32 = RATIO_BASE + 50;

/// Preview of a single resting order.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct OrderSimulation {
    pub order: Order,
    /// Margin locked with the order, WAD.
    pub margin: U256,
    /// Effective leverage at the order's target price.
    pub leverage: U256,
    /// Smallest size a viable order at this tick may have.
    pub min_order_size: U256,
}

impl OrderSimulation {
    /// Zero-filled placeholder for a failed batch entry.
    fn degraded(tick: i32) -> Self {
        Self {
            order: Order::new(tick, I256::ZERO, U256::ZERO),
            margin: U256::ZERO,
            leverage: U256::ZERO,
            min_order_size: U256::ZERO,
        }
    }
}

/// Preview of a batch placement.
#[derive(Clone, Debug, Serialize)]
pub struct BatchPlaceSimulation {
    pub orders: Vec<OrderSimulation>,
    /// Sum of margins across non-degraded entries, WAD.
    pub total_margin: U256,
}

/// Preview of a generated batch, including the chosen allocation.
#[derive(Clone, Debug, Serialize)]
pub struct BatchOrderSimulation {
    pub ticks: Vec<i32>,
    pub ratios: Vec<u32>,
    /// Smallest total base size that keeps every entry at or above its
    /// tick's minimum order size under the chosen ratios.
    pub total_min_size: U256,
    pub batch: BatchPlaceSimulation,
}

/// Smallest order size at `tick` that still meets the instrument's minimum
/// order value.
pub fn min_order_size(setting: &InstrumentSetting, tick: i32) -> Result<U256, SimError> {
    Ok(wdivu_up(setting.min_order_value(), wad_at_tick(tick)?))
}

/// Margin an order of `size_abs` at `target_price` must lock: the
/// leverage-derived amount, floored by IMR applied to the buffered price.
pub fn order_margin(
    setting: &InstrumentSetting,
    mark_price: U256,
    target_price: U256,
    size_abs: U256,
    leverage: U256,
) -> U256 {
    let notional = wmulu_up(target_price, size_abs);
    let margin = wdivu_up(notional, leverage);
    let buffered = mul_div(
        mark_price,
        U256::from(BUFFER_RATIO),
        U256::from(RATIO_BASE),
    )
    .max(target_price);
    let floor = wmulu_up(wmulu_up(buffered, size_abs), setting.imr_wad());
    margin.max(floor).max(setting.min_margin_amount())
}

/// Simulates placing one resting order.
///
/// Long orders must rest strictly below the AMM tick and short orders
/// strictly above it, mirroring the contract precondition.
pub fn simulate_order(
    amm: &Amm,
    setting: &InstrumentSetting,
    request: &PlaceOrderRequest,
) -> Result<OrderSimulation, SimError> {
    if amm.status() != Status::Trading {
        return Err(SimError::MarketNotTrading(amm.status()));
    }
    if request.base_size() <= I256::ZERO {
        return Err(SimError::InvalidSize(request.base_size()));
    }
    let sign = request.side().sign()?;
    math::check_aligned(request.tick(), setting.tick_spacing())?;
    let misplaced = (request.side().is_long() && request.tick() >= amm.tick())
        || (request.side().is_short() && request.tick() <= amm.tick());
    if misplaced {
        return Err(SimError::SideTickMismatch {
            side: request.side(),
            tick: request.tick(),
            amm_tick: amm.tick(),
        });
    }

    let target_price = wad_at_tick(request.tick())?;
    let size_abs = request.base_size().unsigned_abs();
    let margin = order_margin(
        setting,
        amm.fair_price(),
        target_price,
        size_abs,
        request.leverage(),
    );
    let notional = wmulu_up(target_price, size_abs);
    Ok(OrderSimulation {
        order: Order::new(request.tick(), sign * request.base_size(), margin),
        margin,
        leverage: wdivu_up(notional, margin),
        min_order_size: min_order_size(setting, request.tick())?,
    })
}

/// Simulates a batch placement across explicit ticks and ratios.
///
/// Shape violations (count band, duplicate or misaligned ticks, ratios not
/// summing to the base) are fatal; a per-entry simulation failure degrades
/// that entry to zeros and the batch still succeeds.
pub fn simulate_batch_place(
    amm: &Amm,
    setting: &InstrumentSetting,
    request: &BatchPlaceRequest,
) -> Result<BatchPlaceSimulation, SimError> {
    let count = request.ticks().len();
    if !(MIN_BATCH_ORDERS..=MAX_BATCH_ORDERS).contains(&count) {
        return Err(SimError::OrderCount {
            count,
            min: MIN_BATCH_ORDERS,
            max: MAX_BATCH_ORDERS,
        });
    }
    if request.ratios().len() != count {
        return Err(SimError::BatchShape {
            ticks: count,
            ratios: request.ratios().len(),
        });
    }
    if let Some(tick) = request.ticks().iter().duplicates().next() {
        return Err(SimError::DuplicateTick(*tick));
    }
    for tick in request.ticks() {
        math::check_aligned(*tick, setting.tick_spacing())?;
    }
    let sum: u64 = request.ratios().iter().map(|r| *r as u64).sum();
    if sum != RATIO_BASE as u64 {
        return Err(SimError::RatioSum {
            expected: RATIO_BASE,
            got: sum,
        });
    }
    if request.base_size() <= I256::ZERO {
        return Err(SimError::InvalidSize(request.base_size()));
    }

    let mut orders = Vec::with_capacity(count);
    let mut total_margin = U256::ZERO;
    for (tick, ratio) in request.ticks().iter().zip(request.ratios()) {
        let size = frac_down(
            request.base_size(),
            u2i(U256::from(*ratio)),
            u2i(U256::from(RATIO_BASE)),
        );
        let entry = PlaceOrderRequest::new(*tick, request.side(), size, request.leverage());
        match simulate_order(amm, setting, &entry) {
            Ok(sim) => {
                total_margin += sim.margin;
                orders.push(sim);
            }
            Err(err) => {
                tracing::warn!(tick = *tick, %err, "batch entry degraded to an empty order");
                orders.push(OrderSimulation::degraded(*tick));
            }
        }
    }
    Ok(BatchPlaceSimulation {
        orders,
        total_margin,
    })
}

/// Generates `count` evenly spaced aligned ticks over `[lower, upper]` with
/// the requested allocation skew, then delegates to
/// [`simulate_batch_place`].
pub fn simulate_batch_order(
    amm: &Amm,
    setting: &InstrumentSetting,
    request: &BatchOrderRequest,
) -> Result<BatchOrderSimulation, SimError> {
    let count = request.count();
    if !(MIN_BATCH_ORDERS..=MAX_BATCH_ORDERS).contains(&count) {
        return Err(SimError::OrderCount {
            count,
            min: MIN_BATCH_ORDERS,
            max: MAX_BATCH_ORDERS,
        });
    }
    if request.lower_tick() >= request.upper_tick() {
        return Err(SimError::InvalidRange {
            lower: request.lower_tick(),
            upper: request.upper_tick(),
        });
    }
    if request.base_size() <= I256::ZERO {
        return Err(SimError::InvalidSize(request.base_size()));
    }

    let span = (request.upper_tick() - request.lower_tick()) as i64;
    let mut ticks = Vec::with_capacity(count);
    for i in 0..count {
        let offset = span * i as i64 / (count as i64 - 1);
        let tick = request.lower_tick() + offset as i32;
        ticks.push(math::normalize_tick(tick, setting.tick_spacing())?);
    }
    if let Some(tick) = ticks.iter().duplicates().next() {
        // Range too narrow for the requested count at this spacing
        return Err(SimError::DuplicateTick(*tick));
    }

    let mut ratios = match request.distribution() {
        Distribution::Flat => flat_ratios(count),
        Distribution::Upper => skewed_ratios(count, false),
        Distribution::Lower => skewed_ratios(count, true),
        Distribution::Random => random_ratios(count, &mut rand::thread_rng()),
    };

    if request.distribution() == Distribution::Random {
        let base_abs = request.base_size().unsigned_abs();
        let min_sizes = ticks
            .iter()
            .map(|tick| min_order_size(setting, *tick))
            .collect::<Result<Vec<_>, _>>()?;
        let starved = ratios.iter().zip(&min_sizes).any(|(ratio, min)| {
            mul_div(base_abs, U256::from(*ratio), U256::from(RATIO_BASE)) < *min
        });
        let total_min: U256 = min_sizes.iter().copied().sum();
        if starved && total_min <= base_abs {
            tracing::debug!("random allocation starves an entry, falling back to flat");
            ratios = flat_ratios(count);
        }
    }

    let mut total_min_size = U256::ZERO;
    for (tick, ratio) in ticks.iter().zip(&ratios) {
        let min = min_order_size(setting, *tick)?;
        total_min_size = total_min_size.max(mul_div_up(
            min,
            U256::from(RATIO_BASE),
            U256::from(*ratio),
        ));
    }

    let batch = simulate_batch_place(
        amm,
        setting,
        &BatchPlaceRequest::new(
            ticks.clone(),
            ratios.clone(),
            request.side(),
            request.base_size(),
            request.leverage(),
        ),
    )?;
    Ok(BatchOrderSimulation {
        ticks,
        ratios,
        total_min_size,
        batch,
    })
}

/// Equal split of the ratio base, remainder spread over the first entries.
fn flat_ratios(count: usize) -> Vec<u32> {
    let base = RATIO_BASE / count as u32;
    let remainder = RATIO_BASE % count as u32;
    (0..count as u32)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Linear skew over the tick order: weight `i + 1` toward the upper end,
/// reversed for the lower-weighted policy. Remainder goes to the heaviest
/// entry so the sum stays exact.
fn skewed_ratios(count: usize, lower: bool) -> Vec<u32> {
    let total_weight = (count * (count + 1) / 2) as u64;
    let mut ratios: Vec<u32> = (1..=count as u64)
        .map(|w| (RATIO_BASE as u64 * w / total_weight) as u32)
        .collect();
    let sum: u32 = ratios.iter().sum();
    *ratios.last_mut().unwrap() += RATIO_BASE - sum;
    if lower {
        ratios.reverse();
    }
    ratios
}

/// Random positive weights normalized to the ratio base.
fn random_ratios(count: usize, rng: &mut impl Rng) -> Vec<u32> {
    let weights: Vec<u64> = (0..count).map(|_| rng.gen_range(1..=100u64)).collect();
    let total: u64 = weights.iter().sum();
    let mut ratios: Vec<u32> = weights
        .iter()
        .map(|w| (RATIO_BASE as u64 * w / total) as u32)
        .collect();
    let sum: u32 = ratios.iter().sum();
    let heaviest = weights
        .iter()
        .enumerate()
        .max_by_key(|(_, w)| **w)
        .map(|(i, _)| i)
        .unwrap_or(0);
    ratios[heaviest] += RATIO_BASE - sum;
    ratios
}
