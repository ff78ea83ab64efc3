use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::math::wdivu;

/// Priced swap preview returned by the AMM inquiry for a trade size or
/// target tick.
///
/// Produced by the external inquiry provider (an `eth_call` against the
/// on-chain inquiry function, or a local curve replica); the simulation
/// trusts it for notional, fee and post-trade price, and is single-use per
/// simulation call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Quotation {
    benchmark: U256,
    mark_price: U256,
    sqrt_fair_px96: U256,
    sqrt_post_fair_px96: U256,
    post_tick: i32,
    entry_notional: U256,
    fee: U256,
}

impl Quotation {
    pub fn new(
        benchmark: U256,
        mark_price: U256,
        sqrt_fair_px96: U256,
        sqrt_post_fair_px96: U256,
        post_tick: i32,
        entry_notional: U256,
        fee: U256,
    ) -> Self {
        Self {
            benchmark,
            mark_price,
            sqrt_fair_px96,
            sqrt_post_fair_px96,
            post_tick,
            entry_notional,
            fee,
        }
    }

    /// Benchmark price of the underlying, WAD.
    pub fn benchmark(&self) -> U256 {
        self.benchmark
    }

    /// Mark price used for equity and margin valuation, WAD.
    pub fn mark_price(&self) -> U256 {
        self.mark_price
    }

    /// Fair sqrt price before the trade, Q96.
    pub fn sqrt_fair_px96(&self) -> U256 {
        self.sqrt_fair_px96
    }

    /// Fair sqrt price after the trade, Q96.
    pub fn sqrt_post_fair_px96(&self) -> U256 {
        self.sqrt_post_fair_px96
    }

    /// AMM tick after the trade.
    pub fn post_tick(&self) -> i32 {
        self.post_tick
    }

    /// Quote notional the trade executes at, WAD.
    pub fn entry_notional(&self) -> U256 {
        self.entry_notional
    }

    /// Total fee quoted by the AMM, WAD.
    pub fn fee(&self) -> U256 {
        self.fee
    }

    /// Average execution price for `base_size`, WAD.
    pub fn trade_price(&self, base_size: U256) -> U256 {
        wdivu(self.entry_notional, base_size)
    }
}
