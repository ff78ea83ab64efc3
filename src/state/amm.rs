use alloy::primitives::{I256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    math::{frac_down, sqrt_x96_to_wad, u2i},
    types::{PERP_EXPIRY, Status},
};

/// Seconds of elapsed time over which one full unit of premium accrues as
/// funding.
const FUNDING_INTERVAL_SECS: u64 = 86_400;

/// AMM state snapshot for one instrument+expiry market.
///
/// Owned by the external state sync; the simulation core treats it as
/// immutable for the duration of a call. The single exception is the local
/// funding look-ahead of [`Self::with_funding_advanced`], which always
/// operates on a fresh clone and never writes back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Amm {
    expiry: u32,
    timestamp: u64,
    status: Status,
    tick: i32,
    sqrt_px96: U256,
    liquidity: U256,
    total_long: U256,
    total_short: U256,
    fee_index: U256,
    long_social_loss_index: U256,
    short_social_loss_index: U256,
    long_funding_index: I256,
    short_funding_index: I256,
    insurance_fund: U256,
    settlement_price: U256,
}

impl Amm {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        expiry: u32,
        timestamp: u64,
        status: Status,
        tick: i32,
        sqrt_px96: U256,
        liquidity: U256,
        total_long: U256,
        total_short: U256,
        fee_index: U256,
        long_social_loss_index: U256,
        short_social_loss_index: U256,
        long_funding_index: I256,
        short_funding_index: I256,
        insurance_fund: U256,
        settlement_price: U256,
    ) -> Self {
        Self {
            expiry,
            timestamp,
            status,
            tick,
            sqrt_px96,
            liquidity,
            total_long,
            total_short,
            fee_index,
            long_social_loss_index,
            short_social_loss_index,
            long_funding_index,
            short_funding_index,
            insurance_fund,
            settlement_price,
        }
    }

    /// Expiry timestamp, [`PERP_EXPIRY`] for the perpetual market.
    pub fn expiry(&self) -> u32 {
        self.expiry
    }

    pub fn is_perp(&self) -> bool {
        self.expiry == PERP_EXPIRY
    }

    /// Unix timestamp of the last on-chain state update.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Current AMM tick.
    pub fn tick(&self) -> i32 {
        self.tick
    }

    /// Current sqrt price, Q96.
    pub fn sqrt_px96(&self) -> U256 {
        self.sqrt_px96
    }

    /// Current AMM fair price, WAD.
    pub fn fair_price(&self) -> U256 {
        sqrt_x96_to_wad(self.sqrt_px96)
    }

    /// Liquidity active at the current tick.
    pub fn liquidity(&self) -> U256 {
        self.liquidity
    }

    /// Total long open interest, WAD size.
    pub fn total_long(&self) -> U256 {
        self.total_long
    }

    /// Total short open interest, WAD size.
    pub fn total_short(&self) -> U256 {
        self.total_short
    }

    /// Cumulative per-liquidity fee accumulator.
    pub fn fee_index(&self) -> U256 {
        self.fee_index
    }

    pub fn long_social_loss_index(&self) -> U256 {
        self.long_social_loss_index
    }

    pub fn short_social_loss_index(&self) -> U256 {
        self.short_social_loss_index
    }

    pub fn long_funding_index(&self) -> I256 {
        self.long_funding_index
    }

    pub fn short_funding_index(&self) -> I256 {
        self.short_funding_index
    }

    pub fn insurance_fund(&self) -> U256 {
        self.insurance_fund
    }

    /// Settlement price, zero while the market has not settled.
    pub fn settlement_price(&self) -> U256 {
        self.settlement_price
    }

    /// Social-loss index of the side a size of this sign belongs to.
    /// A flat size reads the long side, matching the on-chain convention.
    pub fn social_loss_index_of(&self, size: I256) -> U256 {
        if size.is_negative() {
            self.short_social_loss_index
        } else {
            self.long_social_loss_index
        }
    }

    /// Funding index of the side a size of this sign belongs to.
    pub fn funding_index_of(&self, size: I256) -> I256 {
        if size.is_negative() {
            self.short_funding_index
        } else {
            self.long_funding_index
        }
    }

    /// Returns a clone with the perp funding indices advanced to `now`.
    ///
    /// Accrues `premium × elapsed / 1 day` per unit of size, where premium
    /// is the AMM fair price minus the mark price. The paying side's index
    /// falls by the full per-unit amount; the receiving side's index rises
    /// scaled by the open-interest ratio so aggregate payments balance.
    /// Non-perp markets and non-advancing timestamps return the snapshot
    /// unchanged.
    pub fn with_funding_advanced(&self, mark_price: U256, now: u64) -> Amm {
        let mut amm = self.clone();
        if !self.is_perp() || now <= self.timestamp {
            return amm;
        }
        let elapsed = now - self.timestamp;
        let premium = u2i(self.fair_price()) - u2i(mark_price);
        let delta = frac_down(
            premium,
            u2i(U256::from(elapsed)),
            u2i(U256::from(FUNDING_INTERVAL_SECS)),
        );
        if delta.is_zero() {
            amm.timestamp = now;
            return amm;
        }
        if delta.is_negative() {
            // Shorts pay longs
            amm.short_funding_index += delta;
            if !self.total_long.is_zero() {
                amm.long_funding_index +=
                    frac_down(-delta, u2i(self.total_short), u2i(self.total_long));
            }
        } else {
            // Longs pay shorts
            amm.long_funding_index -= delta;
            if !self.total_short.is_zero() {
                amm.short_funding_index +=
                    frac_down(delta, u2i(self.total_long), u2i(self.total_short));
            }
        }
        amm.timestamp = now;
        tracing::debug!(
            elapsed,
            %delta,
            long_index = %amm.long_funding_index,
            short_index = %amm.short_funding_index,
            "advanced perp funding indices for simulation"
        );
        amm
    }
}
