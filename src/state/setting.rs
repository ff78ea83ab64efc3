use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::math::{r2w, wdivu_up};

/// Static-ish instrument configuration.
///
/// All ratios use base [`crate::math::RATIO_BASE`]. Read-only to the
/// simulation core; governance updates are applied by the external config
/// sync before a snapshot is handed in.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct InstrumentSetting {
    initial_margin_ratio: u32,
    maintenance_margin_ratio: u32,
    trading_fee_ratio: u32,
    protocol_fee_ratio: u32,
    stability_fee_ratio: u32,
    min_margin_amount: U256,
    tick_spacing: i32,
}

impl InstrumentSetting {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        initial_margin_ratio: u32,
        maintenance_margin_ratio: u32,
        trading_fee_ratio: u32,
        protocol_fee_ratio: u32,
        stability_fee_ratio: u32,
        min_margin_amount: U256,
        tick_spacing: i32,
    ) -> Self {
        Self {
            initial_margin_ratio,
            maintenance_margin_ratio,
            trading_fee_ratio,
            protocol_fee_ratio,
            stability_fee_ratio,
            min_margin_amount,
            tick_spacing,
        }
    }

    /// Initial margin ratio: minimal collateralization to open or increase
    /// a position.
    pub fn initial_margin_ratio(&self) -> u32 {
        self.initial_margin_ratio
    }

    /// Maintenance margin ratio: minimal collateralization to avoid
    /// liquidation.
    pub fn maintenance_margin_ratio(&self) -> u32 {
        self.maintenance_margin_ratio
    }

    pub fn trading_fee_ratio(&self) -> u32 {
        self.trading_fee_ratio
    }

    pub fn protocol_fee_ratio(&self) -> u32 {
        self.protocol_fee_ratio
    }

    pub fn stability_fee_ratio(&self) -> u32 {
        self.stability_fee_ratio
    }

    /// Smallest margin a position or order may carry, WAD.
    pub fn min_margin_amount(&self) -> U256 {
        self.min_margin_amount
    }

    /// Valid ticks are multiples of this spacing.
    pub fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    /// Initial margin ratio as WAD.
    pub fn imr_wad(&self) -> U256 {
        r2w(self.initial_margin_ratio)
    }

    /// Maintenance margin ratio as WAD.
    pub fn mmr_wad(&self) -> U256 {
        r2w(self.maintenance_margin_ratio)
    }

    /// Advisory notional floor for trades opening a fresh position:
    /// the smallest notional whose margin at maximal leverage still meets
    /// the minimum margin amount.
    pub fn min_trade_value(&self) -> U256 {
        wdivu_up(self.min_margin_amount, self.imr_wad())
    }

    /// Notional floor for a single resting order, same derivation as
    /// [`Self::min_trade_value`].
    pub fn min_order_value(&self) -> U256 {
        wdivu_up(self.min_margin_amount, self.imr_wad())
    }
}
