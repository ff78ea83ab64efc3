use alloy::primitives::{I256, U256};

use super::Side;

/// Parameters of a trade simulation.
///
/// Exactly one of margin/leverage is meaningfully supplied. When neither is
/// given the trade is assumed to be closing or reducing and margin defaults
/// to zero, with leverage back-solved from the resulting position.
#[derive(Clone, Copy, derive_more::Debug)]
pub struct TradeRequest {
    side: Side,
    #[debug("{base_size}")]
    base_size: I256,
    #[debug("{margin:?}")]
    margin: Option<I256>,
    #[debug("{leverage:?}")]
    leverage: Option<U256>,
    slippage: u32,
}

impl TradeRequest {
    /// Trade sized by a target margin amount (WAD).
    pub fn with_margin(side: Side, base_size: I256, margin: I256, slippage: u32) -> Self {
        Self {
            side,
            base_size,
            margin: Some(margin),
            leverage: None,
            slippage,
        }
    }

    /// Trade sized by a target leverage (WAD, e.g. 5e18 for 5x).
    pub fn with_leverage(side: Side, base_size: I256, leverage: U256, slippage: u32) -> Self {
        Self {
            side,
            base_size,
            margin: None,
            leverage: Some(leverage),
            slippage,
        }
    }

    /// Closing/reducing trade: no margin deposited, leverage back-solved.
    pub fn closing(side: Side, base_size: I256, slippage: u32) -> Self {
        Self {
            side,
            base_size,
            margin: None,
            leverage: None,
            slippage,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Unsigned trade size, must be strictly positive.
    pub fn base_size(&self) -> I256 {
        self.base_size
    }

    pub fn margin(&self) -> Option<I256> {
        self.margin
    }

    pub fn leverage(&self) -> Option<U256> {
        self.leverage
    }

    /// Slippage tolerance in basis points of [`crate::math::RATIO_BASE`].
    pub fn slippage(&self) -> u32 {
        self.slippage
    }
}

/// Parameters of a single resting-order simulation.
#[derive(Clone, Copy, derive_more::Debug)]
pub struct PlaceOrderRequest {
    tick: i32,
    side: Side,
    #[debug("{base_size}")]
    base_size: I256,
    #[debug("{leverage}")]
    leverage: U256,
}

impl PlaceOrderRequest {
    pub fn new(tick: i32, side: Side, base_size: I256, leverage: U256) -> Self {
        Self {
            tick,
            side,
            base_size,
            leverage,
        }
    }

    pub fn tick(&self) -> i32 {
        self.tick
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn base_size(&self) -> I256 {
        self.base_size
    }

    pub fn leverage(&self) -> U256 {
        self.leverage
    }
}

/// Batch placement of one total size across explicit ticks and ratios.
///
/// Ratios use base [`crate::math::RATIO_BASE`] and must sum to it exactly;
/// ticks must be distinct and aligned to the instrument's tick spacing.
#[derive(Clone, derive_more::Debug)]
pub struct BatchPlaceRequest {
    ticks: Vec<i32>,
    ratios: Vec<u32>,
    side: Side,
    #[debug("{base_size}")]
    base_size: I256,
    #[debug("{leverage}")]
    leverage: U256,
}

impl BatchPlaceRequest {
    pub fn new(ticks: Vec<i32>, ratios: Vec<u32>, side: Side, base_size: I256, leverage: U256) -> Self {
        Self {
            ticks,
            ratios,
            side,
            base_size,
            leverage,
        }
    }

    pub fn ticks(&self) -> &[i32] {
        &self.ticks
    }

    pub fn ratios(&self) -> &[u32] {
        &self.ratios
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn base_size(&self) -> I256 {
        self.base_size
    }

    pub fn leverage(&self) -> U256 {
        self.leverage
    }
}

/// Allocation skew for generated batch orders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Distribution {
    /// Equal allocation to every tick.
    Flat,
    /// Linearly more weight toward the upper end of the range.
    Upper,
    /// Linearly more weight toward the lower end of the range.
    Lower,
    /// Randomized weights. Falls back to [`Distribution::Flat`] when any
    /// allocation would dip below its tick's minimum order size while a
    /// flat split still fits.
    Random,
}

/// Batch order generation over a tick range.
#[derive(Clone, Copy, derive_more::Debug)]
pub struct BatchOrderRequest {
    lower_tick: i32,
    upper_tick: i32,
    count: usize,
    distribution: Distribution,
    side: Side,
    #[debug("{base_size}")]
    base_size: I256,
    #[debug("{leverage}")]
    leverage: U256,
}

impl BatchOrderRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lower_tick: i32,
        upper_tick: i32,
        count: usize,
        distribution: Distribution,
        side: Side,
        base_size: I256,
        leverage: U256,
    ) -> Self {
        Self {
            lower_tick,
            upper_tick,
            count,
            distribution,
            side,
            base_size,
            leverage,
        }
    }

    pub fn lower_tick(&self) -> i32 {
        self.lower_tick
    }

    pub fn upper_tick(&self) -> i32 {
        self.upper_tick
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn base_size(&self) -> I256 {
        self.base_size
    }

    pub fn leverage(&self) -> U256 {
        self.leverage
    }
}

/// Cross-market order: walk the AMM to `target_tick` with an immediate
/// market trade, then rest the remainder of `base_size` at the target tick.
#[derive(Clone, Copy, derive_more::Debug)]
pub struct CrossMarketRequest {
    target_tick: i32,
    side: Side,
    #[debug("{base_size}")]
    base_size: I256,
    #[debug("{leverage}")]
    leverage: U256,
    slippage: u32,
}

impl CrossMarketRequest {
    pub fn new(target_tick: i32, side: Side, base_size: I256, leverage: U256, slippage: u32) -> Self {
        Self {
            target_tick,
            side,
            base_size,
            leverage,
            slippage,
        }
    }

    pub fn target_tick(&self) -> i32 {
        self.target_tick
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn base_size(&self) -> I256 {
        self.base_size
    }

    pub fn leverage(&self) -> U256 {
        self.leverage
    }

    pub fn slippage(&self) -> u32 {
        self.slippage
    }
}

/// Add-liquidity simulation over an aligned tick range.
#[derive(Clone, Copy, derive_more::Debug)]
pub struct AddLiquidityRequest {
    lower_tick: i32,
    upper_tick: i32,
    #[debug("{margin}")]
    margin: I256,
    slippage: u32,
}

impl AddLiquidityRequest {
    pub fn new(lower_tick: i32, upper_tick: i32, margin: I256, slippage: u32) -> Self {
        Self {
            lower_tick,
            upper_tick,
            margin,
            slippage,
        }
    }

    pub fn lower_tick(&self) -> i32 {
        self.lower_tick
    }

    pub fn upper_tick(&self) -> i32 {
        self.upper_tick
    }

    pub fn margin(&self) -> I256 {
        self.margin
    }

    pub fn slippage(&self) -> u32 {
        self.slippage
    }
}
