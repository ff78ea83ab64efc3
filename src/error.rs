use alloy::primitives::I256;

use crate::types;

/// Error returned by the simulation core.
///
/// Only caller contract violations and hard safety failures surface as
/// errors. Conditions a preview consumer is expected to inspect and decide
/// on (leverage clamping, degraded batch entries, unsatisfiable cross-market
/// splits) are reported inside the corresponding result structures instead,
/// so batch-tolerant callers can distinguish "abort" from "this entry
/// degraded".
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Trade/order size must be strictly positive.
    #[error("invalid size: {0}")]
    InvalidSize(I256),

    /// Tick is not a multiple of the instrument's tick spacing.
    #[error("tick {tick} not aligned to spacing {spacing}")]
    MisalignedTick { tick: i32, spacing: i32 },

    /// Tick is outside the representable range.
    /// The on-chain AMM would revert identically, never clamp.
    #[error("tick out of range: {0}")]
    TickOutOfRange(i32),

    /// Price has no corresponding tick within the representable range.
    #[error("price out of tick range: {0}")]
    PriceOutOfRange(alloy::primitives::U256),

    /// The same tick appears more than once in a batch placement.
    #[error("duplicate tick in batch: {0}")]
    DuplicateTick(i32),

    /// Batch ticks and ratios must be supplied pairwise.
    #[error("batch shape mismatch: {ticks} ticks, {ratios} ratios")]
    BatchShape { ticks: usize, ratios: usize },

    /// Batch ratios must sum to exactly the ratio base.
    #[error("ratios must sum to {expected}, got {got}")]
    RatioSum { expected: u32, got: u64 },

    /// Batch order count outside the allowed band.
    #[error("order count {count} outside [{min}, {max}]")]
    OrderCount {
        count: usize,
        min: usize,
        max: usize,
    },

    /// Order side contradicts the tick's relation to the current AMM tick:
    /// long orders rest below it, short orders above.
    #[error("{side:?} order at tick {tick} conflicts with amm tick {amm_tick}")]
    SideTickMismatch {
        side: types::Side,
        tick: i32,
        amm_tick: i32,
    },

    /// A signed direction was required but the side is flat.
    #[error("flat side has no sign")]
    FlatSide,

    /// Liquidity range bounds are inverted or degenerate.
    #[error("invalid liquidity range [{lower}, {upper}]")]
    InvalidRange { lower: i32, upper: i32 },

    /// Resulting position fails maintenance-margin safety on a closing or
    /// decreasing trade. Closes below maintenance margin are impossible,
    /// so there is no auto-correction path for this case.
    #[error("insufficient margin")]
    InsufficientMargin,

    /// The market is not accepting trades.
    #[error("market not trading: {0:?}")]
    MarketNotTrading(types::Status),

    /// Failure reported by an external state/inquiry/vault provider.
    #[error("provider error: {0}")]
    Provider(String),
}
