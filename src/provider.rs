//! External-boundary interfaces the simulation core consumes.
//!
//! The core never performs I/O itself: the state provider hands in
//! point-in-time snapshots, the inquiry provider prices hypothetical swaps
//! against the on-chain AMM (an `eth_call` in production, a curve replica in
//! tests), and the vault provider reports the trader's available deposit.
//! Implementations are synchronous; async backends block at their own edge.

use alloy::primitives::{Address, I256, U256};

use crate::{
    error::SimError,
    state::{PairSnapshot, Quotation},
    types::PairId,
};

/// Read-only source of market and account state.
///
/// A single snapshot must be internally consistent: every field read from
/// the same [`PairSnapshot`] reflects the same block.
pub trait StateProvider {
    fn snapshot(&self, pair: &PairId, trader: Address) -> Result<PairSnapshot, SimError>;
}

/// Prices hypothetical swaps against the AMM.
pub trait Inquiry {
    /// Quotation for trading `size` (signed, positive long) at the current
    /// AMM state.
    fn inquire_by_size(&self, pair: &PairId, size: I256) -> Result<Quotation, SimError>;

    /// Signed size that walks the AMM price to `tick`, with the quotation
    /// for executing exactly that size.
    fn inquire_by_tick(&self, pair: &PairId, tick: i32) -> Result<(I256, Quotation), SimError>;
}

/// Off-chain-tracked deposit balances, one per (quote token, trader).
pub trait Vault {
    fn available_balance(&self, quote: Address, trader: Address) -> Result<U256, SimError>;
}
