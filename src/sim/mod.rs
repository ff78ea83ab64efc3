//! Simulation entry points.
//!
//! The `simulate_*` functions are pure: they consume snapshots and return
//! result objects, never touching the chain. [`Simulator`] composes the
//! external providers and wires snapshots into them for callers that want a
//! one-call preview.

mod cross;
mod liquidity;
mod order;
mod trade;

pub use cross::*;
pub use liquidity::*;
pub use order::*;
pub use trade::*;

use alloy::primitives::{Address, I256, U256};

use crate::{
    Chain,
    error::SimError,
    provider::{Inquiry, StateProvider, Vault},
    state::Range,
    types::{
        AddLiquidityRequest, BatchOrderRequest, BatchPlaceRequest, CrossMarketRequest, PairId,
        PlaceOrderRequest, TradeRequest,
    },
};

/// Required margin netted against an available balance, floored at zero.
pub fn margin_to_deposit(margin: I256, available: U256) -> U256 {
    if margin.is_negative() {
        return U256::ZERO;
    }
    margin.unsigned_abs().saturating_sub(available)
}

/// Provider-backed front end over the pure simulation functions.
///
/// Fetches a point-in-time snapshot per call and delegates; holds no state
/// of its own beyond the provider handles, so it is freely shareable.
pub struct Simulator<S, I, V> {
    chain: Chain,
    state: S,
    inquiry: I,
    vault: V,
}

impl<S: StateProvider, I: Inquiry, V: Vault> Simulator<S, I, V> {
    pub fn new(chain: Chain, state: S, inquiry: I, vault: V) -> Self {
        Self {
            chain,
            state,
            inquiry,
            vault,
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Previews a market trade, with the deposit requirement netted
    /// against the trader's vault balance.
    pub fn trade(
        &self,
        pair: &PairId,
        trader: Address,
        request: &TradeRequest,
        now: u64,
    ) -> Result<TradeSimulation, SimError> {
        let snapshot = self.state.snapshot(pair, trader)?;
        let sign = request.side().sign()?;
        let quotation = self
            .inquiry
            .inquire_by_size(pair, sign * request.base_size())?;
        let mut sim = simulate_trade(
            &snapshot.amm,
            &snapshot.setting,
            &snapshot.position,
            &quotation,
            request,
            now,
        )?;
        let available = self
            .vault
            .available_balance(self.chain.quote_token(), trader)?;
        sim.deposit = margin_to_deposit(sim.margin, available);
        Ok(sim)
    }

    pub fn place_order(
        &self,
        pair: &PairId,
        trader: Address,
        request: &PlaceOrderRequest,
    ) -> Result<OrderSimulation, SimError> {
        let snapshot = self.state.snapshot(pair, trader)?;
        simulate_order(&snapshot.amm, &snapshot.setting, request)
    }

    pub fn batch_place(
        &self,
        pair: &PairId,
        trader: Address,
        request: &BatchPlaceRequest,
    ) -> Result<BatchPlaceSimulation, SimError> {
        let snapshot = self.state.snapshot(pair, trader)?;
        simulate_batch_place(&snapshot.amm, &snapshot.setting, request)
    }

    pub fn batch_order(
        &self,
        pair: &PairId,
        trader: Address,
        request: &BatchOrderRequest,
    ) -> Result<BatchOrderSimulation, SimError> {
        let snapshot = self.state.snapshot(pair, trader)?;
        simulate_batch_order(&snapshot.amm, &snapshot.setting, request)
    }

    pub fn cross_market_order(
        &self,
        pair: &PairId,
        trader: Address,
        request: &CrossMarketRequest,
        now: u64,
    ) -> Result<CrossMarketSimulation, SimError> {
        let snapshot = self.state.snapshot(pair, trader)?;
        simulate_cross_market_order(
            &self.inquiry,
            pair,
            &snapshot.amm,
            &snapshot.setting,
            &snapshot.position,
            request,
            now,
        )
    }

    pub fn add_liquidity(
        &self,
        pair: &PairId,
        trader: Address,
        request: &AddLiquidityRequest,
    ) -> Result<AddLiquiditySimulation, SimError> {
        let snapshot = self.state.snapshot(pair, trader)?;
        simulate_add_liquidity(&snapshot.amm, &snapshot.setting, request)
    }

    pub fn remove_liquidity(
        &self,
        pair: &PairId,
        trader: Address,
        range: &Range,
        slippage: u32,
    ) -> Result<RemoveLiquiditySimulation, SimError> {
        let snapshot = self.state.snapshot(pair, trader)?;
        simulate_remove_liquidity(
            &snapshot.amm,
            &snapshot.setting,
            &snapshot.position,
            range,
            slippage,
        )
    }

    /// Deposit needed to fund `margin`, netted against the trader's vault
    /// balance or an explicit override for chained what-ifs.
    pub fn margin_to_deposit(
        &self,
        trader: Address,
        margin: I256,
        balance_override: Option<U256>,
    ) -> Result<U256, SimError> {
        let available = match balance_override {
            Some(balance) => balance,
            None => self
                .vault
                .available_balance(self.chain.quote_token(), trader)?,
        };
        Ok(margin_to_deposit(margin, available))
    }
}
