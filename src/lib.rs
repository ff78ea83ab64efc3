//! Client-side simulation core for a tick-AMM perpetual futures protocol.
//!
//! Everything on chain is fixed point: monetary values are WAD (1e18),
//! prices live on a geometric tick grid (`price = 1.0001^tick`) and AMM
//! prices are Q96 sqrt prices. This crate replicates the contract-side
//! accounting bit for bit on `I256`/`U256` so a preview computed here
//! matches what the chain would do with the same inputs.
//!
//! The building blocks are pure: [`state`] holds immutable snapshots,
//! [`sim`] turns a snapshot plus a request into a result object, and the
//! [`provider`] traits describe the external sources of state, swap
//! quotations and vault balances. [`sim::Simulator`] wires the three
//! together for one-call previews.

pub mod error;
pub mod math;
pub mod num;
pub mod provider;
pub mod sim;
pub mod state;
pub mod types;

pub use error::SimError;
pub use sim::Simulator;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Deployment context of one chain: where the protocol lives and which
/// instruments it lists. Constructed explicitly by the embedding
/// application; nothing in this crate is looked up from a global registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chain {
    chain_id: u64,
    quote_token: Address,
    instruments: Vec<Address>,
}

impl Chain {
    pub fn new(chain_id: u64, quote_token: Address, instruments: Vec<Address>) -> Self {
        Self {
            chain_id,
            quote_token,
            instruments,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Quote/collateral token all margins and balances are denominated in.
    pub fn quote_token(&self) -> Address {
        self.quote_token
    }

    pub fn instruments(&self) -> &[Address] {
        &self.instruments
    }
}
