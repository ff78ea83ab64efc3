use alloy::primitives::{I256, U256};
use serde::{Deserialize, Serialize};

use crate::types::Side;

/// Resting limit order at one tick.
///
/// The contract only accepts long orders below the AMM tick and short
/// orders above it; the simulation validates the same precondition before
/// producing a placement preview.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Order {
    tick: i32,
    size: I256,
    balance: U256,
}

impl Order {
    pub fn new(tick: i32, size: I256, balance: U256) -> Self {
        Self {
            tick,
            size,
            balance,
        }
    }

    pub fn tick(&self) -> i32 {
        self.tick
    }

    /// Signed size: positive long, negative short.
    pub fn size(&self) -> I256 {
        self.size
    }

    /// Margin locked with the order, WAD.
    pub fn balance(&self) -> U256 {
        self.balance
    }

    pub fn side(&self) -> Side {
        Side::of_size(self.size)
    }
}

/// Concentrated liquidity position over a tick range.
///
/// Removal sweeps the size/notional accrued between the entry sqrt price
/// and the current one into a [`super::Position`], crediting the fee index
/// delta to the balance.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Range {
    liquidity: U256,
    entry_fee_index: U256,
    balance: U256,
    sqrt_entry_px96: U256,
    lower_tick: i32,
    upper_tick: i32,
}

impl Range {
    pub fn new(
        liquidity: U256,
        entry_fee_index: U256,
        balance: U256,
        sqrt_entry_px96: U256,
        lower_tick: i32,
        upper_tick: i32,
    ) -> Self {
        Self {
            liquidity,
            entry_fee_index,
            balance,
            sqrt_entry_px96,
            lower_tick,
            upper_tick,
        }
    }

    pub fn liquidity(&self) -> U256 {
        self.liquidity
    }

    /// AMM fee index at the time the range was minted.
    pub fn entry_fee_index(&self) -> U256 {
        self.entry_fee_index
    }

    /// Margin backing the range, WAD.
    pub fn balance(&self) -> U256 {
        self.balance
    }

    /// Sqrt price at mint time, Q96.
    pub fn sqrt_entry_px96(&self) -> U256 {
        self.sqrt_entry_px96
    }

    pub fn lower_tick(&self) -> i32 {
        self.lower_tick
    }

    pub fn upper_tick(&self) -> i32 {
        self.upper_tick
    }
}
