//! Fixed-point arithmetic shared by the simulation core.
//!
//! All monetary amounts, prices and ratios are WAD values (scaled by 1e18)
//! carried in [`alloy::primitives::I256`]/[`alloy::primitives::U256`], and
//! AMM sqrt prices are Q96 values, matching the on-chain representation
//! bit for bit. Intermediate products widen to `U512` so multiply-then-divide
//! never overflows.

pub mod tick;
pub mod wad;

pub use tick::*;
pub use wad::*;
