//! Market and account state value objects.
//!
//! Everything in this module is a point-in-time snapshot supplied by an
//! external state provider and treated as immutable for the duration of one
//! simulation call. Transitions produce new values; the only snapshot the
//! core ever "advances" is a local clone of the AMM funding indices inside
//! [`Amm::with_funding_advanced`].

mod amm;
mod order;
mod position;
mod quotation;
mod setting;

pub use amm::*;
pub use order::*;
pub use position::*;
pub use quotation::*;
pub use setting::*;

/// Point-in-time bundle a state provider returns for one market and trader.
///
/// All fields come from the same block so a simulation call never observes
/// state that changed mid-call.
#[derive(Clone, Debug)]
pub struct PairSnapshot {
    pub amm: Amm,
    pub setting: InstrumentSetting,
    pub position: Position,
}
