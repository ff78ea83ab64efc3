use alloy::primitives::{I256, U256};
use serde::{Deserialize, Serialize};

use super::Amm;
use crate::{
    math::{WAD, frac_down, r2w, u2i, wdivu, wmul, wmulu, wmulu_up},
    types::Side,
};

/// Trader position in one market.
///
/// Positive size is long, negative is short. `balance` is margin plus
/// crystallized fees/pnl. The entry indices record where social loss and
/// funding were last reconciled; the delta to the current AMM indices is
/// what the position still owes or is owed.
///
/// Value semantics: the simulation never mutates a position in place, every
/// transition returns a new value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    size: I256,
    balance: I256,
    entry_notional: U256,
    entry_social_loss_index: U256,
    entry_funding_index: I256,
}

/// Equity breakdown of a position at a mark price.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PositionTally {
    /// `balance + pnl`.
    pub equity: I256,
    /// Unrealized pnl including funding and social loss.
    pub pnl: I256,
    /// Social loss accrued since entry.
    pub social_loss: U256,
}

/// Result of merging two position legs.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Combined {
    pub position: Position,
    /// Magnitude of the mutually closed overlap, zero if signs agree.
    pub closed_size: I256,
    /// Pnl crystallized into the merged balance by the close.
    pub realized: I256,
}

impl Position {
    pub fn new(
        size: I256,
        balance: I256,
        entry_notional: U256,
        entry_social_loss_index: U256,
        entry_funding_index: I256,
    ) -> Self {
        Self {
            size,
            balance,
            entry_notional,
            entry_social_loss_index,
            entry_funding_index,
        }
    }

    /// Flat position carrying only a balance.
    pub fn flat(balance: I256) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Signed size: positive long, negative short.
    pub fn size(&self) -> I256 {
        self.size
    }

    pub fn balance(&self) -> I256 {
        self.balance
    }

    pub fn entry_notional(&self) -> U256 {
        self.entry_notional
    }

    pub fn entry_social_loss_index(&self) -> U256 {
        self.entry_social_loss_index
    }

    pub fn entry_funding_index(&self) -> I256 {
        self.entry_funding_index
    }

    pub fn side(&self) -> Side {
        Side::of_size(self.size)
    }

    pub fn is_flat(&self) -> bool {
        self.size.is_zero()
    }

    pub(crate) fn with_balance(&self, balance: I256) -> Self {
        Self { balance, ..*self }
    }

    /// Notional value at `mark_price`, WAD.
    pub fn value(&self, mark_price: U256) -> U256 {
        wmulu(mark_price, self.size.unsigned_abs())
    }

    /// Social loss accrued since entry, rounded up (it is a cost).
    pub fn social_loss(&self, amm: &Amm) -> U256 {
        let diff = amm
            .social_loss_index_of(self.size)
            .saturating_sub(self.entry_social_loss_index);
        wmulu_up(diff, self.size.unsigned_abs())
    }

    /// Funding accrued since entry, signed. Non-zero only for the
    /// perpetual market; the index is selected by the position sign.
    pub fn funding_fee(&self, amm: &Amm) -> I256 {
        if !amm.is_perp() {
            return I256::ZERO;
        }
        let diff = amm.funding_index_of(self.size) - self.entry_funding_index;
        wmul(diff, u2i(self.size.unsigned_abs()))
    }

    /// Equity, pnl and social loss at `mark_price`.
    pub fn tally(&self, amm: &Amm, mark_price: U256) -> PositionTally {
        let value = u2i(self.value(mark_price));
        let notional = u2i(self.entry_notional);
        let base_pnl = if self.size.is_negative() {
            notional - value
        } else {
            value - notional
        };
        let social_loss = self.social_loss(amm);
        let pnl = base_pnl + self.funding_fee(amm) - u2i(social_loss);
        PositionTally {
            equity: self.balance + pnl,
            pnl,
            social_loss,
        }
    }

    /// Price at which equity meets the maintenance margin requirement.
    /// Returns zero for a flat position or when the position is
    /// liquidatable at any positive price.
    pub fn liquidation_price(&self, amm: &Amm, maintenance_margin_ratio: u32) -> U256 {
        if self.is_flat() {
            return U256::ZERO;
        }
        let abs = self.size.unsigned_abs();
        let social = u2i(self.social_loss(amm));
        let funding = self.funding_fee(amm);
        let notional = u2i(self.entry_notional);
        let mmr = r2w(maintenance_margin_ratio);
        let (numerator, factor) = if self.size.is_negative() {
            (self.balance + notional - social + funding, WAD + mmr)
        } else {
            (notional + social - funding - self.balance, WAD - mmr)
        };
        if numerator <= I256::ZERO {
            return U256::ZERO;
        }
        wdivu(numerator.unsigned_abs(), wmulu(abs, factor))
    }

    /// Advances the entry funding index to the current AMM index,
    /// crystallizing the accrued funding into the balance. Returns the new
    /// position and the realized amount; idempotent at the current index.
    pub fn realize_funding(&self, amm: &Amm) -> (Position, I256) {
        let realized = self.funding_fee(amm);
        let position = Position {
            balance: self.balance + realized,
            entry_funding_index: amm.funding_index_of(self.size),
            ..*self
        };
        (position, realized)
    }

    /// Advances the entry social-loss index, charging the accrued loss to
    /// the balance. Returns the new position and the realized pnl (always
    /// non-positive); idempotent at the current index.
    pub fn realize_social_loss(&self, amm: &Amm) -> (Position, I256) {
        let loss = self.social_loss(amm);
        let position = Position {
            balance: self.balance - u2i(loss),
            entry_social_loss_index: amm.social_loss_index_of(self.size),
            ..*self
        };
        (position, -u2i(loss))
    }

    /// Realizes funding and social loss in one step.
    pub fn realize(&self, amm: &Amm) -> (Position, I256) {
        let (position, funding) = self.realize_funding(amm);
        let (position, loss) = position.realize_social_loss(amm);
        (position, funding + loss)
    }

    /// Merges two position legs into one.
    ///
    /// Both legs are first passed through funding/social-loss realization
    /// so no stale index leaks into the merged result. A flat leg yields
    /// the other leg with balances summed. Same-sign legs sum notionals.
    /// Opposite signs close `min(|a|, |b|)`, realize pnl on the overlap
    /// with proportional notional allocation, and carry forward the
    /// dominant leg's entry data. An exact-opposite merge produces the
    /// fully flat position with zero entry fields.
    pub fn combine(amm: &Amm, a: &Position, b: &Position) -> Combined {
        let (a, _) = a.realize(amm);
        let (b, _) = b.realize(amm);

        if a.size.is_zero() || b.size.is_zero() {
            let (flat, live) = if a.size.is_zero() { (a, b) } else { (b, a) };
            return Combined {
                position: live.with_balance(live.balance + flat.balance),
                closed_size: I256::ZERO,
                realized: I256::ZERO,
            };
        }

        if a.size.is_negative() == b.size.is_negative() {
            // Entry indices of both realized legs are already current
            let position = Position {
                size: a.size + b.size,
                balance: a.balance + b.balance,
                entry_notional: a.entry_notional + b.entry_notional,
                entry_social_loss_index: a.entry_social_loss_index,
                entry_funding_index: a.entry_funding_index,
            };
            return Combined {
                position,
                closed_size: I256::ZERO,
                realized: I256::ZERO,
            };
        }

        let (abs_a, abs_b) = (a.size.unsigned_abs(), b.size.unsigned_abs());
        let closed = u2i(abs_a.min(abs_b));
        let closed_a = frac_down(u2i(a.entry_notional), closed, u2i(abs_a));
        let closed_b = frac_down(u2i(b.entry_notional), closed, u2i(abs_b));
        // Long exits at the counterparty leg's entry, and vice versa
        let realized = if a.size.is_negative() {
            closed_a - closed_b
        } else {
            closed_b - closed_a
        };
        let balance = a.balance + b.balance + realized;

        if abs_a == abs_b {
            return Combined {
                position: Position::flat(balance),
                closed_size: closed,
                realized,
            };
        }

        let (dominant, closed_notional) = if abs_a > abs_b {
            (a, closed_a)
        } else {
            (b, closed_b)
        };
        let position = Position {
            size: a.size + b.size,
            balance,
            entry_notional: dominant.entry_notional - closed_notional.unsigned_abs(),
            entry_social_loss_index: dominant.entry_social_loss_index,
            entry_funding_index: dominant.entry_funding_index,
        };
        Combined {
            position,
            closed_size: closed,
            realized,
        }
    }

    /// Splits off `part_size`, dividing balance and entry notional
    /// proportionally. Used for partial order cancellation and partial
    /// liquidity removal. `part_size` must carry the position's sign and
    /// not exceed it.
    pub fn split(&self, part_size: I256) -> (Position, Position) {
        assert!(
            !self.size.is_zero()
                && part_size.is_negative() == self.size.is_negative()
                && !part_size.is_zero()
                && part_size.unsigned_abs() <= self.size.unsigned_abs(),
            "split: part size incompatible with position"
        );
        let part_balance = frac_down(self.balance, part_size, self.size);
        let part_notional = frac_down(
            u2i(self.entry_notional),
            u2i(part_size.unsigned_abs()),
            u2i(self.size.unsigned_abs()),
        )
        .unsigned_abs();
        let part = Position {
            size: part_size,
            balance: part_balance,
            entry_notional: part_notional,
            ..*self
        };
        let rest = Position {
            size: self.size - part_size,
            balance: self.balance - part_balance,
            entry_notional: self.entry_notional - part_notional,
            ..*self
        };
        (part, rest)
    }
}
