//! Scrap ledger backing construction costs and kill rewards.

use scrap_siege_core::PlacementError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ScrapLedger {
    balance: u32,
}

impl ScrapLedger {
    pub(crate) const fn new(starting_scrap: u32) -> Self {
        Self {
            balance: starting_scrap,
        }
    }

    pub(crate) const fn balance(&self) -> u32 {
        self.balance
    }

    pub(crate) fn credit(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Fails without spending anything when the balance cannot cover the cost.
    pub(crate) fn check(&self, cost: u32) -> Result<(), PlacementError> {
        if self.balance >= cost {
            Ok(())
        } else {
            Err(PlacementError::InsufficientScrap {
                required: cost,
                available: self.balance,
            })
        }
    }

    pub(crate) fn try_spend(&mut self, cost: u32) -> Result<(), PlacementError> {
        self.check(cost)?;
        self.balance -= cost;
        Ok(())
    }
}
