//! Health bookkeeping shared by every attackable entity.

use scrap_siege_core::Health;

/// Result of a single damage application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DamageOutcome {
    /// Nothing changed: zero amount or the entity was already dead.
    Ignored,
    /// Health dropped but the entity survived.
    Damaged,
    /// Health reached zero on this application.
    Died,
}

/// Damageable capability stored on entity records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Vitals {
    current: u32,
    max: u32,
    dead: bool,
}

impl Vitals {
    pub(crate) fn new(max: u32) -> Self {
        let health = Health::new(max);
        Self {
            current: health.current(),
            max: health.max(),
            dead: false,
        }
    }

    pub(crate) fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if self.dead || amount == 0 {
            return DamageOutcome::Ignored;
        }

        self.current = self.current.saturating_sub(amount);
        if self.current == 0 {
            self.dead = true;
            DamageOutcome::Died
        } else {
            DamageOutcome::Damaged
        }
    }

    /// Restores health up to the maximum. Returns whether health changed.
    pub(crate) fn heal(&mut self, amount: u32) -> bool {
        if self.dead || amount == 0 {
            return false;
        }

        let healed = self.current.saturating_add(amount).min(self.max);
        let changed = healed != self.current;
        self.current = healed;
        changed
    }

    /// Drops health to zero regardless of its value. Returns `false` when already dead.
    pub(crate) fn kill(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.current = 0;
        self.dead = true;
        true
    }

    pub(crate) fn is_alive(&self) -> bool {
        !self.dead
    }

    pub(crate) fn health(&self) -> Health {
        Health::with_current(self.current, self.max)
    }
}
