//! Straight-line steering stand-in for the navigation collaborator.
//!
//! Units walk directly toward their requested destination. Zones slow units
//! through multipliers keyed by the owning zone, so removing a modifier
//! restores the exact speed the unit had before it was applied.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use scrap_siege_core::EntityId;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Mover {
    base_speed: f32,
    destination: Option<Vec2>,
    halted: bool,
    modifiers: BTreeMap<EntityId, f32>,
}

impl Mover {
    pub(crate) fn new(base_speed: f32) -> Self {
        Self {
            base_speed: base_speed.max(0.0),
            destination: None,
            halted: false,
            modifiers: BTreeMap::new(),
        }
    }

    pub(crate) fn base_speed(&self) -> f32 {
        self.base_speed
    }

    pub(crate) fn effective_speed(&self) -> f32 {
        self.modifiers
            .values()
            .fold(self.base_speed, |speed, multiplier| speed * multiplier)
    }

    pub(crate) fn destination(&self) -> Option<Vec2> {
        self.destination
    }

    pub(crate) fn set_destination(&mut self, destination: Vec2) {
        self.destination = Some(destination);
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.halted
    }

    pub(crate) fn set_halted(&mut self, halted: bool) {
        self.halted = halted;
    }

    /// Installs or replaces the multiplier owned by `zone`. Returns whether speed changed.
    pub(crate) fn set_modifier(&mut self, zone: EntityId, multiplier: f32) -> bool {
        let multiplier = multiplier.max(0.0);
        self.modifiers.insert(zone, multiplier) != Some(multiplier)
    }

    /// Drops the multiplier owned by `zone`. Returns whether one was present.
    pub(crate) fn clear_modifier(&mut self, zone: EntityId) -> bool {
        self.modifiers.remove(&zone).is_some()
    }

    /// Next position after walking toward the destination for `dt`.
    pub(crate) fn advance(&self, position: Vec2, dt: Duration) -> Vec2 {
        if self.halted {
            return position;
        }
        let Some(destination) = self.destination else {
            return position;
        };

        let offset = destination - position;
        let distance = offset.length();
        let travel = self.effective_speed() * dt.as_secs_f32();
        if distance <= travel || distance <= f32::EPSILON {
            destination
        } else {
            position + offset / distance * travel
        }
    }
}
