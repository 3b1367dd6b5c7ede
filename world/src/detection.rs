//! Boundary-crossing detector for zone membership and unit contacts.

use std::collections::BTreeSet;

use scrap_siege_core::{EntityId, Event};

use crate::spatial::Body;

/// Remembers which overlaps held after the previous tick.
#[derive(Clone, Debug, Default)]
pub(crate) struct OverlapTracker {
    memberships: BTreeSet<(EntityId, EntityId)>,
    contacts: BTreeSet<(EntityId, EntityId)>,
}

impl OverlapTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records current zone overlaps without reporting them as crossings.
    pub(crate) fn seed(&mut self, zones: &[Body], units: &[Body]) {
        for zone in zones {
            for unit in units {
                if zone.overlaps(unit) {
                    let _ = self.memberships.insert((zone.id, unit.id));
                }
            }
        }
    }

    /// Compares current overlaps against the previous tick, emitting crossings.
    pub(crate) fn update(
        &mut self,
        zones: &[Body],
        units: &[Body],
        solids: &[Body],
        out_events: &mut Vec<Event>,
    ) {
        let mut memberships = BTreeSet::new();
        for zone in zones {
            for unit in units {
                if zone.overlaps(unit) {
                    let _ = memberships.insert((zone.id, unit.id));
                }
            }
        }

        for (zone, unit) in self.memberships.difference(&memberships) {
            out_events.push(Event::ZoneExited {
                zone: *zone,
                unit: *unit,
            });
        }
        for (zone, unit) in memberships.difference(&self.memberships) {
            out_events.push(Event::ZoneEntered {
                zone: *zone,
                unit: *unit,
            });
        }
        self.memberships = memberships;

        let mut contacts = BTreeSet::new();
        for unit in units {
            for solid in solids {
                if unit.overlaps(solid) {
                    let _ = contacts.insert((unit.id, solid.id));
                }
            }
        }
        for (unit, structure) in contacts.difference(&self.contacts) {
            out_events.push(Event::UnitContact {
                unit: *unit,
                structure: *structure,
            });
        }
        self.contacts = contacts;
    }

    /// Drops every pair mentioning the entity without reporting an exit.
    pub(crate) fn forget(&mut self, entity: EntityId) {
        self.memberships
            .retain(|(zone, unit)| *zone != entity && *unit != entity);
        self.contacts
            .retain(|(unit, solid)| *unit != entity && *solid != entity);
    }

    pub(crate) fn occupants(&self, zone: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.memberships
            .iter()
            .filter(move |(owner, _)| *owner == zone)
            .map(|(_, unit)| *unit)
    }
}
