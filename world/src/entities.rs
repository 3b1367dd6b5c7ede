//! Capability table: one record per entity, each part optional.

use std::time::Duration;

use glam::Vec2;
use scrap_siege_core::{
    AttackProfile, AttackStyle, Capabilities, CellCoord, EntityId, Layers, StructureKind,
    ZoneStats,
};

use crate::{damageable::Vitals, navigation::Mover};

/// Subscriber to an entity's destruction notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Observer {
    /// The grid occupancy registry; releases the cell and unregisters.
    Registry,
    /// An attacker that wants a forced re-seek when the entity goes away.
    Attacker(EntityId),
}

/// Attacker capability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Armament {
    pub(crate) profile: AttackProfile,
    pub(crate) style: AttackStyle,
    pub(crate) detection_range: f32,
    pub(crate) last_attack: Duration,
    pub(crate) target: Option<EntityId>,
    pub(crate) fuse: Option<Duration>,
}

impl Armament {
    pub(crate) fn new(
        profile: AttackProfile,
        style: AttackStyle,
        detection_range: f32,
        now: Duration,
    ) -> Self {
        Self {
            profile,
            style,
            detection_range,
            last_attack: now,
            target: None,
            fuse: None,
        }
    }

    pub(crate) fn cooldown_ready(&self, now: Duration) -> bool {
        self.profile
            .cooldown()
            .map_or(false, |cooldown| now >= self.last_attack + cooldown)
    }
}

/// Grid-bound part of a structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Footprint {
    pub(crate) kind: StructureKind,
    pub(crate) cell: CellCoord,
}

/// Zone capability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ZonePart {
    pub(crate) stats: ZoneStats,
    pub(crate) intensity: f32,
}

#[derive(Clone, Debug)]
pub(crate) struct EntityRecord {
    pub(crate) id: EntityId,
    pub(crate) layer: Layers,
    pub(crate) capabilities: Capabilities,
    pub(crate) position: Vec2,
    pub(crate) radius: f32,
    pub(crate) vitals: Option<Vitals>,
    pub(crate) armament: Option<Armament>,
    pub(crate) mover: Option<Mover>,
    pub(crate) footprint: Option<Footprint>,
    pub(crate) zone: Option<ZonePart>,
    pub(crate) observers: Vec<Observer>,
    pub(crate) scrap_reward: u32,
    pub(crate) death_delay: Duration,
    pub(crate) despawn_in: Option<Duration>,
}

impl EntityRecord {
    pub(crate) fn new(id: EntityId, layer: Layers, position: Vec2, radius: f32) -> Self {
        Self {
            id,
            layer,
            capabilities: Capabilities::empty(),
            position,
            radius: radius.max(0.0),
            vitals: None,
            armament: None,
            mover: None,
            footprint: None,
            zone: None,
            observers: Vec::new(),
            scrap_reward: 0,
            death_delay: Duration::ZERO,
            despawn_in: None,
        }
    }

    pub(crate) fn with_vitals(mut self, max_health: u32) -> Self {
        self.vitals = Some(Vitals::new(max_health));
        self.capabilities.insert(Capabilities::DAMAGEABLE);
        self
    }

    pub(crate) fn with_armament(mut self, armament: Armament) -> Self {
        if armament.style.is_explosive() {
            self.capabilities.insert(Capabilities::EXPLOSIVE);
        }
        self.armament = Some(armament);
        self.capabilities.insert(Capabilities::ATTACKER);
        self
    }

    pub(crate) fn with_mover(mut self, mover: Mover) -> Self {
        self.mover = Some(mover);
        self.capabilities.insert(Capabilities::MOBILE);
        self
    }

    pub(crate) fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = Some(footprint);
        self.capabilities.insert(Capabilities::STRUCTURE);
        self
    }

    pub(crate) fn with_zone(mut self, stats: ZoneStats) -> Self {
        self.zone = Some(ZonePart {
            stats,
            intensity: 1.0,
        });
        self.capabilities.insert(Capabilities::ZONE);
        self
    }

    pub(crate) fn with_death_delay(mut self, delay: Duration) -> Self {
        self.death_delay = delay;
        self
    }

    /// Entities without health count as alive until removed.
    pub(crate) fn is_alive(&self) -> bool {
        self.despawn_in.is_none() && self.vitals.map_or(true, |vitals| vitals.is_alive())
    }

    /// Anchor of an alive damageable entity, used by target lookups.
    pub(crate) fn attackable_anchor(&self) -> Option<Vec2> {
        match self.vitals {
            Some(vitals) if vitals.is_alive() => Some(self.position),
            _ => None,
        }
    }

    pub(crate) fn watch(&mut self, observer: Observer) -> bool {
        if self.observers.contains(&observer) {
            return false;
        }
        self.observers.push(observer);
        true
    }

    pub(crate) fn unwatch(&mut self, attacker: EntityId) {
        self.observers
            .retain(|observer| *observer != Observer::Attacker(attacker));
    }
}

#[cfg(test)]
mod tests {
    use super::{Armament, EntityRecord, Observer};
    use glam::Vec2;
    use scrap_siege_core::{AttackProfile, AttackStyle, Capabilities, EntityId, Layers};
    use std::time::Duration;

    #[test]
    fn builders_declare_capabilities() {
        let record = EntityRecord::new(EntityId::new(1), Layers::HOSTILE, Vec2::ZERO, 0.5)
            .with_vitals(10)
            .with_armament(Armament::new(
                AttackProfile::default(),
                AttackStyle::bomber(),
                5.0,
                Duration::ZERO,
            ));

        assert!(record.capabilities.contains(
            Capabilities::DAMAGEABLE | Capabilities::ATTACKER | Capabilities::EXPLOSIVE
        ));
        assert!(!record.capabilities.contains(Capabilities::MOBILE));
    }

    #[test]
    fn cooldown_starts_at_spawn_time() {
        let armament = Armament::new(
            AttackProfile::new(5, 2.0, 1.0),
            AttackStyle::Melee,
            5.0,
            Duration::from_secs(3),
        );
        assert!(!armament.cooldown_ready(Duration::from_millis(3900)));
        assert!(armament.cooldown_ready(Duration::from_secs(4)));
    }

    #[test]
    fn observers_are_unique() {
        let mut record = EntityRecord::new(EntityId::new(1), Layers::STRUCTURE, Vec2::ZERO, 0.5);
        assert!(record.watch(Observer::Registry));
        assert!(!record.watch(Observer::Registry));
        assert!(record.watch(Observer::Attacker(EntityId::new(4))));

        record.unwatch(EntityId::new(4));
        assert_eq!(record.observers, vec![Observer::Registry]);
    }

    #[test]
    fn records_without_health_are_never_attackable() {
        let record = EntityRecord::new(EntityId::new(2), Layers::ZONE, Vec2::ONE, 3.0);
        assert!(record.is_alive());
        assert!(record.attackable_anchor().is_none());
    }
}
