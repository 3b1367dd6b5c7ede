#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that drives hostile target selection and the station battery.
//!
//! Every hostile attacker owns a small state machine that seeks the nearest
//! structure, approaches it, halts in range and strikes on cooldown. Targets
//! are weak references re-validated against the latest snapshots on every
//! call, so a structure destroyed by a third party is dropped before it can be
//! attacked again.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use log::debug;
use scrap_siege_core::{
    Command, EntityId, Event, Layers, StationSnapshot, StructureView, UnitSnapshot, UnitView,
    Vec2,
};

/// Tunables shared by every attacker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    leash_distance: f32,
    leash_grace: Duration,
    scan_interval: Duration,
}

impl Config {
    /// Creates a new targeting configuration.
    #[must_use]
    pub const fn new(leash_distance: f32, leash_grace: Duration, scan_interval: Duration) -> Self {
        Self {
            leash_distance,
            leash_grace,
            scan_interval,
        }
    }

    /// Distance beyond which an attacker starts breaking its leash.
    #[must_use]
    pub const fn leash_distance(&self) -> f32 {
        self.leash_distance
    }

    /// How long an attacker may stay beyond the leash before it self-destructs.
    #[must_use]
    pub const fn leash_grace(&self) -> Duration {
        self.leash_grace
    }

    /// Interval between station battery scans.
    #[must_use]
    pub const fn scan_interval(&self) -> Duration {
        self.scan_interval
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(60.0, Duration::from_secs(3), Duration::from_millis(200))
    }
}

/// Phase of an attacker's state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetingState {
    /// No valid target is held.
    Seeking,
    /// Target held but out of attack range; movement active.
    Approaching,
    /// Target in range; movement halted, striking on cooldown.
    Engaging,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Pursuit {
    state: TargetingState,
    target: Option<EntityId>,
    remembered: Option<EntityId>,
    can_switch: bool,
    beyond_leash_for: Duration,
    force_reseek: bool,
}

impl Pursuit {
    fn new() -> Self {
        Self {
            state: TargetingState::Seeking,
            target: None,
            remembered: None,
            can_switch: true,
            beyond_leash_for: Duration::ZERO,
            force_reseek: false,
        }
    }

    fn clear(&mut self) {
        self.state = TargetingState::Seeking;
        self.target = None;
        self.remembered = None;
        self.can_switch = true;
        self.beyond_leash_for = Duration::ZERO;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Battery {
    target: Option<EntityId>,
    scan_in: Duration,
}

/// Movement and attack requests computed for one attacker.
#[derive(Clone, Copy, Debug)]
struct Intent {
    destination: Option<Vec2>,
    halted: bool,
    attack: bool,
}

/// Hostile targeting system.
#[derive(Debug, Default)]
pub struct Targeting {
    config: Config,
    pursuits: BTreeMap<EntityId, Pursuit>,
    battery: Battery,
    contacts: Vec<(EntityId, EntityId)>,
}

impl Targeting {
    /// Creates a new targeting system with the provided tunables.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current phase of the attacker's state machine.
    #[must_use]
    pub fn state(&self, attacker: EntityId) -> Option<TargetingState> {
        self.pursuits.get(&attacker).map(|pursuit| pursuit.state)
    }

    /// Target currently held by the attacker.
    #[must_use]
    pub fn target(&self, attacker: EntityId) -> Option<EntityId> {
        self.pursuits.get(&attacker).and_then(|pursuit| pursuit.target)
    }

    /// Hostile currently engaged by the station battery.
    #[must_use]
    pub fn battery_target(&self) -> Option<EntityId> {
        self.battery.target
    }

    /// Consumes world events and snapshots to emit targeting, movement and attack commands.
    ///
    /// `nearest_structure` should mirror the world's `query::nearest_structure`
    /// and `overlap` the world's `query::overlap`.
    #[allow(clippy::too_many_arguments)]
    pub fn handle<N, O>(
        &mut self,
        events: &[Event],
        units: &UnitView,
        structures: &StructureView,
        station: Option<&StationSnapshot>,
        mut nearest_structure: N,
        mut overlap: O,
        out: &mut Vec<Command>,
    ) where
        N: FnMut(Vec2, f32) -> Option<EntityId>,
        O: FnMut(Vec2, f32, Layers) -> Vec<EntityId>,
    {
        let elapsed = self.absorb(events);

        self.pursuits.retain(|attacker, _| units.is_alive(*attacker));

        for unit in units.iter() {
            if !unit.health.is_alive() {
                continue;
            }
            let mut pursuit = self
                .pursuits
                .get(&unit.id)
                .copied()
                .unwrap_or_else(Pursuit::new);

            if unit.fuse_armed {
                let _ = self.pursuits.insert(unit.id, pursuit);
                continue;
            }

            if let Some(structure) = self.contact_for(unit.id, structures) {
                if unit.style.is_explosive() {
                    debug!("unit {} detonates on contact", unit.id.get());
                    out.push(Command::Detonate { unit: unit.id });
                    let _ = self.pursuits.insert(unit.id, pursuit);
                    continue;
                }
                if pursuit.target != Some(structure) {
                    pursuit.remembered = pursuit.target;
                    pursuit.target = Some(structure);
                    pursuit.state = TargetingState::Approaching;
                    pursuit.can_switch = false;
                    pursuit.beyond_leash_for = Duration::ZERO;
                    watch(unit.id, structure, structures, out);
                }
            }

            let keep = self.advance_pursuit(
                unit,
                &mut pursuit,
                elapsed,
                structures,
                station,
                &mut nearest_structure,
                out,
            );
            if keep {
                let _ = self.pursuits.insert(unit.id, pursuit);
            } else {
                let _ = self.pursuits.remove(&unit.id);
            }
        }

        self.contacts.clear();

        if let Some(station) = station {
            self.drive_battery(station, elapsed, units, &mut overlap, out);
        }
    }

    /// Folds the event stream into pending contacts and forced re-seeks; returns elapsed time.
    fn absorb(&mut self, events: &[Event]) -> Duration {
        let mut elapsed = Duration::ZERO;
        let mut gone = BTreeSet::new();

        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::UnitSpawned { unit, .. } => {
                    let _ = self.pursuits.entry(*unit).or_insert_with(Pursuit::new);
                }
                Event::EntityDied { entity, .. } | Event::EntityDespawned { entity } => {
                    let _ = self.pursuits.remove(entity);
                    let _ = gone.insert(*entity);
                    if self.battery.target == Some(*entity) {
                        self.battery.target = None;
                    }
                }
                Event::StructureDestroyed { structure, .. } => {
                    let _ = gone.insert(*structure);
                }
                Event::ZoneExpired { zone, .. } => {
                    let _ = gone.insert(*zone);
                }
                Event::WatchedStructureDestroyed {
                    attacker,
                    structure,
                } => {
                    if let Some(pursuit) = self.pursuits.get_mut(attacker) {
                        if pursuit.target == Some(*structure)
                            || pursuit.remembered == Some(*structure)
                        {
                            pursuit.force_reseek = true;
                        }
                    }
                }
                Event::UnitContact { unit, structure } => {
                    self.contacts.push((*unit, *structure));
                }
                _ => {}
            }
        }

        if !gone.is_empty() {
            for pursuit in self.pursuits.values_mut() {
                let target_gone = pursuit.target.map_or(false, |target| gone.contains(&target));
                let remembered_gone = pursuit
                    .remembered
                    .map_or(false, |remembered| gone.contains(&remembered));
                if target_gone || remembered_gone {
                    pursuit.force_reseek = true;
                }
            }
            self.contacts
                .retain(|(unit, structure)| !gone.contains(unit) && !gone.contains(structure));
        }

        elapsed
    }

    /// First alive structure the unit touched since the previous call.
    fn contact_for(&self, unit: EntityId, structures: &StructureView) -> Option<EntityId> {
        self.contacts
            .iter()
            .filter(|(toucher, _)| *toucher == unit)
            .map(|(_, structure)| *structure)
            .find(|structure| structures.resolve(*structure).is_some())
    }

    /// Runs one step of the attacker's state machine. Returns `false` once the attacker is gone.
    #[allow(clippy::too_many_arguments)]
    fn advance_pursuit<N>(
        &self,
        unit: &UnitSnapshot,
        pursuit: &mut Pursuit,
        elapsed: Duration,
        structures: &StructureView,
        station: Option<&StationSnapshot>,
        nearest_structure: &mut N,
        out: &mut Vec<Command>,
    ) -> bool
    where
        N: FnMut(Vec2, f32) -> Option<EntityId>,
    {
        if pursuit.force_reseek {
            pursuit.force_reseek = false;
            pursuit.clear();
        }

        if pursuit
            .target
            .and_then(|target| structures.resolve(target))
            .is_none()
        {
            pursuit.clear();
        }

        if pursuit.state == TargetingState::Seeking {
            let fallback = station
                .filter(|station| station.health.is_alive())
                .map(|station| station.id);
            match nearest_structure(unit.position, unit.detection_range).or(fallback) {
                Some(target) => {
                    pursuit.target = Some(target);
                    pursuit.state = TargetingState::Approaching;
                    watch(unit.id, target, structures, out);
                }
                None => {
                    sync_target(unit, None, out);
                    return true;
                }
            }
        }

        let Some(held) = pursuit.target.and_then(|target| structures.resolve(target)) else {
            pursuit.clear();
            sync_target(unit, None, out);
            return true;
        };

        let distance = unit.position.distance(held.anchor);
        if distance > self.config.leash_distance {
            pursuit.beyond_leash_for = pursuit.beyond_leash_for.saturating_add(elapsed);
            if pursuit.beyond_leash_for > self.config.leash_grace {
                debug!("unit {} broke its leash", unit.id.get());
                out.push(Command::SelfDestruct { unit: unit.id });
                return false;
            }
        } else {
            pursuit.beyond_leash_for = Duration::ZERO;
        }

        let mut target = held.entity;
        let intent = if distance > unit.attack.range {
            // A contact preemption holds until its structure goes away.
            pursuit.can_switch = pursuit.remembered.is_none();
            pursuit.state = TargetingState::Approaching;
            if pursuit.can_switch {
                if let Some(candidate) = nearest_structure(unit.position, unit.detection_range) {
                    if candidate != target {
                        target = candidate;
                        pursuit.target = Some(candidate);
                        pursuit.beyond_leash_for = Duration::ZERO;
                        watch(unit.id, candidate, structures, out);
                    }
                }
            }
            let destination = structures
                .resolve(target)
                .map_or(held.anchor, |reference| reference.anchor);
            Intent {
                destination: Some(destination),
                halted: false,
                attack: false,
            }
        } else {
            pursuit.can_switch = false;
            pursuit.state = TargetingState::Engaging;
            Intent {
                destination: None,
                halted: true,
                attack: unit.cooldown_ready,
            }
        };

        sync_target(unit, Some(target), out);
        if let Some(destination) = intent.destination {
            if unit.destination != Some(destination) {
                out.push(Command::SetDestination {
                    unit: unit.id,
                    destination,
                });
            }
        }
        if unit.halted != intent.halted {
            out.push(Command::SetMovementHalted {
                unit: unit.id,
                halted: intent.halted,
            });
        }
        if intent.attack {
            out.push(Command::Attack {
                attacker: unit.id,
                target,
            });
        }
        true
    }

    fn drive_battery<O>(
        &mut self,
        station: &StationSnapshot,
        elapsed: Duration,
        units: &UnitView,
        overlap: &mut O,
        out: &mut Vec<Command>,
    ) where
        O: FnMut(Vec2, f32, Layers) -> Vec<EntityId>,
    {
        let Some(battery) = station.battery else {
            return;
        };
        if !station.health.is_alive() {
            return;
        }

        let in_range = |unit: &UnitSnapshot| {
            unit.health.is_alive() && unit.position.distance(station.position) <= battery.range
        };

        if let Some(held) = self.battery.target {
            if !units.get(held).map_or(false, in_range) {
                self.battery.target = None;
            }
        }

        self.battery.scan_in = self.battery.scan_in.saturating_sub(elapsed);
        if self.battery.target.is_none() && self.battery.scan_in.is_zero() {
            self.battery.scan_in = self.config.scan_interval;
            let mut best: Option<Candidate> = None;
            for id in overlap(station.position, battery.range, Layers::HOSTILE) {
                let Some(unit) = units.get(id).filter(|unit| in_range(unit)) else {
                    continue;
                };
                let current = Candidate {
                    distance_sq: unit.position.distance_squared(station.position),
                    unit: id,
                };
                match &mut best {
                    Some(existing) => {
                        if current.precedes(existing) {
                            *existing = current;
                        }
                    }
                    None => best = Some(current),
                }
            }
            self.battery.target = best.map(|candidate| candidate.unit);
        }

        if station.target != self.battery.target {
            out.push(Command::SetTarget {
                attacker: station.id,
                target: self.battery.target,
            });
        }
        if let Some(target) = self.battery.target {
            if station.cooldown_ready {
                out.push(Command::Attack {
                    attacker: station.id,
                    target,
                });
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    distance_sq: f32,
    unit: EntityId,
}

impl Candidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.distance_sq != other.distance_sq {
            return self.distance_sq < other.distance_sq;
        }
        self.unit < other.unit
    }
}

fn sync_target(unit: &UnitSnapshot, target: Option<EntityId>, out: &mut Vec<Command>) {
    if unit.target != target {
        out.push(Command::SetTarget {
            attacker: unit.id,
            target,
        });
    }
}

/// Subscribes the attacker to grid structures; the station has no notification list.
fn watch(attacker: EntityId, target: EntityId, structures: &StructureView, out: &mut Vec<Command>) {
    if structures
        .get(target)
        .map_or(false, |snapshot| snapshot.kind.is_some())
    {
        out.push(Command::WatchStructure {
            attacker,
            structure: target,
        });
    }
}
