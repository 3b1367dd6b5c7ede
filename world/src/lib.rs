#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Scrap Siege.
//!
//! The world owns the capability table, the grid occupancy registry, the
//! economy ledger and the navigation stand-in. All mutation flows through
//! [`apply`]; systems observe the results through the emitted events and the
//! read-only functions in [`query`].

mod damageable;
mod detection;
mod economy;
mod entities;
mod grid;
mod navigation;
mod spatial;

use std::{collections::BTreeMap, mem, time::Duration};

use glam::Vec2;
use log::{debug, info, warn};
use scrap_siege_core::{
    seconds, AttackStyle, CellCoord, Command, EntityId, Event, Layers, PlacementError,
    StationConfig, StructureKind, UnitStats, WorldConfig,
};

use damageable::DamageOutcome;
use detection::OverlapTracker;
use economy::ScrapLedger;
use entities::{Armament, EntityRecord, Footprint, Observer};
use grid::BuildGrid;
use navigation::Mover;
use spatial::Body;

/// Represents the authoritative Scrap Siege arena state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    clock: Duration,
    next_entity: u32,
    entities: BTreeMap<EntityId, EntityRecord>,
    grid: BuildGrid,
    ledger: ScrapLedger,
    station: Option<EntityId>,
    tracker: OverlapTracker,
}

impl World {
    /// Creates a new arena from the provided configuration.
    ///
    /// The station, when configured, is spawned immediately and receives the
    /// first identifier.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let grid = BuildGrid::generate(&config.grid);
        let ledger = ScrapLedger::new(config.economy.starting_scrap);
        let mut world = Self {
            config,
            clock: Duration::ZERO,
            next_entity: 0,
            entities: BTreeMap::new(),
            grid,
            ledger,
            station: None,
            tracker: OverlapTracker::new(),
        };

        if let Some(station) = world.config.station {
            world.station = Some(world.spawn_station(station));
        }

        world
    }

    fn allocate(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.saturating_add(1);
        id
    }

    fn insert(&mut self, record: EntityRecord) {
        let _ = self.entities.insert(record.id, record);
    }

    fn spawn_station(&mut self, station: StationConfig) -> EntityId {
        let id = self.allocate();
        let mut record = EntityRecord::new(
            id,
            Layers::STATION,
            station.position,
            station.stats.radius,
        )
        .with_vitals(station.stats.max_health);
        if let Some(battery) = station.stats.battery {
            record = record.with_armament(Armament::new(
                battery,
                AttackStyle::Melee,
                battery.range,
                self.clock,
            ));
        }
        self.insert(record);
        info!("station {} online at {}", id.get(), station.position);
        id
    }

    fn spawn_unit(&mut self, stats: UnitStats, position: Vec2, out_events: &mut Vec<Event>) {
        let id = self.allocate();
        let mut record = EntityRecord::new(id, Layers::HOSTILE, position, stats.radius)
            .with_vitals(stats.max_health)
            .with_mover(Mover::new(stats.speed))
            .with_armament(Armament::new(
                stats.attack,
                stats.style,
                stats.detection_range,
                self.clock,
            ))
            .with_death_delay(stats.death_delay());
        record.scrap_reward = stats.scrap_reward;

        let body = Body::of(&record);
        self.insert(record);
        let zones = spatial::bodies(&self.entities, Layers::ZONE);
        self.tracker.seed(&zones, &[body]);

        debug!("unit {} spawned at {}", id.get(), position);
        out_events.push(Event::UnitSpawned { unit: id, position });
    }

    /// Claims the cell, spends scrap and runs the on-build hook.
    fn try_place(
        &mut self,
        cell: CellCoord,
        kind: StructureKind,
        out_events: &mut Vec<Event>,
    ) -> Result<EntityId, PlacementError> {
        self.grid.check(cell)?;
        let catalog = self.config.structures;
        let cost = catalog.build_cost(kind);
        self.ledger.check(cost)?;

        let id = self.allocate();
        let _ = self.grid.try_place(cell, id)?;
        self.ledger.try_spend(cost)?;
        if cost > 0 {
            out_events.push(Event::ScrapChanged {
                total: self.ledger.balance(),
            });
        }

        let position = self.grid.cell_center(cell);
        let footprint = Footprint { kind, cell };
        let mut record = match catalog.zone(kind) {
            Some(zone) => EntityRecord::new(id, Layers::ZONE, position, zone.radius).with_zone(*zone),
            None => EntityRecord::new(id, Layers::STRUCTURE, position, catalog.wall.radius)
                .with_vitals(catalog.wall.max_health)
                .with_death_delay(seconds(catalog.wall.death_delay_secs)),
        }
        .with_footprint(footprint);
        let _ = record.watch(Observer::Registry);

        let body = Body::of(&record);
        let is_zone = record.zone.is_some();
        self.insert(record);
        self.grid.register_structure(id);
        if is_zone {
            let units = spatial::bodies(&self.entities, Layers::HOSTILE);
            self.tracker.seed(&[body], &units);
        }

        info!(
            "placed {:?} {} on ({}, {})",
            kind,
            id.get(),
            cell.column(),
            cell.row()
        );
        out_events.push(Event::StructurePlaced {
            structure: id,
            kind,
            cell,
        });
        Ok(id)
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        self.advance_despawns(dt, out_events);
        self.advance_fuses(dt, out_events);

        for record in self.entities.values_mut() {
            if !record.is_alive() {
                continue;
            }
            if let Some(mover) = record.mover.as_ref() {
                record.position = mover.advance(record.position, dt);
            }
        }

        let zones = spatial::bodies(&self.entities, Layers::ZONE);
        let units = spatial::bodies(&self.entities, Layers::HOSTILE);
        let solids = spatial::bodies(&self.entities, Layers::STRUCTURE | Layers::STATION);
        self.tracker.update(&zones, &units, &solids, out_events);
    }

    fn advance_despawns(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let expired: Vec<EntityId> = self
            .entities
            .values_mut()
            .filter_map(|record| {
                let remaining = record.despawn_in?.saturating_sub(dt);
                record.despawn_in = Some(remaining);
                remaining.is_zero().then_some(record.id)
            })
            .collect();

        for entity in expired {
            self.despawn(entity, out_events);
        }
    }

    fn advance_fuses(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut detonations = Vec::new();
        for record in self.entities.values_mut() {
            if !record.is_alive() {
                continue;
            }
            let Some(armament) = record.armament.as_mut() else {
                continue;
            };
            let Some(remaining) = armament.fuse else {
                continue;
            };
            let remaining = remaining.saturating_sub(dt);
            if remaining.is_zero() {
                armament.fuse = None;
                detonations.push(record.id);
            } else {
                armament.fuse = Some(remaining);
            }
        }

        for unit in detonations {
            self.explode(unit, out_events);
        }
    }

    fn despawn(&mut self, entity: EntityId, out_events: &mut Vec<Event>) {
        if self.entities.remove(&entity).is_none() {
            return;
        }
        self.grid.unregister_structure(entity);
        self.tracker.forget(entity);
        debug!("entity {} despawned", entity.get());
        out_events.push(Event::EntityDespawned { entity });
    }

    fn damage(&mut self, target: EntityId, amount: u32, out_events: &mut Vec<Event>) {
        let Some(record) = self.entities.get_mut(&target) else {
            return;
        };
        let is_structure = record.footprint.is_some();
        let Some(vitals) = record.vitals.as_mut() else {
            return;
        };

        let outcome = vitals.take_damage(amount);
        if outcome == DamageOutcome::Ignored {
            return;
        }

        out_events.push(Event::HealthChanged {
            entity: target,
            health: vitals.health(),
        });
        if is_structure {
            out_events.push(Event::StructureDamaged { structure: target });
        }
        if outcome == DamageOutcome::Died {
            self.handle_death(target, true, out_events);
        }
    }

    fn heal(&mut self, target: EntityId, amount: u32, out_events: &mut Vec<Event>) {
        let Some(vitals) = self
            .entities
            .get_mut(&target)
            .and_then(|record| record.vitals.as_mut())
        else {
            return;
        };
        if vitals.heal(amount) {
            out_events.push(Event::HealthChanged {
                entity: target,
                health: vitals.health(),
            });
        }
    }

    /// Drops health to zero outside the damage path.
    fn kill(&mut self, entity: EntityId, credit_reward: bool, out_events: &mut Vec<Event>) {
        let Some(vitals) = self
            .entities
            .get_mut(&entity)
            .and_then(|record| record.vitals.as_mut())
        else {
            return;
        };
        if !vitals.kill() {
            return;
        }
        out_events.push(Event::HealthChanged {
            entity,
            health: vitals.health(),
        });
        self.handle_death(entity, credit_reward, out_events);
    }

    /// Runs the one-shot destruction notification for an entity whose health reached zero.
    fn handle_death(&mut self, entity: EntityId, credit_reward: bool, out_events: &mut Vec<Event>) {
        let Some(record) = self.entities.get_mut(&entity) else {
            return;
        };
        record.despawn_in = Some(record.death_delay);
        if let Some(mover) = record.mover.as_mut() {
            mover.set_halted(true);
        }
        if let Some(armament) = record.armament.as_mut() {
            armament.fuse = None;
        }
        let layer = record.layer;
        let reward = record.scrap_reward;
        let observers = mem::take(&mut record.observers);

        debug!("entity {} died", entity.get());
        out_events.push(Event::EntityDied { entity, layer });
        self.tracker.forget(entity);

        if layer.contains(Layers::HOSTILE) {
            for other in self.entities.values_mut() {
                other.unwatch(entity);
            }
            if credit_reward && reward > 0 {
                self.ledger.credit(reward);
                out_events.push(Event::ScrapChanged {
                    total: self.ledger.balance(),
                });
            }
        }

        self.notify_destroyed(entity, observers, false, out_events);

        if self.station == Some(entity) {
            info!("station {} destroyed", entity.get());
            out_events.push(Event::StationDestroyed { station: entity });
        }
    }

    fn notify_destroyed(
        &mut self,
        entity: EntityId,
        observers: Vec<Observer>,
        expired: bool,
        out_events: &mut Vec<Event>,
    ) {
        for observer in observers {
            match observer {
                Observer::Registry => {
                    let released = self.grid.release(entity);
                    self.grid.unregister_structure(entity);
                    if let Some(cell) = released {
                        out_events.push(if expired {
                            Event::ZoneExpired { zone: entity, cell }
                        } else {
                            Event::StructureDestroyed {
                                structure: entity,
                                cell,
                            }
                        });
                    }
                }
                Observer::Attacker(attacker) => {
                    out_events.push(Event::WatchedStructureDestroyed {
                        attacker,
                        structure: entity,
                    });
                }
            }
        }
    }

    fn remove_structure(&mut self, structure: EntityId, out_events: &mut Vec<Event>) {
        let Some(record) = self.entities.get_mut(&structure) else {
            return;
        };
        if record.footprint.is_none() {
            return;
        }
        if record.zone.is_some() {
            self.remove_zone(structure, false, out_events);
            return;
        }

        let observers = mem::take(&mut record.observers);
        self.notify_destroyed(structure, observers, false, out_events);
        self.despawn(structure, out_events);
    }

    /// Purges the zone's speed modifiers, releases its cell and drops the record.
    fn remove_zone(&mut self, zone: EntityId, expired: bool, out_events: &mut Vec<Event>) {
        let Some(record) = self.entities.get_mut(&zone) else {
            return;
        };
        if record.zone.is_none() {
            return;
        }
        let observers = mem::take(&mut record.observers);

        for unit in self.entities.values_mut() {
            let Some(mover) = unit.mover.as_mut() else {
                continue;
            };
            if mover.clear_modifier(zone) {
                out_events.push(Event::SpeedChanged {
                    unit: unit.id,
                    speed: mover.effective_speed(),
                });
            }
        }

        if expired {
            info!("zone {} expired", zone.get());
        }
        self.notify_destroyed(zone, observers, expired, out_events);
        self.despawn(zone, out_events);
    }

    fn attack(&mut self, attacker: EntityId, target: EntityId, out_events: &mut Vec<Event>) {
        if attacker == target {
            return;
        }
        let now = self.clock;
        let Some(target_position) = self
            .entities
            .get(&target)
            .and_then(EntityRecord::attackable_anchor)
        else {
            return;
        };
        let Some(record) = self.entities.get_mut(&attacker) else {
            return;
        };
        if !record.is_alive() {
            return;
        }
        let position = record.position;
        let Some(armament) = record.armament.as_mut() else {
            return;
        };
        if armament.fuse.is_some() || !armament.cooldown_ready(now) {
            return;
        }
        if position.distance(target_position) > armament.profile.range {
            return;
        }
        armament.last_attack = now;

        match armament.style {
            AttackStyle::Melee => {
                let damage = armament.profile.damage;
                out_events.push(Event::AttackLanded {
                    attacker,
                    target,
                    damage,
                });
                self.damage(target, damage, out_events);
            }
            AttackStyle::Explosive { warning_secs, .. } => {
                let warning = seconds(warning_secs);
                armament.fuse = Some(warning);
                if let Some(mover) = record.mover.as_mut() {
                    mover.set_halted(true);
                }
                debug!("unit {} armed its fuse", attacker.get());
                out_events.push(Event::FuseArmed { unit: attacker });
                if warning.is_zero() {
                    self.explode(attacker, out_events);
                }
            }
        }
    }

    fn detonate(&mut self, unit: EntityId, out_events: &mut Vec<Event>) {
        let Some(armament) = self
            .entities
            .get_mut(&unit)
            .filter(|record| record.is_alive())
            .and_then(|record| record.armament.as_mut())
        else {
            return;
        };
        if !armament.style.is_explosive() {
            return;
        }
        armament.fuse = None;
        self.explode(unit, out_events);
    }

    /// Damages every structure and the station in the blast, then kills the bomber.
    fn explode(&mut self, unit: EntityId, out_events: &mut Vec<Event>) {
        let Some(record) = self.entities.get(&unit).filter(|record| record.is_alive()) else {
            return;
        };
        let Some(AttackStyle::Explosive { radius, damage, .. }) =
            record.armament.map(|armament| armament.style)
        else {
            return;
        };
        let center = record.position;

        let mut blows = Vec::new();
        for victim in spatial::overlap(
            &self.entities,
            center,
            radius,
            Layers::STRUCTURE | Layers::STATION,
        ) {
            let Some(anchor) = self
                .entities
                .get(&victim)
                .and_then(EntityRecord::attackable_anchor)
            else {
                continue;
            };
            let falloff = if radius > 0.0 {
                1.0 - anchor.distance(center).min(radius) / radius
            } else {
                1.0
            };
            let amount = (damage as f32 * falloff).round() as u32;
            if amount > 0 {
                blows.push((victim, amount));
            }
        }

        info!("unit {} exploded, {} hit", unit.get(), blows.len());
        out_events.push(Event::Exploded {
            unit,
            hits: u32::try_from(blows.len()).unwrap_or(u32::MAX),
        });
        for (victim, amount) in blows {
            self.damage(victim, amount, out_events);
        }
        self.kill(unit, true, out_events);
    }

    fn set_target(
        &mut self,
        attacker: EntityId,
        target: Option<EntityId>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(armament) = self
            .entities
            .get_mut(&attacker)
            .filter(|record| record.is_alive())
            .and_then(|record| record.armament.as_mut())
        else {
            return;
        };
        if armament.target != target {
            armament.target = target;
            debug!(
                "attacker {} now targets {:?}",
                attacker.get(),
                target.map(|id| id.get())
            );
            out_events.push(Event::TargetChanged { attacker, target });
        }
    }

    fn watch_structure(&mut self, attacker: EntityId, structure: EntityId) {
        if !self
            .entities
            .get(&attacker)
            .map_or(false, EntityRecord::is_alive)
        {
            return;
        }
        if let Some(record) = self
            .entities
            .get_mut(&structure)
            .filter(|record| record.footprint.is_some() && record.is_alive())
        {
            let _ = record.watch(Observer::Attacker(attacker));
        }
    }

    fn mover_mut(&mut self, unit: EntityId) -> Option<&mut Mover> {
        self.entities
            .get_mut(&unit)
            .filter(|record| record.is_alive())
            .and_then(|record| record.mover.as_mut())
    }

    fn set_speed_modifier(
        &mut self,
        unit: EntityId,
        zone: EntityId,
        multiplier: f32,
        out_events: &mut Vec<Event>,
    ) {
        let zone_active = self
            .entities
            .get(&zone)
            .map_or(false, |record| record.zone.is_some());
        if !zone_active {
            return;
        }
        if let Some(mover) = self.mover_mut(unit) {
            if mover.set_modifier(zone, multiplier) {
                out_events.push(Event::SpeedChanged {
                    unit,
                    speed: mover.effective_speed(),
                });
            }
        }
    }

    fn clear_speed_modifier(&mut self, unit: EntityId, zone: EntityId, out_events: &mut Vec<Event>) {
        let Some(mover) = self
            .entities
            .get_mut(&unit)
            .and_then(|record| record.mover.as_mut())
        else {
            return;
        };
        if mover.clear_modifier(zone) {
            out_events.push(Event::SpeedChanged {
                unit,
                speed: mover.effective_speed(),
            });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::standard())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnUnit { stats, position } => world.spawn_unit(stats, position, out_events),
        Command::PlaceStructure { kind, cell } => {
            if let Err(reason) = world.try_place(cell, kind, out_events) {
                warn!(
                    "rejected {:?} on ({}, {}): {}",
                    kind,
                    cell.column(),
                    cell.row(),
                    reason
                );
                out_events.push(Event::PlacementRejected { kind, cell, reason });
            }
        }
        Command::RemoveStructure { structure } => world.remove_structure(structure, out_events),
        Command::ApplyDamage { target, amount } => world.damage(target, amount, out_events),
        Command::Heal { target, amount } => world.heal(target, amount, out_events),
        Command::Attack { attacker, target } => world.attack(attacker, target, out_events),
        Command::Detonate { unit } => world.detonate(unit, out_events),
        Command::SelfDestruct { unit } => {
            warn!("unit {} broke its leash", unit.get());
            world.kill(unit, false, out_events);
        }
        Command::SetTarget { attacker, target } => world.set_target(attacker, target, out_events),
        Command::SetDestination { unit, destination } => {
            if let Some(mover) = world.mover_mut(unit) {
                mover.set_destination(destination);
            }
        }
        Command::SetMovementHalted { unit, halted } => {
            if let Some(mover) = world.mover_mut(unit) {
                mover.set_halted(halted);
            }
        }
        Command::WatchStructure {
            attacker,
            structure,
        } => world.watch_structure(attacker, structure),
        Command::SetSpeedModifier {
            unit,
            zone,
            multiplier,
        } => world.set_speed_modifier(unit, zone, multiplier, out_events),
        Command::ClearSpeedModifier { unit, zone } => {
            world.clear_speed_modifier(unit, zone, out_events)
        }
        Command::SetZoneIntensity { zone, intensity } => {
            if let Some(part) = world
                .entities
                .get_mut(&zone)
                .and_then(|record| record.zone.as_mut())
            {
                part.intensity = intensity.clamp(0.0, 1.0);
            }
        }
        Command::ExpireZone { zone } => world.remove_zone(zone, true, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec2;
    use scrap_siege_core::{
        Capabilities, CellCoord, EntityId, Health, Layers, PlacementError, StationSnapshot,
        StructureKind, StructureSnapshot, StructureView, UnitSnapshot, UnitView, WorldConfig,
        ZoneSnapshot, ZoneView,
    };

    use super::{spatial, EntityRecord, Observer, World};

    /// Simulated time elapsed since the world was created.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Configuration the world was built from.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Scrap currently available for construction.
    #[must_use]
    pub fn scrap(world: &World) -> u32 {
        world.ledger.balance()
    }

    /// Identifier of the station, if one was configured. Stays valid after destruction.
    #[must_use]
    pub fn station_id(world: &World) -> Option<EntityId> {
        world.station
    }

    /// Captures the station while its record exists.
    #[must_use]
    pub fn station(world: &World) -> Option<StationSnapshot> {
        let record = world.entities.get(&world.station?)?;
        let health = record.vitals?.health();
        Some(StationSnapshot {
            id: record.id,
            position: record.position,
            health,
            battery: record.armament.map(|armament| armament.profile),
            cooldown_ready: record
                .armament
                .map_or(false, |armament| armament.cooldown_ready(world.clock)),
            target: record.armament.and_then(|armament| armament.target),
        })
    }

    /// Captures a read-only view of every hostile unit, dying ones included.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        let snapshots = world
            .entities
            .values()
            .filter(|record| record.layer.contains(Layers::HOSTILE))
            .filter_map(|record| unit_snapshot(world, record))
            .collect();
        UnitView::from_snapshots(snapshots)
    }

    fn unit_snapshot(world: &World, record: &EntityRecord) -> Option<UnitSnapshot> {
        let vitals = record.vitals?;
        let armament = record.armament?;
        let mover = record.mover.as_ref()?;
        Some(UnitSnapshot {
            id: record.id,
            position: record.position,
            radius: record.radius,
            health: vitals.health(),
            attack: armament.profile,
            style: armament.style,
            detection_range: armament.detection_range,
            cooldown_ready: armament.cooldown_ready(world.clock),
            fuse_armed: armament.fuse.is_some(),
            halted: mover.is_halted(),
            destination: mover.destination(),
            speed: mover.effective_speed(),
            base_speed: mover.base_speed(),
            target: armament.target,
        })
    }

    /// Captures every grid structure plus the station.
    #[must_use]
    pub fn structure_view(world: &World) -> StructureView {
        let snapshots = world
            .entities
            .values()
            .filter(|record| {
                record.footprint.is_some() || Some(record.id) == world.station
            })
            .map(|record| StructureSnapshot {
                id: record.id,
                kind: record.footprint.map(|footprint| footprint.kind),
                cell: record.footprint.map(|footprint| footprint.cell),
                position: record.position,
                radius: record.radius,
                health: record.vitals.map(|vitals| vitals.health()),
            })
            .collect();
        StructureView::from_snapshots(snapshots)
    }

    /// Captures every active zone.
    #[must_use]
    pub fn zone_view(world: &World) -> ZoneView {
        let snapshots = world
            .entities
            .values()
            .filter_map(|record| {
                let zone = record.zone?;
                let footprint = record.footprint?;
                Some(ZoneSnapshot {
                    id: record.id,
                    kind: footprint.kind,
                    cell: footprint.cell,
                    position: record.position,
                    radius: record.radius,
                    lifetime: zone.stats.lifetime(),
                    effect: zone.stats.effect,
                    intensity: zone.intensity,
                })
            })
            .collect();
        ZoneView::from_snapshots(snapshots)
    }

    /// Closest alive damageable registered structure within `max_range`.
    #[must_use]
    pub fn nearest_structure(world: &World, position: Vec2, max_range: f32) -> Option<EntityId> {
        world
            .grid
            .nearest_structure(position, max_range, |structure| {
                world
                    .entities
                    .get(&structure)
                    .and_then(EntityRecord::attackable_anchor)
            })
    }

    /// Live entities on `layers` overlapping the circle, ordered by id.
    #[must_use]
    pub fn overlap(world: &World, center: Vec2, radius: f32, layers: Layers) -> Vec<EntityId> {
        spatial::overlap(&world.entities, center, radius, layers)
    }

    /// Health of a damageable entity.
    #[must_use]
    pub fn health(world: &World, entity: EntityId) -> Option<Health> {
        world.entities.get(&entity)?.vitals.map(|vitals| vitals.health())
    }

    /// Reports whether the entity exists and has not died.
    #[must_use]
    pub fn is_alive(world: &World, entity: EntityId) -> bool {
        world
            .entities
            .get(&entity)
            .map_or(false, EntityRecord::is_alive)
    }

    /// Capabilities declared by the entity.
    #[must_use]
    pub fn capabilities(world: &World, entity: EntityId) -> Option<Capabilities> {
        world.entities.get(&entity).map(|record| record.capabilities)
    }

    /// Layer the entity belongs to.
    #[must_use]
    pub fn layer(world: &World, entity: EntityId) -> Option<Layers> {
        world.entities.get(&entity).map(|record| record.layer)
    }

    /// Current world-space position of the entity.
    #[must_use]
    pub fn position(world: &World, entity: EntityId) -> Option<Vec2> {
        world.entities.get(&entity).map(|record| record.position)
    }

    /// Effective movement speed of a unit.
    #[must_use]
    pub fn speed(world: &World, unit: EntityId) -> Option<f32> {
        world
            .entities
            .get(&unit)?
            .mover
            .as_ref()
            .map(|mover| mover.effective_speed())
    }

    /// Maps a world position onto the build grid.
    #[must_use]
    pub fn cell_at(world: &World, position: Vec2) -> Option<CellCoord> {
        world.grid.cell_at(position)
    }

    /// World-space centre of a grid cell.
    #[must_use]
    pub fn cell_center(world: &World, cell: CellCoord) -> Vec2 {
        world.grid.cell_center(cell)
    }

    /// Dry-run of a placement: the same checks the world runs, without mutation.
    pub fn placement_preview(
        world: &World,
        kind: StructureKind,
        cell: CellCoord,
    ) -> Result<(), PlacementError> {
        world.grid.check(cell)?;
        world
            .ledger
            .check(world.config.structures.build_cost(kind))
    }

    /// Structure occupying the cell, if any.
    #[must_use]
    pub fn occupant(world: &World, cell: CellCoord) -> Option<EntityId> {
        world.grid.occupant(cell)
    }

    /// Reports whether the cell is buildable and unoccupied.
    #[must_use]
    pub fn is_build_eligible(world: &World, cell: CellCoord) -> bool {
        world.grid.check(cell).is_ok()
    }

    /// Number of occupied grid cells.
    #[must_use]
    pub fn occupied_cells(world: &World) -> usize {
        world.grid.occupied_count()
    }

    /// Registered structures in registration order.
    #[must_use]
    pub fn registered_structures(world: &World) -> Vec<EntityId> {
        world.grid.registered().to_vec()
    }

    /// Columns and rows of the build grid.
    #[must_use]
    pub fn grid_dimensions(world: &World) -> (u32, u32) {
        world.grid.dimensions()
    }

    /// Units the boundary detector currently places inside the zone.
    #[must_use]
    pub fn zone_occupants(world: &World, zone: EntityId) -> Vec<EntityId> {
        world.tracker.occupants(zone).collect()
    }

    /// Attackers subscribed to the entity's destruction notification.
    #[must_use]
    pub fn watchers(world: &World, entity: EntityId) -> Vec<EntityId> {
        world
            .entities
            .get(&entity)
            .map(|record| {
                record
                    .observers
                    .iter()
                    .filter_map(|observer| match observer {
                        Observer::Attacker(attacker) => Some(*attacker),
                        Observer::Registry => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
