#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Explicitly constructed simulation session for Scrap Siege.
//!
//! A [`Session`] owns the world and every system, and runs the per-step
//! pipeline: tick the world, then let the zone engine, the targeting system
//! and the builder react in that order. Each system sees exactly the events
//! produced since its previous invocation, including those caused by its own
//! commands. Dropping the session tears everything down.

mod config;
mod scenario;

use std::time::Duration;

use log::{debug, info};
use scrap_siege_core::{Command, EntityId, Event, Layers, Vec2};
use scrap_siege_system_builder::{BuildIntent, Builder};
use scrap_siege_system_targeting::Targeting;
use scrap_siege_system_zones::Zones;
use scrap_siege_world::{self as world, query, World};

pub use config::{ArenaConfig, ConfigError, StationSettings, TargetingSettings, ZoneSettings};
pub use scenario::{Placement, Scenario, SpawnOrder};

use scenario::Cue;

/// State of the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The station still stands, or there is none to lose.
    Ongoing,
    /// The station was destroyed; the simulation no longer advances.
    Defeat,
}

/// Totals gathered while a session runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    /// Hostile units spawned.
    pub spawned: u32,
    /// Hostile units that died.
    pub hostiles_killed: u32,
    /// Structures that were built.
    pub structures_built: u32,
    /// Placements the world refused.
    pub placements_rejected: u32,
    /// Structures destroyed or demolished.
    pub structures_lost: u32,
    /// Zones that ran out of lifetime.
    pub zones_expired: u32,
    /// Hits landed by melee attackers and the station battery.
    pub attacks_landed: u32,
    /// Explosions set off by bombers.
    pub explosions: u32,
}

impl Tally {
    fn record(&mut self, event: &Event) {
        match event {
            Event::UnitSpawned { .. } => self.spawned += 1,
            Event::EntityDied { layer, .. } if layer.contains(Layers::HOSTILE) => {
                self.hostiles_killed += 1;
            }
            Event::StructurePlaced { .. } => self.structures_built += 1,
            Event::PlacementRejected { .. } => self.placements_rejected += 1,
            Event::StructureDestroyed { .. } => self.structures_lost += 1,
            Event::ZoneExpired { .. } => self.zones_expired += 1,
            Event::AttackLanded { .. } => self.attacks_landed += 1,
            Event::Exploded { .. } => self.explosions += 1,
            _ => {}
        }
    }
}

/// Result of running a scripted scenario.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    /// Steps actually simulated.
    pub steps: u32,
    /// Simulated time at the end of the run.
    pub elapsed: Duration,
    /// Match state at the end of the run.
    pub outcome: Outcome,
    /// Scrap left in the ledger.
    pub scrap: u32,
    /// Station health at the end, if a station exists.
    pub station_health: Option<u32>,
    /// Hostiles still alive at the end.
    pub hostiles_alive: u32,
    /// Event totals.
    pub tally: Tally,
}

/// Owns the world and the systems and drives them step by step.
#[derive(Debug)]
pub struct Session {
    config: ArenaConfig,
    world: World,
    zones: Zones,
    targeting: Targeting,
    builder: Builder,
    log: Vec<Event>,
    zones_cursor: usize,
    targeting_cursor: usize,
    builder_cursor: usize,
    reported_cursor: usize,
    outcome: Outcome,
    tally: Tally,
}

impl Session {
    /// Builds the arena and its systems from the provided configuration.
    #[must_use]
    pub fn new(config: ArenaConfig) -> Self {
        let world = World::new(config.world_config());
        let zones = Zones::new(config.zones.system_config());
        let targeting = Targeting::new(config.targeting.system_config());
        info!(
            "arena ready: {}x{} grid, {} scrap",
            config.grid.columns, config.grid.rows, config.economy.starting_scrap
        );
        Self {
            config,
            world,
            zones,
            targeting,
            builder: Builder::new(),
            log: Vec::new(),
            zones_cursor: 0,
            targeting_cursor: 0,
            builder_cursor: 0,
            reported_cursor: 0,
            outcome: Outcome::Ongoing,
            tally: Tally::default(),
        }
    }

    /// Configuration the session was built from.
    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Authoritative world, for read-only queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Targeting system, for inspecting attacker state.
    #[must_use]
    pub fn targeting(&self) -> &Targeting {
        &self.targeting
    }

    /// Zone engine, for inspecting occupants.
    #[must_use]
    pub fn zones(&self) -> &Zones {
        &self.zones
    }

    /// Current match state.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Event totals gathered so far.
    #[must_use]
    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Applies an external command immediately; its events reach every system on the next step.
    pub fn submit(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.log);
    }

    /// Queues a build intent for the builder.
    pub fn request_build(&mut self, intent: BuildIntent) {
        self.builder.request(intent);
    }

    /// Spawns a unit of the named archetype and returns the identifier the world assigned.
    pub fn spawn(
        &mut self,
        archetype: &str,
        position: Vec2,
    ) -> Result<Option<EntityId>, ConfigError> {
        let stats = self.config.archetype(archetype)?;
        let start = self.log.len();
        self.submit(Command::SpawnUnit { stats, position });
        Ok(self.log[start..].iter().find_map(|event| match event {
            Event::UnitSpawned { unit, .. } => Some(*unit),
            _ => None,
        }))
    }

    /// Advances the simulation by `dt` and returns every event produced since the previous step.
    ///
    /// After a defeat the world is frozen and the call only drains pending events.
    pub fn step(&mut self, dt: Duration) -> Vec<Event> {
        if self.outcome == Outcome::Ongoing {
            self.submit(Command::Tick { dt });
            self.run_zones();
            self.run_targeting();
            self.run_builder();
        }

        let produced = self.log[self.reported_cursor..].to_vec();
        self.reported_cursor = self.log.len();
        for event in &produced {
            self.tally.record(event);
            if let Event::StationDestroyed { station } = event {
                if self.outcome == Outcome::Ongoing {
                    info!(
                        "station {} fell at {:?}",
                        station.get(),
                        query::clock(&self.world)
                    );
                    self.outcome = Outcome::Defeat;
                }
            }
        }
        self.compact();
        produced
    }

    fn unseen(&self, cursor: usize) -> Vec<Event> {
        self.log[cursor..].to_vec()
    }

    fn apply_all(&mut self, commands: Vec<Command>) {
        for command in commands {
            self.submit(command);
        }
    }

    fn run_zones(&mut self) {
        let events = self.unseen(self.zones_cursor);
        self.zones_cursor = self.log.len();
        let world = &self.world;
        let zone_view = query::zone_view(world);
        let units = query::unit_view(world);
        let mut commands = Vec::new();
        self.zones.handle(
            &events,
            &zone_view,
            &units,
            |center, radius, layers| query::overlap(world, center, radius, layers),
            &mut commands,
        );
        self.apply_all(commands);
    }

    fn run_targeting(&mut self) {
        let events = self.unseen(self.targeting_cursor);
        self.targeting_cursor = self.log.len();
        let world = &self.world;
        let units = query::unit_view(world);
        let structures = query::structure_view(world);
        let station = query::station(world);
        let mut commands = Vec::new();
        self.targeting.handle(
            &events,
            &units,
            &structures,
            station.as_ref(),
            |position, range| query::nearest_structure(world, position, range),
            |center, radius, layers| query::overlap(world, center, radius, layers),
            &mut commands,
        );
        self.apply_all(commands);
    }

    fn run_builder(&mut self) {
        let events = self.unseen(self.builder_cursor);
        self.builder_cursor = self.log.len();
        let world = &self.world;
        let mut commands = Vec::new();
        self.builder.handle(
            &events,
            |kind, cell| query::placement_preview(world, kind, cell),
            |cell| query::occupant(world, cell),
            &mut commands,
        );
        self.apply_all(commands);
    }

    /// Drops the prefix of the log every consumer has already seen.
    fn compact(&mut self) {
        let seen = self
            .zones_cursor
            .min(self.targeting_cursor)
            .min(self.builder_cursor)
            .min(self.reported_cursor);
        if seen == 0 {
            return;
        }
        let _ = self.log.drain(..seen);
        self.zones_cursor -= seen;
        self.targeting_cursor -= seen;
        self.builder_cursor -= seen;
        self.reported_cursor -= seen;
    }

    /// Runs a scripted scenario to completion or defeat.
    pub fn run(&mut self, scenario: &Scenario) -> Result<Summary, ConfigError> {
        scenario.validate(&self.config)?;
        let dt = scenario.step_duration();
        let timeline = scenario.timeline();
        let mut next_cue = 0;
        let mut steps = 0;

        while steps < scenario.steps && self.outcome == Outcome::Ongoing {
            let now = query::clock(&self.world);
            while let Some((due, cue)) = timeline.get(next_cue) {
                if *due > now {
                    break;
                }
                match cue {
                    Cue::Place(placement) => self.request_build(BuildIntent::Place {
                        kind: placement.kind,
                        cell: placement.cell(),
                    }),
                    Cue::Spawn(order) => {
                        for index in 0..order.count {
                            let position = order.position + order.spacing * index as f32;
                            let _ = self.spawn(&order.archetype, position)?;
                        }
                    }
                }
                next_cue += 1;
            }

            let _ = self.step(dt);
            steps += 1;
        }

        debug!("scenario finished after {steps} steps");
        Ok(self.summary(steps))
    }

    fn summary(&self, steps: u32) -> Summary {
        let hostiles_alive = query::unit_view(&self.world)
            .iter()
            .filter(|unit| unit.health.is_alive())
            .count();
        Summary {
            steps,
            elapsed: query::clock(&self.world),
            outcome: self.outcome,
            scrap: query::scrap(&self.world),
            station_health: query::station(&self.world).map(|station| station.health.current()),
            hostiles_alive: u32::try_from(hostiles_alive).unwrap_or(u32::MAX),
            tally: self.tally,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ArenaConfig, Outcome, Session, StationSettings};
    use scrap_siege_core::{Command, Vec2};
    use std::time::Duration;

    #[test]
    fn log_is_compacted_once_every_consumer_caught_up() {
        let mut session = Session::new(ArenaConfig::default());
        for _ in 0..50 {
            let _ = session.step(Duration::from_millis(50));
        }
        assert!(session.log.is_empty());
        assert_eq!(session.zones_cursor, 0);
    }

    #[test]
    fn submitted_events_are_reported_by_the_next_step() {
        let mut session = Session::new(ArenaConfig::default());
        let unit = session
            .spawn("crawler", Vec2::new(0.0, 10.0))
            .expect("crawler")
            .expect("spawned");
        let events = session.step(Duration::from_millis(50));
        assert!(events
            .iter()
            .any(|event| matches!(event, scrap_siege_core::Event::UnitSpawned { unit: id, .. } if *id == unit)));
        assert_eq!(session.tally().spawned, 1);
    }

    #[test]
    fn defeat_freezes_the_world() {
        let mut session = Session::new(ArenaConfig {
            station: StationSettings {
                stats: scrap_siege_core::StationStats {
                    max_health: 5,
                    radius: 1.0,
                    battery: None,
                },
                ..StationSettings::default()
            },
            ..ArenaConfig::default()
        });
        let station = scrap_siege_world::query::station_id(session.world()).expect("station");
        session.submit(Command::ApplyDamage {
            target: station,
            amount: 5,
        });
        let _ = session.step(Duration::from_millis(50));
        assert_eq!(session.outcome(), Outcome::Defeat);

        let clock = scrap_siege_world::query::clock(session.world());
        assert!(session.step(Duration::from_millis(50)).is_empty());
        assert_eq!(scrap_siege_world::query::clock(session.world()), clock);
    }
}
