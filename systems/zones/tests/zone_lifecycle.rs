use std::{mem, time::Duration};

use scrap_siege_core::{
    CellCoord, Command, EconomyConfig, EntityId, Event, GridConfig, StructureCatalog,
    StructureKind, UnitStats, Vec2, WorldConfig, ZoneEffect, ZoneStats,
};
use scrap_siege_system_zones::{Config, Zones};
use scrap_siege_world::{self as world, query, World};

struct Arena {
    world: World,
    zones: Zones,
    pending: Vec<Event>,
    log: Vec<Event>,
}

impl Arena {
    fn new(structures: StructureCatalog) -> Self {
        let world = World::new(WorldConfig {
            grid: GridConfig {
                columns: 6,
                rows: 6,
                cell_size: 2.0,
                ..GridConfig::default()
            },
            economy: EconomyConfig {
                starting_scrap: 1_000,
            },
            structures,
            ..WorldConfig::default()
        });
        Self {
            world,
            zones: Zones::new(Config::default()),
            pending: Vec::new(),
            log: Vec::new(),
        }
    }

    fn submit(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.pending);
    }

    fn place(&mut self, kind: StructureKind) -> EntityId {
        self.submit(Command::PlaceStructure {
            kind,
            cell: CellCoord::new(0, 0),
        });
        self.pending
            .iter()
            .rev()
            .find_map(|event| match event {
                Event::StructurePlaced { structure, .. } => Some(*structure),
                _ => None,
            })
            .expect("zone placed")
    }

    fn spawn(&mut self, position: Vec2) -> EntityId {
        self.spawn_with(UnitStats::default(), position)
    }

    fn spawn_with(&mut self, stats: UnitStats, position: Vec2) -> EntityId {
        self.submit(Command::SpawnUnit { stats, position });
        self.pending
            .iter()
            .rev()
            .find_map(|event| match event {
                Event::UnitSpawned { unit, .. } => Some(*unit),
                _ => None,
            })
            .expect("unit spawned")
    }

    fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.submit(Command::Tick {
                dt: Duration::from_millis(100),
            });
            let events = mem::take(&mut self.pending);
            self.log.extend(events.iter().cloned());

            let world = &self.world;
            let zones = query::zone_view(world);
            let units = query::unit_view(world);
            let mut commands = Vec::new();
            self.zones.handle(
                &events,
                &zones,
                &units,
                |center, radius, layers| query::overlap(world, center, radius, layers),
                &mut commands,
            );
            for command in commands {
                self.submit(command);
            }
        }
    }

    fn speed(&self, unit: EntityId) -> f32 {
        query::speed(&self.world, unit).expect("unit speed")
    }
}

fn catalog_with(effect: ZoneEffect, lifetime_secs: f32) -> StructureCatalog {
    let zone = ZoneStats {
        lifetime_secs,
        ..ZoneStats::with_effect(effect)
    };
    StructureCatalog {
        acid: zone,
        slime: zone,
        spikes: zone,
        ..StructureCatalog::default()
    }
}

#[test]
fn stacking_slime_compounds_to_its_floor() {
    let mut arena = Arena::new(catalog_with(
        ZoneEffect::Slime {
            slow_power: 0.5,
            stacking: true,
            stack_limit: 0.2,
            slow_interval_secs: 1.0,
        },
        30.0,
    ));
    let zone = arena.place(StructureKind::Slime);
    let unit = arena.spawn(Vec2::new(0.5, 0.0));

    arena.run(1);
    assert_eq!(arena.zones.occupants(zone), vec![unit]);
    assert!((arena.speed(unit) - 1.5).abs() < 1e-5);

    arena.run(10);
    assert_eq!(arena.zones.stacks(zone, unit), Some(2));
    assert!((arena.speed(unit) - 0.75).abs() < 1e-5);

    arena.run(10);
    assert!((arena.speed(unit) - 0.6).abs() < 1e-5);
}

#[test]
fn expiry_restores_speed_and_frees_the_cell() {
    let mut arena = Arena::new(catalog_with(ZoneStats::slime().effect, 2.0));
    let zone = arena.place(StructureKind::Slime);
    let unit = arena.spawn(Vec2::new(0.5, 0.0));

    arena.run(1);
    assert!((arena.speed(unit) - 1.5).abs() < 1e-5);

    arena.run(21);
    assert!(arena.log.iter().any(
        |event| matches!(event, Event::ZoneExpired { zone: expired, .. } if *expired == zone)
    ));
    assert!((arena.speed(unit) - 3.0).abs() < 1e-5);
    assert!(query::zone_view(&arena.world).get(zone).is_none());
    assert!(query::is_build_eligible(&arena.world, CellCoord::new(0, 0)));
}

#[test]
fn demolition_reverts_occupants_in_the_same_apply() {
    let mut arena = Arena::new(StructureCatalog::default());
    let zone = arena.place(StructureKind::Slime);
    let unit = arena.spawn(Vec2::new(0.5, 0.0));
    arena.run(1);
    assert!((arena.speed(unit) - 1.5).abs() < 1e-5);

    arena.submit(Command::RemoveStructure { structure: zone });
    assert!((arena.speed(unit) - 3.0).abs() < 1e-5);

    arena.run(3);
    assert!(arena.zones.occupants(zone).is_empty());
    assert!((arena.speed(unit) - 3.0).abs() < 1e-5);
}

#[test]
fn slowed_occupant_recovers_its_speed_when_it_dies() {
    let mut arena = Arena::new(StructureCatalog::default());
    let zone = arena.place(StructureKind::Slime);
    let unit = arena.spawn_with(
        UnitStats {
            death_delay_secs: 1.0,
            ..UnitStats::default()
        },
        Vec2::new(0.5, 0.0),
    );
    arena.run(1);
    assert!((arena.speed(unit) - 1.5).abs() < 1e-5);

    arena.submit(Command::ApplyDamage {
        target: unit,
        amount: 1_000,
    });
    arena.run(2);

    assert!(!query::is_alive(&arena.world, unit));
    assert!((arena.speed(unit) - 3.0).abs() < 1e-5);
    assert!(arena.zones.occupants(zone).is_empty());
    assert!(arena.log.iter().any(|event| matches!(
        event,
        Event::SpeedChanged { unit: slowed, speed } if *slowed == unit && (*speed - 3.0).abs() < 1e-5
    )));
}

#[test]
fn walking_through_spikes_takes_entry_and_periodic_damage() {
    let mut arena = Arena::new(StructureCatalog::default());
    let zone = arena.place(StructureKind::Spikes);
    let unit = arena.spawn(Vec2::new(10.0, 0.0));
    arena.submit(Command::SetDestination {
        unit,
        destination: Vec2::new(-10.0, 0.0),
    });

    arena.run(60);

    assert!(arena.log.contains(&Event::ZoneEntered { zone, unit }));
    assert!(arena.log.contains(&Event::ZoneExited { zone, unit }));
    assert_eq!(
        query::health(&arena.world, unit).map(|health| health.current()),
        Some(50)
    );
    assert!(arena.zones.occupants(zone).is_empty());
}

#[test]
fn acid_keeps_burning_a_stationary_occupant() {
    let mut arena = Arena::new(StructureCatalog::default());
    let _zone = arena.place(StructureKind::Acid);
    let unit = arena.spawn(Vec2::new(1.0, 0.0));

    arena.run(31);

    assert_eq!(
        query::health(&arena.world, unit).map(|health| health.current()),
        Some(80)
    );
}
