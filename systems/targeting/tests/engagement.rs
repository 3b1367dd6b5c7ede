use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    mem,
    time::Duration,
};

use scrap_siege_core::{
    AttackProfile, CellCoord, Command, EconomyConfig, EntityId, Event, GridConfig, StationConfig,
    StationStats, StructureKind, UnitStats, Vec2, WorldConfig,
};
use scrap_siege_system_targeting::{Config, Targeting, TargetingState};
use scrap_siege_world::{self as world, query, World};

struct Arena {
    world: World,
    targeting: Targeting,
    pending: Vec<Event>,
    log: Vec<Event>,
}

impl Arena {
    fn new(station: Option<StationConfig>) -> Self {
        let world = World::new(WorldConfig {
            grid: GridConfig {
                columns: 6,
                rows: 6,
                cell_size: 2.0,
                ..GridConfig::default()
            },
            station,
            economy: EconomyConfig {
                starting_scrap: 1_000,
            },
            ..WorldConfig::default()
        });
        Self {
            world,
            targeting: Targeting::new(Config::default()),
            pending: Vec::new(),
            log: Vec::new(),
        }
    }

    fn submit(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.pending);
    }

    fn place(&mut self, kind: StructureKind, cell: CellCoord) -> EntityId {
        self.submit(Command::PlaceStructure { kind, cell });
        self.pending
            .iter()
            .rev()
            .find_map(|event| match event {
                Event::StructurePlaced { structure, .. } => Some(*structure),
                _ => None,
            })
            .expect("structure placed")
    }

    fn spawn(&mut self, stats: UnitStats, position: Vec2) -> EntityId {
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

    fn step(&mut self, millis: u64) {
        self.submit(Command::Tick {
            dt: Duration::from_millis(millis),
        });
        let events = mem::take(&mut self.pending);
        self.log.extend(events.iter().cloned());

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

        for command in commands {
            self.submit(command);
        }
    }

    fn run(&mut self, steps: usize, millis: u64) {
        for _ in 0..steps {
            self.step(millis);
        }
    }
}

fn landed_on(log: &[Event], target: EntityId) -> usize {
    log.iter()
        .filter(|event| matches!(event, Event::AttackLanded { target: hit, .. } if *hit == target))
        .count()
}

#[test]
fn third_party_destruction_forces_retarget_without_stale_attacks() {
    let mut arena = Arena::new(None);
    let near = arena.place(StructureKind::Wall, CellCoord::new(0, 0));
    let far = arena.place(StructureKind::Wall, CellCoord::new(3, 0));
    let unit = arena.spawn(UnitStats::default(), Vec2::new(1.0, 0.0));

    arena.run(10, 100);
    assert_eq!(arena.targeting.target(unit), Some(near));
    assert_eq!(arena.targeting.state(unit), Some(TargetingState::Engaging));
    assert_eq!(landed_on(&arena.log, near), 1);
    assert_eq!(query::watchers(&arena.world, near), vec![unit]);

    arena.submit(Command::ApplyDamage {
        target: near,
        amount: 500,
    });
    let hits_before = landed_on(&arena.log, near);
    arena.step(100);

    assert!(arena.log.contains(&Event::WatchedStructureDestroyed {
        attacker: unit,
        structure: near,
    }));
    assert_eq!(arena.targeting.target(unit), Some(far));
    assert_eq!(
        arena.targeting.state(unit),
        Some(TargetingState::Approaching)
    );

    arena.run(40, 100);
    assert_eq!(landed_on(&arena.log, near), hits_before);
    assert!(landed_on(&arena.log, far) > 0);
}

#[test]
fn stranded_attacker_breaks_its_leash_without_paying_scrap() {
    let mut arena = Arena::new(None);
    let _wall = arena.place(StructureKind::Wall, CellCoord::new(0, 0));
    let scrap = query::scrap(&arena.world);
    let unit = arena.spawn(
        UnitStats {
            speed: 0.0,
            ..UnitStats::default()
        },
        Vec2::new(80.0, 0.0),
    );

    arena.run(30, 100);
    assert!(query::is_alive(&arena.world, unit));

    arena.run(5, 100);
    assert!(!query::is_alive(&arena.world, unit));
    assert_eq!(arena.targeting.state(unit), None);
    assert_eq!(query::scrap(&arena.world), scrap);
}

#[test]
fn station_battery_kills_hostiles_in_range_only() {
    let mut arena = Arena::new(Some(StationConfig {
        position: Vec2::new(0.0, 0.0),
        stats: StationStats {
            max_health: 1_000,
            radius: 1.5,
            battery: Some(AttackProfile::new(20, 10.0, 0.8)),
        },
    }));
    let stationary = UnitStats {
        speed: 0.0,
        ..UnitStats::default()
    };
    let close = arena.spawn(stationary, Vec2::new(5.0, 0.0));
    let distant = arena.spawn(stationary, Vec2::new(0.0, 30.0));
    let scrap = query::scrap(&arena.world);

    arena.run(80, 100);

    assert!(!query::is_alive(&arena.world, close));
    assert_eq!(query::scrap(&arena.world), scrap + 25);
    assert_eq!(
        query::health(&arena.world, distant).map(|health| health.current()),
        Some(100)
    );
    assert_eq!(landed_on(&arena.log, distant), 0);
}

#[test]
fn attacker_without_targets_keeps_seeking() {
    let mut arena = Arena::new(None);
    let unit = arena.spawn(UnitStats::default(), Vec2::new(3.0, 3.0));

    arena.run(20, 100);

    assert_eq!(arena.targeting.state(unit), Some(TargetingState::Seeking));
    assert!(!arena
        .log
        .iter()
        .any(|event| matches!(event, Event::AttackLanded { .. })));
}

#[test]
fn replay_is_deterministic() {
    let first = replay();
    let second = replay();

    assert_eq!(first.len(), second.len(), "replay diverged between runs");
    assert_eq!(fingerprint(&first), fingerprint(&second));
}

fn replay() -> Vec<Event> {
    let mut arena = Arena::new(Some(StationConfig::default()));
    let _ = arena.place(StructureKind::Wall, CellCoord::new(2, 2));
    let _ = arena.place(StructureKind::Wall, CellCoord::new(4, 1));
    for column in 0..3 {
        let _ = arena.spawn(
            UnitStats::default(),
            Vec2::new(column as f32 * 4.0, 12.0),
        );
    }
    arena.run(200, 50);
    arena.log
}

fn fingerprint(events: &[Event]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for event in events {
        format!("{event:?}").hash(&mut hasher);
    }
    hasher.finish()
}
