use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use scrap_siege_core::{
    AttackProfile, CellCoord, Command, EntityId, Event, PlacementError, StructureKind, UnitStats,
    Vec2, ZoneEffect,
};
use scrap_siege_session::{
    ArenaConfig, Outcome, Scenario, Session, SpawnOrder, StationSettings,
};
use scrap_siege_system_builder::BuildIntent;
use scrap_siege_system_targeting::TargetingState;
use scrap_siege_world::query;

const STEP: Duration = Duration::from_millis(100);

fn without_station() -> ArenaConfig {
    ArenaConfig {
        station: StationSettings {
            enabled: false,
            ..StationSettings::default()
        },
        ..ArenaConfig::default()
    }
}

fn place(session: &mut Session, kind: StructureKind, cell: CellCoord) -> EntityId {
    session.submit(Command::PlaceStructure { kind, cell });
    query::occupant(session.world(), cell).expect("structure placed")
}

fn run(session: &mut Session, steps: usize) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..steps {
        events.extend(session.step(STEP));
    }
    events
}

#[test]
fn single_attack_lands_after_one_and_a_half_cooldowns() {
    let mut config = without_station();
    config.structures.wall.max_health = 20;
    let _ = config.archetypes.insert(
        "striker".to_owned(),
        UnitStats {
            attack: AttackProfile::new(7, 2.0, 1.0),
            ..UnitStats::default()
        },
    );
    let mut session = Session::new(config);
    let wall = place(&mut session, StructureKind::Wall, CellCoord::new(0, 0));
    let unit = session
        .spawn("striker", Vec2::new(1.0, 0.0))
        .expect("archetype")
        .expect("spawned");

    let events = run(&mut session, 15);

    let landed: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::AttackLanded { .. }))
        .collect();
    assert_eq!(
        landed,
        vec![&Event::AttackLanded {
            attacker: unit,
            target: wall,
            damage: 7,
        }]
    );
    assert_eq!(
        query::health(session.world(), wall).map(|health| health.current()),
        Some(13)
    );
    assert_eq!(
        session.targeting().state(unit),
        Some(TargetingState::Engaging)
    );
}

#[test]
fn stacking_slime_slows_toward_its_floor() {
    let mut config = without_station();
    config.structures.slime.effect = ZoneEffect::Slime {
        slow_power: 0.5,
        stacking: true,
        stack_limit: 0.2,
        slow_interval_secs: 1.0,
    };
    let mut session = Session::new(config);
    let zone = place(&mut session, StructureKind::Slime, CellCoord::new(0, 0));
    let unit = session
        .spawn("crawler", Vec2::new(0.5, 0.0))
        .expect("archetype")
        .expect("spawned");
    let speed = |session: &Session| query::speed(session.world(), unit).expect("speed");

    let _ = run(&mut session, 1);
    assert_eq!(session.zones().occupants(zone), vec![unit]);
    assert!((speed(&session) - 1.5).abs() < 1e-5);

    let _ = run(&mut session, 10);
    assert!((speed(&session) - 0.75).abs() < 1e-5);

    let _ = run(&mut session, 10);
    assert!((speed(&session) - 0.6).abs() < 1e-5, "clamped at the floor");
}

#[test]
fn occupied_cell_rejects_a_second_structure() {
    let mut session = Session::new(without_station());
    let cell = CellCoord::new(3, 3);

    session.request_build(BuildIntent::Place {
        kind: StructureKind::Wall,
        cell,
    });
    let _ = run(&mut session, 1);
    assert_eq!(query::occupied_cells(session.world()), 1);
    assert_eq!(query::scrap(session.world()), 100);

    session.request_build(BuildIntent::Place {
        kind: StructureKind::Acid,
        cell,
    });
    let events = run(&mut session, 1);
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, Event::StructurePlaced { .. })),
        "builder should not forward an occupied placement"
    );

    session.submit(Command::PlaceStructure {
        kind: StructureKind::Acid,
        cell,
    });
    let events = run(&mut session, 1);
    assert!(events.contains(&Event::PlacementRejected {
        kind: StructureKind::Acid,
        cell,
        reason: PlacementError::Occupied,
    }));
    assert_eq!(query::occupied_cells(session.world()), 1);
    assert_eq!(query::scrap(session.world()), 100);
    assert_eq!(session.tally().placements_rejected, 1);
}

#[test]
fn attacker_retargets_when_its_wall_is_demolished() {
    let mut config = without_station();
    config.economy.starting_scrap = 1_000;
    let mut session = Session::new(config);
    let near = place(&mut session, StructureKind::Wall, CellCoord::new(0, 0));
    let far = place(&mut session, StructureKind::Wall, CellCoord::new(10, 10));
    let unit = session
        .spawn("crawler", Vec2::new(1.0, 0.0))
        .expect("archetype")
        .expect("spawned");

    let _ = run(&mut session, 11);
    assert_eq!(session.targeting().target(unit), Some(near));
    assert_eq!(
        session.targeting().state(unit),
        Some(TargetingState::Engaging)
    );

    session.request_build(BuildIntent::Demolish {
        cell: CellCoord::new(0, 0),
    });
    let events = run(&mut session, 20);

    assert_eq!(session.targeting().target(unit), Some(far));
    assert!(!events.iter().any(|event| matches!(
        event,
        Event::AttackLanded { target, .. } if *target == near
    )));
    assert_eq!(session.tally().structures_lost, 1);
}

#[test]
fn losing_the_station_ends_the_run() {
    let config = ArenaConfig {
        station: StationSettings {
            stats: scrap_siege_core::StationStats {
                max_health: 15,
                radius: 1.5,
                battery: None,
            },
            ..StationSettings::default()
        },
        ..ArenaConfig::default()
    };
    let station = config.station.position;
    let mut session = Session::new(config);
    let scenario = Scenario {
        steps: 100,
        dt_ms: 100,
        spawns: vec![SpawnOrder {
            archetype: "crawler".to_owned(),
            position: station + Vec2::new(0.0, 3.0),
            at_secs: 0.0,
            count: 1,
            spacing: Vec2::ZERO,
        }],
        ..Scenario::default()
    };

    let summary = session.run(&scenario).expect("scenario runs");

    assert_eq!(summary.outcome, Outcome::Defeat);
    assert!(summary.steps < 30, "ran {} steps", summary.steps);
    assert_eq!(summary.tally.attacks_landed, 2);
    assert_eq!(summary.station_health.unwrap_or(0), 0);
    assert!(session.step(STEP).is_empty());
}

#[test]
fn battery_defends_the_station() {
    let mut session = Session::new(ArenaConfig::default());
    let station = session.config().station.position;
    let scenario = Scenario {
        steps: 600,
        dt_ms: 50,
        spawns: vec![SpawnOrder {
            archetype: "crawler".to_owned(),
            position: station + Vec2::new(-2.0, 8.0),
            at_secs: 0.5,
            count: 3,
            spacing: Vec2::new(2.0, 0.0),
        }],
        ..Scenario::default()
    };

    let summary = session.run(&scenario).expect("scenario runs");

    assert_eq!(summary.outcome, Outcome::Ongoing);
    assert_eq!(summary.tally.spawned, 3);
    assert_eq!(summary.tally.hostiles_killed, 3);
    assert_eq!(summary.hostiles_alive, 0);
    assert_eq!(summary.scrap, 200 + 3 * 25);
}

fn fingerprint() -> u64 {
    let mut session = Session::new(ArenaConfig::default());
    let scenario = Scenario::from_toml_str(
        r#"
        [[placements]]
        kind = "wall"
        column = 5
        row = 2

        [[placements]]
        kind = "acid"
        column = 5
        row = 5
        at_secs = 0.5

        [[spawns]]
        archetype = "crawler"
        position = [3.0, 18.0]
        count = 3
        spacing = [3.0, 0.0]
        at_secs = 1.0

        [[spawns]]
        archetype = "bomber"
        position = [7.5, 18.0]
        at_secs = 2.0
        "#,
    )
    .expect("scenario");

    let summary = session.run(&scenario).expect("scenario runs");
    let mut hasher = DefaultHasher::new();
    format!("{summary:?}").hash(&mut hasher);
    for _ in 0..200 {
        for event in session.step(scenario.step_duration()) {
            format!("{event:?}").hash(&mut hasher);
        }
    }
    hasher.finish()
}

#[test]
fn replays_are_deterministic() {
    assert_eq!(fingerprint(), fingerprint());
}
