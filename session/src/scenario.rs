//! Scripted scenarios: timed placements and spawns over a fixed number of steps.

use std::{path::Path, time::Duration};

use scrap_siege_core::{seconds, CellCoord, StructureKind, Vec2};
use serde::{Deserialize, Serialize};

use crate::config::{read, ArenaConfig, ConfigError};

/// Structure built once the clock reaches `at_secs`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Kind of structure to build.
    pub kind: StructureKind,
    /// Grid column.
    pub column: u32,
    /// Grid row.
    pub row: u32,
    /// Simulated second at which the build is requested.
    #[serde(default)]
    pub at_secs: f32,
}

impl Placement {
    /// Cell addressed by the placement.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        CellCoord::new(self.column, self.row)
    }
}

/// Group of hostiles spawned once the clock reaches `at_secs`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnOrder {
    /// Archetype name looked up in the arena configuration.
    pub archetype: String,
    /// Spawn position of the first unit.
    pub position: Vec2,
    /// Simulated second at which the group appears.
    #[serde(default)]
    pub at_secs: f32,
    /// Number of units in the group.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Offset between consecutive units of the group.
    #[serde(default)]
    pub spacing: Vec2,
}

fn default_count() -> u32 {
    1
}

/// Scripted run description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Number of steps to simulate.
    pub steps: u32,
    /// Milliseconds simulated per step.
    pub dt_ms: u64,
    /// Timed structure placements.
    pub placements: Vec<Placement>,
    /// Timed hostile spawns.
    pub spawns: Vec<SpawnOrder>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            steps: 600,
            dt_ms: 50,
            placements: Vec::new(),
            spawns: Vec::new(),
        }
    }
}

impl Scenario {
    /// Parses a scenario document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads and parses the scenario at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read(path.as_ref())?)
    }

    /// Step duration, never shorter than a millisecond.
    #[must_use]
    pub fn step_duration(&self) -> Duration {
        Duration::from_millis(self.dt_ms.max(1))
    }

    /// Fails on the first spawn naming an archetype the arena lacks.
    pub fn validate(&self, config: &ArenaConfig) -> Result<(), ConfigError> {
        for spawn in &self.spawns {
            let _ = config.archetype(&spawn.archetype)?;
        }
        Ok(())
    }

    /// Placements and spawns ordered by due time, stable for equal times.
    pub(crate) fn timeline(&self) -> Vec<(Duration, Cue<'_>)> {
        let mut cues: Vec<(Duration, Cue<'_>)> = self
            .placements
            .iter()
            .map(|placement| (seconds(placement.at_secs), Cue::Place(placement)))
            .chain(
                self.spawns
                    .iter()
                    .map(|spawn| (seconds(spawn.at_secs), Cue::Spawn(spawn))),
            )
            .collect();
        cues.sort_by_key(|(due, _)| *due);
        cues
    }
}

/// Single scripted action.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Cue<'a> {
    Place(&'a Placement),
    Spawn(&'a SpawnOrder),
}

#[cfg(test)]
mod tests {
    use super::{Cue, Scenario};
    use crate::config::{ArenaConfig, ConfigError};
    use scrap_siege_core::{StructureKind, Vec2};
    use std::time::Duration;

    const SCRIPT: &str = r#"
        steps = 100
        dt_ms = 20

        [[placements]]
        kind = "wall"
        column = 2
        row = 3
        at_secs = 1.0

        [[placements]]
        kind = "slime"
        column = 4
        row = 4

        [[spawns]]
        archetype = "crawler"
        position = [0.0, 12.0]
        count = 3
        spacing = [1.0, 0.0]
        at_secs = 0.5
    "#;

    #[test]
    fn parses_placements_and_spawns() {
        let scenario = Scenario::from_toml_str(SCRIPT).expect("scenario");
        assert_eq!(scenario.steps, 100);
        assert_eq!(scenario.step_duration(), Duration::from_millis(20));
        assert_eq!(scenario.placements[0].kind, StructureKind::Wall);
        assert_eq!(scenario.placements[1].at_secs, 0.0);
        assert_eq!(scenario.spawns[0].count, 3);
        assert_eq!(scenario.spawns[0].spacing, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn timeline_orders_cues_by_due_time() {
        let scenario = Scenario::from_toml_str(SCRIPT).expect("scenario");
        let timeline = scenario.timeline();
        let order: Vec<&str> = timeline
            .iter()
            .map(|(_, cue)| match cue {
                Cue::Place(placement) if placement.kind == StructureKind::Slime => "slime",
                Cue::Place(_) => "wall",
                Cue::Spawn(_) => "spawn",
            })
            .collect();
        assert_eq!(order, vec!["slime", "spawn", "wall"]);
    }

    #[test]
    fn unknown_archetypes_fail_validation() {
        let scenario = Scenario::from_toml_str(
            r#"
            [[spawns]]
            archetype = "wraith"
            position = [0.0, 0.0]
            "#,
        )
        .expect("scenario");
        assert!(matches!(
            scenario.validate(&ArenaConfig::default()),
            Err(ConfigError::UnknownArchetype(name)) if name == "wraith"
        ));
    }

    #[test]
    fn zero_step_duration_is_clamped() {
        let scenario = Scenario {
            dt_ms: 0,
            ..Scenario::default()
        };
        assert_eq!(scenario.step_duration(), Duration::from_millis(1));
    }
}
