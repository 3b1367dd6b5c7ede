//! Read-only stat records bound to entities at spawn time.
//!
//! Every record deserializes from partial input: missing fields fall back to
//! the stock arena values.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{seconds, CellCoord, StructureKind};

/// Damage, reach and cadence of an attacker.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackProfile {
    /// Damage dealt by a single strike.
    pub damage: u32,
    /// Maximum distance at which a strike may be issued.
    pub range: f32,
    /// Strikes per second.
    pub rate: f32,
}

impl AttackProfile {
    /// Creates a new attack profile.
    #[must_use]
    pub const fn new(damage: u32, range: f32, rate: f32) -> Self {
        Self {
            damage,
            range,
            rate,
        }
    }

    /// Minimum spacing between two strikes, or `None` when the attacker never fires.
    #[must_use]
    pub fn cooldown(&self) -> Option<Duration> {
        if self.rate.is_finite() && self.rate > 0.0 {
            Some(Duration::from_secs_f32(1.0 / self.rate))
        } else {
            None
        }
    }
}

impl Default for AttackProfile {
    fn default() -> Self {
        Self::new(10, 1.5, 1.0)
    }
}

/// How an attacker delivers its damage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackStyle {
    /// Direct strike against the held target.
    Melee,
    /// Arms a fuse and detonates, damaging every structure in the blast.
    Explosive {
        /// Radius of the blast.
        radius: f32,
        /// Damage dealt at the blast centre.
        damage: u32,
        /// Fuse length in seconds.
        warning_secs: f32,
    },
}

impl AttackStyle {
    /// Stock bomber parameters.
    #[must_use]
    pub const fn bomber() -> Self {
        Self::Explosive {
            radius: 5.0,
            damage: 100,
            warning_secs: 0.5,
        }
    }

    /// Reports whether the style detonates instead of striking.
    #[must_use]
    pub const fn is_explosive(&self) -> bool {
        matches!(self, Self::Explosive { .. })
    }
}

impl Default for AttackStyle {
    fn default() -> Self {
        Self::Melee
    }
}

/// Stat record of a hostile unit archetype.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStats {
    /// Health granted at spawn.
    pub max_health: u32,
    /// Base movement speed in world units per second.
    pub speed: f32,
    /// Radius of the unit's bounding circle.
    pub radius: f32,
    /// Attack parameters.
    pub attack: AttackProfile,
    /// Attack delivery.
    pub style: AttackStyle,
    /// Radius within which structures are considered as targets.
    pub detection_range: f32,
    /// Scrap credited when the unit dies.
    pub scrap_reward: u32,
    /// Seconds the corpse lingers before the handle becomes invalid.
    pub death_delay_secs: f32,
}

impl UnitStats {
    /// Death delay converted into a duration.
    #[must_use]
    pub fn death_delay(&self) -> Duration {
        seconds(self.death_delay_secs)
    }
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            max_health: 100,
            speed: 3.0,
            radius: 0.5,
            attack: AttackProfile::default(),
            style: AttackStyle::Melee,
            detection_range: f32::MAX,
            scrap_reward: 25,
            death_delay_secs: 0.1,
        }
    }
}

/// Stat record of the defended station.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationStats {
    /// Health granted at spawn.
    pub max_health: u32,
    /// Radius of the station's bounding circle.
    pub radius: f32,
    /// Defensive battery, if any.
    pub battery: Option<AttackProfile>,
}

impl Default for StationStats {
    fn default() -> Self {
        Self {
            max_health: 1000,
            radius: 1.5,
            battery: Some(AttackProfile::new(20, 10.0, 0.8)),
        }
    }
}

/// Placement and stats of the defended station.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// World-space anchor of the station.
    pub position: Vec2,
    /// Station stat record.
    pub stats: StationStats,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            position: Vec2::new(7.5, -6.0),
            stats: StationStats::default(),
        }
    }
}

/// Stat record of a wall.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallStats {
    /// Scrap spent on placement.
    pub build_cost: u32,
    /// Health granted at placement.
    pub max_health: u32,
    /// Radius of the wall's bounding circle.
    pub radius: f32,
    /// Seconds the rubble lingers before the handle becomes invalid.
    pub death_delay_secs: f32,
}

impl Default for WallStats {
    fn default() -> Self {
        Self {
            build_cost: 100,
            max_health: 120,
            radius: 0.75,
            death_delay_secs: 1.0,
        }
    }
}

/// Effect a zone applies to its occupants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneEffect {
    /// Damage over time.
    Acid {
        /// Damage dealt per application.
        damage_per_tick: u32,
        /// Seconds between applications.
        damage_interval_secs: f32,
    },
    /// Movement slow, optionally stacking.
    Slime {
        /// Multiplier applied to the occupant's speed.
        slow_power: f32,
        /// Whether re-applications compound.
        stacking: bool,
        /// Bound on the compounded multiplier.
        stack_limit: f32,
        /// Seconds between re-applications.
        slow_interval_secs: f32,
    },
    /// Entry damage followed by periodic damage.
    Spikes {
        /// Damage dealt per periodic application; entry deals half.
        spike_damage: u32,
        /// Seconds between periodic applications.
        damage_interval_secs: f32,
    },
}

impl ZoneEffect {
    /// Interval between two applications of the effect.
    #[must_use]
    pub fn interval(&self) -> Duration {
        match self {
            Self::Acid {
                damage_interval_secs,
                ..
            }
            | Self::Spikes {
                damage_interval_secs,
                ..
            } => seconds(*damage_interval_secs),
            Self::Slime {
                slow_interval_secs, ..
            } => seconds(*slow_interval_secs),
        }
    }
}

/// Stat record of an area-effect zone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneStats {
    /// Scrap spent on placement.
    #[serde(default = "default_zone_cost")]
    pub build_cost: u32,
    /// Seconds the zone stays active.
    #[serde(default = "default_zone_lifetime")]
    pub lifetime_secs: f32,
    /// Radius of the zone's effect.
    #[serde(default = "default_zone_radius")]
    pub radius: f32,
    /// Effect applied to occupants.
    pub effect: ZoneEffect,
}

fn default_zone_cost() -> u32 {
    75
}

fn default_zone_lifetime() -> f32 {
    10.0
}

fn default_zone_radius() -> f32 {
    3.0
}

impl ZoneStats {
    /// Default cost, lifetime and radius around a custom effect.
    #[must_use]
    pub fn with_effect(effect: ZoneEffect) -> Self {
        Self {
            build_cost: default_zone_cost(),
            lifetime_secs: default_zone_lifetime(),
            radius: default_zone_radius(),
            effect,
        }
    }

    /// Stock acid pool.
    #[must_use]
    pub fn acid() -> Self {
        Self::with_effect(ZoneEffect::Acid {
            damage_per_tick: 5,
            damage_interval_secs: 1.0,
        })
    }

    /// Stock slime pool.
    #[must_use]
    pub fn slime() -> Self {
        Self::with_effect(ZoneEffect::Slime {
            slow_power: 0.5,
            stacking: false,
            stack_limit: 0.2,
            slow_interval_secs: 1.0,
        })
    }

    /// Stock spiked floor.
    #[must_use]
    pub fn spikes() -> Self {
        Self::with_effect(ZoneEffect::Spikes {
            spike_damage: 20,
            damage_interval_secs: 1.0,
        })
    }

    /// Lifetime converted into a duration.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        seconds(self.lifetime_secs)
    }
}

/// Stat records for every buildable structure kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureCatalog {
    /// Wall stats.
    pub wall: WallStats,
    /// Acid pool stats.
    pub acid: ZoneStats,
    /// Slime pool stats.
    pub slime: ZoneStats,
    /// Spiked floor stats.
    pub spikes: ZoneStats,
}

impl StructureCatalog {
    /// Scrap required to build the provided kind.
    #[must_use]
    pub fn build_cost(&self, kind: StructureKind) -> u32 {
        match kind {
            StructureKind::Wall => self.wall.build_cost,
            other => self.zone(other).map_or(0, |zone| zone.build_cost),
        }
    }

    /// Zone stats for the provided kind, or `None` for walls.
    #[must_use]
    pub fn zone(&self, kind: StructureKind) -> Option<&ZoneStats> {
        match kind {
            StructureKind::Wall => None,
            StructureKind::Acid => Some(&self.acid),
            StructureKind::Slime => Some(&self.slime),
            StructureKind::Spikes => Some(&self.spikes),
        }
    }
}

impl Default for StructureCatalog {
    fn default() -> Self {
        Self {
            wall: WallStats::default(),
            acid: ZoneStats::acid(),
            slime: ZoneStats::slime(),
            spikes: ZoneStats::spikes(),
        }
    }
}

/// Static circular obstacle that blocks grid cells.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Centre of the obstacle.
    pub center: Vec2,
    /// Radius of the obstacle.
    pub radius: f32,
}

/// Layout of the build grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// World-space centre of cell (0, 0).
    pub origin: Vec2,
    /// Number of columns.
    pub columns: u32,
    /// Number of rows.
    pub rows: u32,
    /// Side length of a cell.
    pub cell_size: f32,
    /// Obstacles blocking construction.
    pub obstacles: Vec<Obstacle>,
}

impl GridConfig {
    /// World-space centre of the provided cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        self.origin + Vec2::new(cell.column() as f32, cell.row() as f32) * self.cell_size
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            columns: 11,
            rows: 11,
            cell_size: 1.5,
            obstacles: Vec::new(),
        }
    }
}

/// Starting economy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Scrap available before the first build.
    pub starting_scrap: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_scrap: 200,
        }
    }
}

/// Everything the world needs to build a fresh arena.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Build grid layout.
    pub grid: GridConfig,
    /// Station placement, or `None` for an undefended arena.
    pub station: Option<StationConfig>,
    /// Starting economy.
    pub economy: EconomyConfig,
    /// Structure stat records.
    pub structures: StructureCatalog,
}

impl WorldConfig {
    /// Stock arena with a defended station.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            station: Some(StationConfig::default()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_never_fires() {
        assert!(AttackProfile::new(10, 1.0, 0.0).cooldown().is_none());
        assert!(AttackProfile::new(10, 1.0, -2.0).cooldown().is_none());
    }

    #[test]
    fn cooldown_is_reciprocal_of_rate() {
        let profile = AttackProfile::new(10, 1.0, 2.0);
        assert_eq!(profile.cooldown(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: WorldConfig = toml::from_str(
            r#"
            [grid]
            columns = 4

            [economy]
            starting_scrap = 10
            "#,
        )
        .expect("parse");

        assert_eq!(config.grid.columns, 4);
        assert_eq!(config.grid.rows, 11);
        assert_eq!(config.economy.starting_scrap, 10);
        assert_eq!(config.structures.wall.max_health, 120);
        assert!(config.station.is_none());
    }

    #[test]
    fn zone_effects_parse_from_tagged_tables() {
        let catalog: StructureCatalog = toml::from_str(
            r#"
            [slime]
            lifetime_secs = 4.0
            effect = { slime = { slow_power = 0.5, stacking = true, stack_limit = 0.2, slow_interval_secs = 1.0 } }
            "#,
        )
        .expect("parse");

        assert_eq!(catalog.slime.build_cost, 75);
        assert_eq!(catalog.slime.lifetime(), Duration::from_secs(4));
        assert!(matches!(
            catalog.slime.effect,
            ZoneEffect::Slime { stacking: true, .. }
        ));
        assert_eq!(catalog.acid, ZoneStats::acid());
    }

    #[test]
    fn explosive_style_round_trips_through_bincode() {
        let stats = UnitStats {
            style: AttackStyle::bomber(),
            ..UnitStats::default()
        };
        let bytes = bincode::serialize(&stats).expect("serialize");
        let restored: UnitStats = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, stats);
    }

    #[test]
    fn cell_centers_follow_origin_and_size() {
        let grid = GridConfig {
            origin: Vec2::new(1.0, 2.0),
            cell_size: 2.0,
            ..GridConfig::default()
        };
        assert_eq!(grid.cell_center(CellCoord::new(3, 1)), Vec2::new(7.0, 4.0));
    }

    #[test]
    fn catalog_reports_costs_per_kind() {
        let catalog = StructureCatalog::default();
        assert_eq!(catalog.build_cost(StructureKind::Wall), 100);
        assert_eq!(catalog.build_cost(StructureKind::Spikes), 75);
        assert!(catalog.zone(StructureKind::Wall).is_none());
    }
}
