//! Arena configuration loaded from TOML.

use std::{collections::BTreeMap, fs, io, path::Path, path::PathBuf, time::Duration};

use scrap_siege_core::{
    seconds, AttackProfile, AttackStyle, EconomyConfig, GridConfig, StationConfig, StationStats,
    StructureCatalog, UnitStats, Vec2, WorldConfig,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}")]
    Read {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML for the expected schema.
    #[error("failed to parse TOML")]
    Parse(#[from] toml::de::Error),
    /// The grid cannot hold a single cell.
    #[error("grid must have at least one cell and a positive cell size")]
    EmptyGrid,
    /// A scenario names an archetype the arena does not define.
    #[error("unknown unit archetype `{0}`")]
    UnknownArchetype(String),
}

pub(crate) fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Defended station settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationSettings {
    /// Whether the arena contains a station at all.
    pub enabled: bool,
    /// World-space anchor of the station.
    pub position: Vec2,
    /// Station stat record.
    pub stats: StationStats,
}

impl Default for StationSettings {
    fn default() -> Self {
        let station = StationConfig::default();
        Self {
            enabled: true,
            position: station.position,
            stats: station.stats,
        }
    }
}

/// Targeting tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingSettings {
    /// Distance beyond which an attacker starts breaking its leash.
    pub leash_distance: f32,
    /// Seconds an attacker may stay beyond the leash.
    pub leash_grace_secs: f32,
    /// Seconds between station battery scans.
    pub scan_interval_secs: f32,
}

impl Default for TargetingSettings {
    fn default() -> Self {
        Self {
            leash_distance: 60.0,
            leash_grace_secs: 3.0,
            scan_interval_secs: 0.2,
        }
    }
}

impl TargetingSettings {
    pub(crate) fn system_config(&self) -> scrap_siege_system_targeting::Config {
        scrap_siege_system_targeting::Config::new(
            self.leash_distance,
            seconds(self.leash_grace_secs),
            seconds(self.scan_interval_secs),
        )
    }
}

/// Zone engine tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSettings {
    /// Seconds between two occupancy scans of the same zone.
    pub scan_interval_secs: f32,
}

impl Default for ZoneSettings {
    fn default() -> Self {
        Self {
            scan_interval_secs: 0.5,
        }
    }
}

impl ZoneSettings {
    pub(crate) fn system_config(&self) -> scrap_siege_system_zones::Config {
        let interval = seconds(self.scan_interval_secs);
        scrap_siege_system_zones::Config::new(if interval.is_zero() {
            Duration::from_millis(500)
        } else {
            interval
        })
    }
}

/// Everything needed to build a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Build grid layout and obstacles.
    pub grid: GridConfig,
    /// Defended station.
    pub station: StationSettings,
    /// Starting economy.
    pub economy: EconomyConfig,
    /// Wall and zone stat records.
    pub structures: StructureCatalog,
    /// Targeting tunables.
    pub targeting: TargetingSettings,
    /// Zone engine tunables.
    pub zones: ZoneSettings,
    /// Hostile unit archetypes by name.
    pub archetypes: BTreeMap<String, UnitStats>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            station: StationSettings::default(),
            economy: EconomyConfig::default(),
            structures: StructureCatalog::default(),
            targeting: TargetingSettings::default(),
            zones: ZoneSettings::default(),
            archetypes: default_archetypes(),
        }
    }
}

fn default_archetypes() -> BTreeMap<String, UnitStats> {
    let mut archetypes = BTreeMap::new();
    let _ = archetypes.insert("crawler".to_owned(), UnitStats::default());
    let _ = archetypes.insert(
        "bomber".to_owned(),
        UnitStats {
            max_health: 60,
            speed: 2.5,
            attack: AttackProfile::new(0, 1.5, 1.0),
            style: AttackStyle::bomber(),
            scrap_reward: 40,
            ..UnitStats::default()
        },
    );
    archetypes
}

impl ArenaConfig {
    /// Parses and validates a configuration document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the configuration at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read(path.as_ref())?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let grid = &self.grid;
        if grid.columns == 0
            || grid.rows == 0
            || grid.cell_size.is_nan()
            || grid.cell_size <= 0.0
        {
            return Err(ConfigError::EmptyGrid);
        }
        Ok(())
    }

    /// Stats of the named archetype.
    pub fn archetype(&self, name: &str) -> Result<UnitStats, ConfigError> {
        self.archetypes
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownArchetype(name.to_owned()))
    }

    /// World configuration derived from these settings.
    #[must_use]
    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            grid: self.grid.clone(),
            station: self.station.enabled.then_some(StationConfig {
                position: self.station.position,
                stats: self.station.stats,
            }),
            economy: self.economy,
            structures: self.structures,
        }
    }
}
