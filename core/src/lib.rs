#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Scrap Siege engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.

use std::time::Duration;

use bitflags::bitflags;
pub use glam::Vec2;
use serde::{Deserialize, Serialize};

mod stats;

pub use stats::{
    AttackProfile, AttackStyle, EconomyConfig, GridConfig, Obstacle, StationConfig, StationStats,
    StructureCatalog, UnitStats, WallStats, WorldConfig, ZoneEffect, ZoneStats,
};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Spawns a hostile unit bound to the provided stat record.
    SpawnUnit {
        /// Stat record read once at spawn time.
        stats: UnitStats,
        /// World-space position of the new unit.
        position: Vec2,
    },
    /// Requests construction of a structure on the provided grid cell.
    PlaceStructure {
        /// Kind of structure to construct.
        kind: StructureKind,
        /// Cell that should host the structure.
        cell: CellCoord,
    },
    /// Requests removal of a placed structure regardless of its health.
    RemoveStructure {
        /// Structure targeted for removal.
        structure: EntityId,
    },
    /// Applies raw damage to a damageable entity.
    ApplyDamage {
        /// Entity receiving the damage.
        target: EntityId,
        /// Amount of health to subtract.
        amount: u32,
    },
    /// Restores health to a damageable entity.
    Heal {
        /// Entity receiving the heal.
        target: EntityId,
        /// Amount of health to restore.
        amount: u32,
    },
    /// Requests that an attacker strikes its target if its cooldown elapsed.
    Attack {
        /// Entity performing the attack.
        attacker: EntityId,
        /// Entity receiving the attack.
        target: EntityId,
    },
    /// Detonates an explosive unit immediately.
    Detonate {
        /// Explosive unit that should detonate.
        unit: EntityId,
    },
    /// Forces a unit to destroy itself.
    SelfDestruct {
        /// Unit that violated its leash.
        unit: EntityId,
    },
    /// Records the target currently held by an attacker.
    SetTarget {
        /// Attacker whose target changed.
        attacker: EntityId,
        /// New target, or `None` when the attacker is seeking.
        target: Option<EntityId>,
    },
    /// Requests that the navigation collaborator steers a unit toward a point.
    SetDestination {
        /// Unit to steer.
        unit: EntityId,
        /// Destination expressed in world space.
        destination: Vec2,
    },
    /// Requests that the navigation collaborator stops or resumes a unit.
    SetMovementHalted {
        /// Unit whose movement flag should change.
        unit: EntityId,
        /// Whether the unit should remain stationary.
        halted: bool,
    },
    /// Subscribes an attacker to a structure's destruction notification.
    WatchStructure {
        /// Attacker that wants to be notified.
        attacker: EntityId,
        /// Structure being observed.
        structure: EntityId,
    },
    /// Applies a zone-owned multiplier to a unit's movement speed.
    SetSpeedModifier {
        /// Unit whose speed is modified.
        unit: EntityId,
        /// Zone that owns the modifier.
        zone: EntityId,
        /// Multiplier applied to the unit's base speed.
        multiplier: f32,
    },
    /// Removes a zone-owned speed multiplier from a unit.
    ClearSpeedModifier {
        /// Unit whose speed is restored.
        unit: EntityId,
        /// Zone that owned the modifier.
        zone: EntityId,
    },
    /// Updates the presentation intensity of a zone.
    SetZoneIntensity {
        /// Zone whose indicator changed.
        zone: EntityId,
        /// Remaining lifetime fraction in the range 0.0..=1.0.
        intensity: f32,
    },
    /// Destroys a zone whose lifetime ran out.
    ExpireZone {
        /// Zone that expired.
        zone: EntityId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a hostile unit entered the arena.
    UnitSpawned {
        /// Identifier assigned to the unit.
        unit: EntityId,
        /// Position at which the unit appeared.
        position: Vec2,
    },
    /// Confirms that a structure was placed on the grid.
    StructurePlaced {
        /// Identifier assigned to the structure.
        structure: EntityId,
        /// Kind of structure that was placed.
        kind: StructureKind,
        /// Cell occupied by the structure.
        cell: CellCoord,
    },
    /// Reports that a placement request was rejected without mutating state.
    PlacementRejected {
        /// Kind of structure requested.
        kind: StructureKind,
        /// Cell provided in the request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports the new health of a damageable entity.
    HealthChanged {
        /// Entity whose health changed.
        entity: EntityId,
        /// Health after the change.
        health: Health,
    },
    /// Announces that a structure took damage.
    StructureDamaged {
        /// Structure that was damaged.
        structure: EntityId,
    },
    /// Announces that an entity died. Fires exactly once per entity.
    EntityDied {
        /// Entity that died.
        entity: EntityId,
        /// Layer the entity belonged to.
        layer: Layers,
    },
    /// Announces that a structure was destroyed and its cell released.
    StructureDestroyed {
        /// Structure that was destroyed.
        structure: EntityId,
        /// Cell that became free again.
        cell: CellCoord,
    },
    /// Announces that a zone expired and its cell was released.
    ZoneExpired {
        /// Zone that expired.
        zone: EntityId,
        /// Cell that became free again.
        cell: CellCoord,
    },
    /// Announces that the defended station fell.
    StationDestroyed {
        /// Identifier of the station.
        station: EntityId,
    },
    /// Delivered to an attacker subscribed to a structure that was destroyed.
    WatchedStructureDestroyed {
        /// Subscriber receiving the notification.
        attacker: EntityId,
        /// Structure that was destroyed.
        structure: EntityId,
    },
    /// Announces that an entity handle became invalid.
    EntityDespawned {
        /// Entity removed from the world.
        entity: EntityId,
    },
    /// Announces that an attacker acquired, switched or dropped its target.
    TargetChanged {
        /// Attacker whose target changed.
        attacker: EntityId,
        /// New target, if any.
        target: Option<EntityId>,
    },
    /// Confirms that an attack landed.
    AttackLanded {
        /// Attacker that struck.
        attacker: EntityId,
        /// Entity that was struck.
        target: EntityId,
        /// Damage dealt by the attack.
        damage: u32,
    },
    /// Announces that an explosive unit armed its fuse.
    FuseArmed {
        /// Explosive unit.
        unit: EntityId,
    },
    /// Announces that an explosive unit detonated.
    Exploded {
        /// Explosive unit.
        unit: EntityId,
        /// Number of entities damaged by the blast.
        hits: u32,
    },
    /// Reports that a unit's bounding volume started overlapping a zone.
    ZoneEntered {
        /// Zone that was entered.
        zone: EntityId,
        /// Unit that entered.
        unit: EntityId,
    },
    /// Reports that a unit's bounding volume stopped overlapping a zone.
    ZoneExited {
        /// Zone that was left.
        zone: EntityId,
        /// Unit that left.
        unit: EntityId,
    },
    /// Reports that a unit started touching a structure or the station.
    UnitContact {
        /// Unit that made contact.
        unit: EntityId,
        /// Structure that was touched.
        structure: EntityId,
    },
    /// Reports a unit's effective movement speed after a modifier change.
    SpeedChanged {
        /// Unit whose speed changed.
        unit: EntityId,
        /// Effective speed in world units per second.
        speed: f32,
    },
    /// Reports the new scrap balance.
    ScrapChanged {
        /// Scrap available after the change.
        total: u32,
    },
}

bitflags! {
    /// Layers used to filter spatial queries.
    #[derive(Default, Serialize, Deserialize)]
    pub struct Layers: u32 {
        /// Mobile hostile units.
        const HOSTILE = 0b0001;
        /// Player-built structures occupying grid cells.
        const STRUCTURE = 0b0010;
        /// The defended station.
        const STATION = 0b0100;
        /// Area-effect zones.
        const ZONE = 0b1000;
    }
}

bitflags! {
    /// Capabilities an entity declares in the world's capability table.
    #[derive(Default)]
    pub struct Capabilities: u32 {
        /// Tracks health and can be damaged or healed.
        const DAMAGEABLE = 0b0000_0001;
        /// Selects targets and strikes them on a cooldown.
        const ATTACKER = 0b0000_0010;
        /// Moves under the navigation collaborator.
        const MOBILE = 0b0000_0100;
        /// Occupies a grid cell.
        const STRUCTURE = 0b0000_1000;
        /// Applies area effects to occupants.
        const ZONE = 0b0001_0000;
        /// Detonates instead of striking.
        const EXPLOSIVE = 0b0010_0000;
    }
}

/// Unique identifier assigned to every entity. Identifiers are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Health bookkeeping value shared by snapshots and events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    current: u32,
    max: u32,
}

impl Health {
    /// Creates a full health pool. A zero maximum is raised to one.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        let max = if max == 0 { 1 } else { max };
        Self { current: max, max }
    }

    /// Creates a health value with explicit current and maximum values.
    ///
    /// The current value is clamped into `0..=max`.
    #[must_use]
    pub fn with_current(current: u32, max: u32) -> Self {
        let max = max.max(1);
        Self {
            current: current.min(max),
            max,
        }
    }

    /// Remaining health.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Maximum health fixed at spawn.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Reports whether any health remains.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current > 0
    }
}

/// Types of structures that can be built on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// Damageable barrier that hostiles attack.
    Wall,
    /// Corrosive pool dealing damage over time.
    Acid,
    /// Adhesive pool slowing occupants.
    Slime,
    /// Spiked floor dealing entry and periodic damage.
    Spikes,
}

impl StructureKind {
    /// Reports whether the structure is an area-effect zone.
    #[must_use]
    pub const fn is_zone(self) -> bool {
        !matches!(self, Self::Wall)
    }
}

/// Reasons a placement request may be rejected by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum PlacementError {
    /// The requested cell lies outside the generated grid.
    #[error("cell lies outside the build grid")]
    OutOfBounds,
    /// The requested cell overlaps a static obstacle.
    #[error("cell is blocked by an obstacle")]
    Blocked,
    /// The requested cell already hosts a structure.
    #[error("cell is already occupied")]
    Occupied,
    /// The economy cannot cover the build cost.
    #[error("insufficient scrap: need {required}, have {available}")]
    InsufficientScrap {
        /// Scrap required by the structure.
        required: u32,
        /// Scrap currently available.
        available: u32,
    },
}

/// Immutable representation of a single hostile unit used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: EntityId,
    /// Current world-space position.
    pub position: Vec2,
    /// Radius of the unit's bounding circle.
    pub radius: f32,
    /// Health pool of the unit.
    pub health: Health,
    /// Attack parameters bound at spawn.
    pub attack: AttackProfile,
    /// Attack behaviour bound at spawn.
    pub style: AttackStyle,
    /// Radius within which the unit looks for structures.
    pub detection_range: f32,
    /// Indicates whether the attack cooldown elapsed.
    pub cooldown_ready: bool,
    /// Indicates whether an explosive fuse is burning.
    pub fuse_armed: bool,
    /// Whether the navigation collaborator holds the unit still.
    pub halted: bool,
    /// Destination currently requested from navigation.
    pub destination: Option<Vec2>,
    /// Speed after zone modifiers.
    pub speed: f32,
    /// Speed bound at spawn.
    pub base_speed: f32,
    /// Target recorded for the unit, if any.
    pub target: Option<EntityId>,
}

/// Read-only snapshot describing all hostile units in the arena.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for the provided unit.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Reports whether the unit exists and is alive.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).map_or(false, |unit| unit.health.is_alive())
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single structure or the station.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructureSnapshot {
    /// Identifier allocated to the structure by the world.
    pub id: EntityId,
    /// Kind of structure, or `None` for the station.
    pub kind: Option<StructureKind>,
    /// Cell occupied by the structure, or `None` for the station.
    pub cell: Option<CellCoord>,
    /// World-space anchor of the structure.
    pub position: Vec2,
    /// Radius of the structure's bounding circle.
    pub radius: f32,
    /// Health pool when the structure is damageable.
    pub health: Option<Health>,
}

impl StructureSnapshot {
    /// Reports whether the structure can still be attacked.
    #[must_use]
    pub fn is_attackable(&self) -> bool {
        self.health.map_or(false, |health| health.is_alive())
    }
}

/// Weak handle to an attack target, valid only for the snapshot it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetRef {
    /// Entity being targeted.
    pub entity: EntityId,
    /// Point the attacker measures its range against.
    pub anchor: Vec2,
}

/// Read-only snapshot describing all structures, including the station.
#[derive(Clone, Debug, Default)]
pub struct StructureView {
    snapshots: Vec<StructureSnapshot>,
}

impl StructureView {
    /// Creates a new structure view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<StructureSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured structure snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &StructureSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for the provided structure.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&StructureSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Re-derives a target reference, or `None` when the structure is gone or dead.
    #[must_use]
    pub fn resolve(&self, id: EntityId) -> Option<TargetRef> {
        self.get(id)
            .filter(|snapshot| snapshot.is_attackable())
            .map(|snapshot| TargetRef {
                entity: snapshot.id,
                anchor: snapshot.position,
            })
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<StructureSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of the defended station.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StationSnapshot {
    /// Identifier of the station.
    pub id: EntityId,
    /// World-space anchor of the station.
    pub position: Vec2,
    /// Health pool of the station.
    pub health: Health,
    /// Defensive battery, if the station carries one.
    pub battery: Option<AttackProfile>,
    /// Indicates whether the battery cooldown elapsed.
    pub cooldown_ready: bool,
    /// Hostile currently engaged by the battery.
    pub target: Option<EntityId>,
}

/// Immutable representation of a single area-effect zone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneSnapshot {
    /// Identifier allocated to the zone.
    pub id: EntityId,
    /// Structure kind the zone was built as.
    pub kind: StructureKind,
    /// Cell occupied by the zone.
    pub cell: CellCoord,
    /// World-space centre of the zone.
    pub position: Vec2,
    /// Radius of the zone's effect.
    pub radius: f32,
    /// Total lifetime granted at placement.
    pub lifetime: Duration,
    /// Effect applied to occupants.
    pub effect: ZoneEffect,
    /// Presentation intensity in the range 0.0..=1.0.
    pub intensity: f32,
}

/// Read-only snapshot describing all active zones.
#[derive(Clone, Debug, Default)]
pub struct ZoneView {
    snapshots: Vec<ZoneSnapshot>,
}

impl ZoneView {
    /// Creates a new zone view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ZoneSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured zone snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ZoneSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for the provided zone.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&ZoneSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }
}

/// Converts a duration expressed in fractional seconds, clamping invalid input to zero.
#[must_use]
pub fn seconds(value: f32) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f32(value)
    } else {
        Duration::ZERO
    }
}
