#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that runs area-effect zones.
//!
//! Each zone keeps two timers: a lifetime countdown that ends in expiry, and
//! a periodic scan that adopts hostiles the boundary detector never reported.
//! Every tracked occupant owns a repeating effect timer that is cancelled on
//! exit, death or zone removal, reverting any speed modifier it applied.

use std::{collections::BTreeMap, time::Duration};

use log::{debug, info};
use scrap_siege_core::{
    Command, EntityId, Event, Layers, UnitView, Vec2, ZoneEffect, ZoneSnapshot, ZoneView,
};

/// Tunables shared by every zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    scan_interval: Duration,
}

impl Config {
    /// Creates a new zone configuration.
    #[must_use]
    pub const fn new(scan_interval: Duration) -> Self {
        Self { scan_interval }
    }

    /// Interval between two occupancy scans of the same zone.
    #[must_use]
    pub const fn scan_interval(&self) -> Duration {
        self.scan_interval
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct OccupantTask {
    next_effect_in: Duration,
    stacks: u32,
    slowed: bool,
}

#[derive(Clone, Debug)]
struct ZoneState {
    effect: ZoneEffect,
    position: Vec2,
    radius: f32,
    lifetime: Duration,
    remaining: Duration,
    scan_in: Duration,
    occupants: BTreeMap<EntityId, OccupantTask>,
}

impl ZoneState {
    fn from_snapshot(snapshot: &ZoneSnapshot) -> Self {
        Self {
            effect: snapshot.effect,
            position: snapshot.position,
            radius: snapshot.radius,
            lifetime: snapshot.lifetime,
            remaining: snapshot.lifetime,
            scan_in: Duration::ZERO,
            occupants: BTreeMap::new(),
        }
    }

    fn intensity(&self) -> f32 {
        if self.lifetime.is_zero() {
            return 0.0;
        }
        (self.remaining.as_secs_f32() / self.lifetime.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// How an occupant came to be tracked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Arrival {
    /// Reported by the boundary detector; enter-only effects apply.
    Entered,
    /// Adopted by a periodic scan.
    Scanned,
}

/// Area-effect zone system.
#[derive(Debug, Default)]
pub struct Zones {
    config: Config,
    zones: BTreeMap<EntityId, ZoneState>,
}

impl Zones {
    /// Creates a new zone system with the provided tunables.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            zones: BTreeMap::new(),
        }
    }

    /// Units currently tracked by the zone, in id order.
    #[must_use]
    pub fn occupants(&self, zone: EntityId) -> Vec<EntityId> {
        self.zones
            .get(&zone)
            .map(|state| state.occupants.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of slime stacks the zone applied to the unit.
    #[must_use]
    pub fn stacks(&self, zone: EntityId, unit: EntityId) -> Option<u32> {
        self.zones
            .get(&zone)?
            .occupants
            .get(&unit)
            .map(|task| task.stacks)
    }

    /// Lifetime left before the zone expires.
    #[must_use]
    pub fn remaining(&self, zone: EntityId) -> Option<Duration> {
        self.zones.get(&zone).map(|state| state.remaining)
    }

    /// Consumes world events and snapshots to emit zone effect commands.
    ///
    /// `overlap` should mirror the world's `query::overlap`.
    pub fn handle<O>(
        &mut self,
        events: &[Event],
        zones: &ZoneView,
        units: &UnitView,
        mut overlap: O,
        out: &mut Vec<Command>,
    ) where
        O: FnMut(Vec2, f32, Layers) -> Vec<EntityId>,
    {
        self.zones.retain(|zone, _| zones.get(*zone).is_some());
        for snapshot in zones.iter() {
            let _ = self
                .zones
                .entry(snapshot.id)
                .or_insert_with(|| ZoneState::from_snapshot(snapshot));
        }

        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::ZoneExited { zone, unit } => {
                    if let Some(state) = self.zones.get_mut(zone) {
                        untrack(*zone, state, *unit, out);
                    }
                }
                Event::EntityDied { entity, .. } | Event::EntityDespawned { entity } => {
                    if self.zones.remove(entity).is_none() {
                        for (zone, state) in &mut self.zones {
                            untrack(*zone, state, *entity, out);
                        }
                    }
                }
                Event::StructureDestroyed {
                    structure: zone, ..
                }
                | Event::ZoneExpired { zone, .. } => {
                    let _ = self.zones.remove(zone);
                }
                _ => {}
            }
        }

        self.advance_lifetimes(elapsed, out);

        for (zone, state) in &mut self.zones {
            advance_tasks(*zone, state, elapsed, units, out);
        }

        for event in events {
            if let Event::ZoneEntered { zone, unit } = event {
                if !units.is_alive(*unit) {
                    continue;
                }
                if let Some(state) = self.zones.get_mut(zone) {
                    track(*zone, state, *unit, Arrival::Entered, out);
                }
            }
        }

        for (zone, state) in &mut self.zones {
            state.scan_in = state.scan_in.saturating_sub(elapsed);
            if !state.scan_in.is_zero() {
                continue;
            }
            state.scan_in = self.config.scan_interval;
            for unit in overlap(state.position, state.radius, Layers::HOSTILE) {
                if units.is_alive(unit) {
                    track(*zone, state, unit, Arrival::Scanned, out);
                }
            }
        }
    }

    fn advance_lifetimes(&mut self, elapsed: Duration, out: &mut Vec<Command>) {
        if elapsed.is_zero() {
            return;
        }
        let mut expired = Vec::new();
        for (zone, state) in &mut self.zones {
            state.remaining = state.remaining.saturating_sub(elapsed);
            out.push(Command::SetZoneIntensity {
                zone: *zone,
                intensity: state.intensity(),
            });
            if state.remaining.is_zero() {
                expired.push(*zone);
            }
        }

        for zone in expired {
            let Some(mut state) = self.zones.remove(&zone) else {
                continue;
            };
            let occupants: Vec<EntityId> = state.occupants.keys().copied().collect();
            for unit in occupants {
                untrack(zone, &mut state, unit, out);
            }
            info!("zone {} ran out of lifetime", zone.get());
            out.push(Command::ExpireZone { zone });
        }
    }
}

fn track(
    zone: EntityId,
    state: &mut ZoneState,
    unit: EntityId,
    arrival: Arrival,
    out: &mut Vec<Command>,
) {
    if state.occupants.contains_key(&unit) {
        return;
    }
    let interval = state.effect.interval();
    let mut task = OccupantTask {
        next_effect_in: interval,
        stacks: 0,
        slowed: false,
    };

    match state.effect {
        ZoneEffect::Acid { .. } | ZoneEffect::Slime { .. } => {
            apply_effect(zone, state.effect, unit, &mut task, out);
        }
        ZoneEffect::Spikes { spike_damage, .. } => {
            if arrival == Arrival::Entered && spike_damage / 2 > 0 {
                out.push(Command::ApplyDamage {
                    target: unit,
                    amount: spike_damage / 2,
                });
            }
            task.next_effect_in = interval / 2;
        }
    }

    debug!("zone {} tracks unit {}", zone.get(), unit.get());
    let _ = state.occupants.insert(unit, task);
}

fn untrack(zone: EntityId, state: &mut ZoneState, unit: EntityId, out: &mut Vec<Command>) {
    let Some(task) = state.occupants.remove(&unit) else {
        return;
    };
    if task.slowed {
        out.push(Command::ClearSpeedModifier { unit, zone });
    }
    debug!("zone {} released unit {}", zone.get(), unit.get());
}

fn advance_tasks(
    zone: EntityId,
    state: &mut ZoneState,
    elapsed: Duration,
    units: &UnitView,
    out: &mut Vec<Command>,
) {
    let gone: Vec<EntityId> = state
        .occupants
        .keys()
        .copied()
        .filter(|unit| !units.is_alive(*unit))
        .collect();
    for unit in gone {
        untrack(zone, state, unit, out);
    }

    let interval = state.effect.interval();
    let effect = state.effect;
    for (unit, task) in &mut state.occupants {
        let mut budget = elapsed;
        while task.next_effect_in <= budget {
            budget -= task.next_effect_in;
            apply_effect(zone, effect, *unit, task, out);
            task.next_effect_in = interval;
            if interval.is_zero() {
                break;
            }
        }
        task.next_effect_in = task.next_effect_in.saturating_sub(budget);
    }
}

fn apply_effect(
    zone: EntityId,
    effect: ZoneEffect,
    unit: EntityId,
    task: &mut OccupantTask,
    out: &mut Vec<Command>,
) {
    match effect {
        ZoneEffect::Acid {
            damage_per_tick, ..
        } => out.push(Command::ApplyDamage {
            target: unit,
            amount: damage_per_tick,
        }),
        ZoneEffect::Spikes { spike_damage, .. } => out.push(Command::ApplyDamage {
            target: unit,
            amount: spike_damage,
        }),
        ZoneEffect::Slime {
            slow_power,
            stacking,
            stack_limit,
            ..
        } => {
            let multiplier = if stacking {
                task.stacks = task.stacks.saturating_add(1);
                stacked_multiplier(slow_power, task.stacks, stack_limit)
            } else {
                task.stacks = 1;
                slow_power
            };
            task.slowed = true;
            out.push(Command::SetSpeedModifier {
                unit,
                zone,
                multiplier,
            });
        }
    }
}

/// `slow_power^stacks`, bounded by the limit on the side the power moves toward.
///
/// The first application is always `slow_power` itself; only compounded stacks are bounded.
fn stacked_multiplier(slow_power: f32, stacks: u32, stack_limit: f32) -> f32 {
    if stacks <= 1 {
        return slow_power;
    }
    let exponent = i32::try_from(stacks).unwrap_or(i32::MAX);
    let raw = slow_power.powi(exponent);
    if slow_power < 1.0 {
        raw.max(stack_limit)
    } else {
        raw.min(stack_limit)
    }
}
