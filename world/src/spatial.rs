//! Spatial query gateway: overlap queries by circle and layer mask.

use std::collections::BTreeMap;

use glam::Vec2;
use scrap_siege_core::{EntityId, Layers};

use crate::entities::EntityRecord;

/// Bounding circle captured for overlap tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Body {
    pub(crate) id: EntityId,
    pub(crate) position: Vec2,
    pub(crate) radius: f32,
}

impl Body {
    pub(crate) fn of(record: &EntityRecord) -> Self {
        Self {
            id: record.id,
            position: record.position,
            radius: record.radius,
        }
    }

    pub(crate) fn overlaps(&self, other: &Body) -> bool {
        self.position.distance(other.position) <= self.radius + other.radius
    }
}

/// Live entities on `layers` whose bounding circle overlaps the query circle, ordered by id.
pub(crate) fn overlap(
    entities: &BTreeMap<EntityId, EntityRecord>,
    center: Vec2,
    radius: f32,
    layers: Layers,
) -> Vec<EntityId> {
    let probe = Body {
        id: EntityId::new(u32::MAX),
        position: center,
        radius: radius.max(0.0),
    };
    entities
        .values()
        .filter(|record| record.layer.intersects(layers) && record.is_alive())
        .filter(|record| probe.overlaps(&Body::of(record)))
        .map(|record| record.id)
        .collect()
}

/// Bodies of live entities on `layers`, ordered by id.
pub(crate) fn bodies(entities: &BTreeMap<EntityId, EntityRecord>, layers: Layers) -> Vec<Body> {
    entities
        .values()
        .filter(|record| record.layer.intersects(layers) && record.is_alive())
        .map(Body::of)
        .collect()
}
