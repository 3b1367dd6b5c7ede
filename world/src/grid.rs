//! Grid occupancy registry tracking which structure occupies which cell.

use glam::Vec2;
use scrap_siege_core::{CellCoord, EntityId, GridConfig, PlacementError};

/// Fraction of a cell's side used as the obstacle probe radius.
const OBSTACLE_PROBE_FRACTION: f32 = 0.4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct GridCell {
    buildable: bool,
    occupant: Option<EntityId>,
}

/// Dense build grid plus the registration-ordered structure list.
#[derive(Clone, Debug)]
pub(crate) struct BuildGrid {
    origin: Vec2,
    columns: u32,
    rows: u32,
    cell_size: f32,
    cells: Vec<GridCell>,
    registered: Vec<EntityId>,
}

impl BuildGrid {
    /// Generates the grid, marking cells whose centre lies near an obstacle as blocked.
    pub(crate) fn generate(config: &GridConfig) -> Self {
        let capacity_u64 = u64::from(config.columns) * u64::from(config.rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        let probe = config.cell_size * OBSTACLE_PROBE_FRACTION;

        let mut cells = Vec::with_capacity(capacity);
        for row in 0..config.rows {
            for column in 0..config.columns {
                let center = config.cell_center(CellCoord::new(column, row));
                let blocked = config
                    .obstacles
                    .iter()
                    .any(|obstacle| obstacle.center.distance(center) <= obstacle.radius + probe);
                cells.push(GridCell {
                    buildable: !blocked,
                    occupant: None,
                });
            }
        }

        Self {
            origin: config.origin,
            columns: config.columns,
            rows: config.rows,
            cell_size: config.cell_size,
            cells,
            registered: Vec::new(),
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    /// Validates that the cell can host a new structure without mutating anything.
    pub(crate) fn check(&self, cell: CellCoord) -> Result<(), PlacementError> {
        let index = self.index(cell).ok_or(PlacementError::OutOfBounds)?;
        let slot = self.cells[index];
        if !slot.buildable {
            return Err(PlacementError::Blocked);
        }
        if slot.occupant.is_some() {
            return Err(PlacementError::Occupied);
        }
        Ok(())
    }

    /// Marks the cell occupied by the provided structure.
    pub(crate) fn try_place(
        &mut self,
        cell: CellCoord,
        structure: EntityId,
    ) -> Result<EntityId, PlacementError> {
        self.check(cell)?;
        let index = self.index(cell).ok_or(PlacementError::OutOfBounds)?;
        self.cells[index].occupant = Some(structure);
        Ok(structure)
    }

    /// Clears the cell hosting the structure. Idempotent.
    pub(crate) fn release(&mut self, structure: EntityId) -> Option<CellCoord> {
        let index = self
            .cells
            .iter()
            .position(|slot| slot.occupant == Some(structure))?;
        self.cells[index].occupant = None;
        self.coord_of(index)
    }

    fn coord_of(&self, index: usize) -> Option<CellCoord> {
        let width = usize::try_from(self.columns).ok()?;
        if width == 0 {
            return None;
        }
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    pub(crate) fn register_structure(&mut self, structure: EntityId) {
        if !self.registered.contains(&structure) {
            self.registered.push(structure);
        }
    }

    pub(crate) fn unregister_structure(&mut self, structure: EntityId) {
        self.registered.retain(|entry| *entry != structure);
    }

    pub(crate) fn registered(&self) -> &[EntityId] {
        &self.registered
    }

    /// Closest structure within range in registration order; ties keep the first seen.
    ///
    /// `anchor` yields the position of a structure that is alive and damageable,
    /// and `None` for everything that must be skipped.
    pub(crate) fn nearest_structure<F>(
        &self,
        position: Vec2,
        max_range: f32,
        mut anchor: F,
    ) -> Option<EntityId>
    where
        F: FnMut(EntityId) -> Option<Vec2>,
    {
        let mut best: Option<(f32, EntityId)> = None;
        for structure in &self.registered {
            let Some(point) = anchor(*structure) else {
                continue;
            };
            let distance = point.distance(position);
            if distance > max_range {
                continue;
            }
            match best {
                Some((closest, _)) if distance >= closest => {}
                _ => best = Some((distance, *structure)),
            }
        }
        best.map(|(_, structure)| structure)
    }

    /// Maps a world position to the nearest cell centre.
    pub(crate) fn cell_at(&self, position: Vec2) -> Option<CellCoord> {
        if self.cell_size <= 0.0 {
            return None;
        }
        let local = (position - self.origin) / self.cell_size;
        let column = local.x.round();
        let row = local.y.round();
        if column < 0.0 || row < 0.0 {
            return None;
        }
        let cell = CellCoord::new(column as u32, row as u32);
        self.index(cell).map(|_| cell)
    }

    pub(crate) fn cell_center(&self, cell: CellCoord) -> Vec2 {
        self.origin + Vec2::new(cell.column() as f32, cell.row() as f32) * self.cell_size
    }

    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<EntityId> {
        self.index(cell).and_then(|index| self.cells[index].occupant)
    }

    pub(crate) fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|slot| slot.occupant.is_some())
            .count()
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }
}
