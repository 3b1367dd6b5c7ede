#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure builder system responsible for emitting structure placement and removal commands.

use std::collections::{BTreeSet, VecDeque};

use log::{debug, warn};
use scrap_siege_core::{CellCoord, Command, EntityId, Event, PlacementError, StructureKind};

/// Construction request queued by an adapter or a scenario script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildIntent {
    /// Build a structure of the provided kind on the cell.
    Place {
        /// Kind of structure to build.
        kind: StructureKind,
        /// Cell the structure should occupy.
        cell: CellCoord,
    },
    /// Tear down whatever structure occupies the cell.
    Demolish {
        /// Cell to clear.
        cell: CellCoord,
    },
}

/// Builder system that turns queued intents into world commands.
#[derive(Debug, Clone)]
pub struct Builder {
    queue: VecDeque<BuildIntent>,
    accepting: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            accepting: true,
        }
    }

    /// Queues an intent for the next call to [`Builder::handle`].
    pub fn request(&mut self, intent: BuildIntent) {
        self.queue.push_back(intent);
    }

    /// Number of intents waiting to be processed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Reports whether the builder still accepts construction.
    #[must_use]
    pub const fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Drains queued intents into placement and removal commands.
    ///
    /// The `preview` closure should mirror the world's `query::placement_preview`
    /// and `structure_at` the world's `query::occupant`. Intents that fail the
    /// preview are dropped; the world re-validates every placement anyway.
    pub fn handle<P, S>(
        &mut self,
        events: &[Event],
        mut preview: P,
        mut structure_at: S,
        out: &mut Vec<Command>,
    ) where
        P: FnMut(StructureKind, CellCoord) -> Result<(), PlacementError>,
        S: FnMut(CellCoord) -> Option<EntityId>,
    {
        for event in events {
            if let Event::StationDestroyed { .. } = event {
                self.accepting = false;
            }
        }

        if !self.accepting {
            if !self.queue.is_empty() {
                debug!("dropping {} build intents after defeat", self.queue.len());
                self.queue.clear();
            }
            return;
        }

        let mut claimed = BTreeSet::new();
        while let Some(intent) = self.queue.pop_front() {
            match intent {
                BuildIntent::Place { kind, cell } => {
                    if claimed.contains(&cell) {
                        warn!(
                            "skipping {:?} on ({}, {}): {}",
                            kind,
                            cell.column(),
                            cell.row(),
                            PlacementError::Occupied
                        );
                        continue;
                    }
                    match preview(kind, cell) {
                        Ok(()) => {
                            let _ = claimed.insert(cell);
                            out.push(Command::PlaceStructure { kind, cell });
                        }
                        Err(reason) => warn!(
                            "skipping {:?} on ({}, {}): {}",
                            kind,
                            cell.column(),
                            cell.row(),
                            reason
                        ),
                    }
                }
                BuildIntent::Demolish { cell } => {
                    if let Some(structure) = structure_at(cell) {
                        out.push(Command::RemoveStructure { structure });
                    }
                }
            }
        }
    }
}
