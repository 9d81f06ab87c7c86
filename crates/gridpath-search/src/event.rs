//! What the engine reports to its caller while it runs.

use std::time::Duration;

use gridpath_core::{Cell, Error, Point, Role, SearchState};

/// Owned snapshot of a cell's fields at the moment an event was emitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellView {
    pub pos: Point,
    pub role: Role,
    pub state: SearchState,
    pub g: i32,
    pub h: i32,
    pub f: i32,
}

impl CellView {
    pub fn of(cell: &Cell) -> Self {
        Self {
            pos: cell.pos(),
            role: cell.role(),
            state: cell.state(),
            g: cell.g(),
            h: cell.h(),
            f: cell.f(),
        }
    }
}

/// An observation emitted by the engine for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchEvent {
    /// A cell entered the open set; carries its first costs.
    CellOpened(CellView),
    /// A cell was expanded.
    CellClosed(CellView),
    /// An open cell was reached more cheaply; its costs changed.
    CellRelaxed(CellView),
    /// Target reached. `path` runs from the cell next to Target back to the
    /// cell next to Start, both endpoints excluded.
    PathFound { path: Vec<Point>, cost: i32 },
    /// The open set ran dry before Target was reached.
    NoPathFound,
    /// A contract violation stopped the search.
    Aborted(Error),
}

/// Terminal result of a search. Not finding a path is a valid outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    Found { path: Vec<Point>, cost: i32 },
    NoPath,
}

impl Outcome {
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// The event announcing this outcome.
    pub fn to_event(&self) -> SearchEvent {
        match self {
            Self::Found { path, cost } => SearchEvent::PathFound {
                path: path.clone(),
                cost: *cost,
            },
            Self::NoPath => SearchEvent::NoPathFound,
        }
    }
}

/// Work counters of a search.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Cells whose neighbors were explored.
    pub expanded: usize,
    /// Time spent inside the engine, pauses excluded.
    pub elapsed: Duration,
}
