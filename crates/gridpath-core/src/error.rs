//! The crate-wide [`Error`] type.

use std::fmt;

use crate::cell::SearchState;
use crate::geom::Point;
use crate::grid::{GRID_SIZE_MAX, GRID_SIZE_MIN};
use crate::heap::HeapError;

/// Why a search could not be started or a grid could not be edited.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Precondition {
    MissingStart,
    MissingTarget,
    /// Start and Target occupy the same cell. [`Grid::set_role`] never
    /// produces this; only a grid deserialized from foreign data can.
    ///
    /// [`Grid::set_role`]: crate::Grid::set_role
    SameEndpoints,
    /// A search is in flight on this grid.
    SearchActive,
    /// Some cell still carries state from a previous search.
    GridNotReset,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingStart => "start cell is not placed",
            Self::MissingTarget => "target cell is not placed",
            Self::SameEndpoints => "start and target are the same cell",
            Self::SearchActive => "a search is already active",
            Self::GridNotReset => "grid holds state from a previous search",
        };
        f.write_str(s)
    }
}

/// A transition requested on a cell's search state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Transition {
    Open,
    Close,
}

/// Errors produced by grid, cell and heap operations.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// Grid size outside `GRID_SIZE_MIN..=GRID_SIZE_MAX`.
    SizeOutOfRange { size: i32 },
    /// Position outside the grid.
    OutOfBounds(Point),
    PreconditionUnmet(Precondition),
    /// A cell was asked to leave a state it cannot leave that way.
    InvalidStateTransition {
        pos: Point,
        from: SearchState,
        op: Transition,
    },
    Heap(HeapError),
    /// Predecessor chain is cyclic, dangling or longer than the grid.
    BrokenPath { pos: Point },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeOutOfRange { size } => write!(
                f,
                "grid size {size} must be within range {GRID_SIZE_MIN} to {GRID_SIZE_MAX}"
            ),
            Self::OutOfBounds(p) => write!(f, "position {p} is outside the grid"),
            Self::PreconditionUnmet(why) => write!(f, "precondition unmet: {why}"),
            Self::InvalidStateTransition { pos, from, op } => {
                write!(f, "cell {pos}: cannot {op:?} from {from:?}")
            }
            Self::Heap(e) => write!(f, "heap: {e}"),
            Self::BrokenPath { pos } => write!(f, "predecessor chain broken at {pos}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Heap(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HeapError> for Error {
    fn from(e: HeapError) -> Self {
        Self::Heap(e)
    }
}

impl From<Precondition> for Error {
    fn from(p: Precondition) -> Self {
        Self::PreconditionUnmet(p)
    }
}
