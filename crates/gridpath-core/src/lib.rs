//! **gridpath-core** provides the data model for step-wise grid pathfinding.
//!
//! It holds the pieces the search engine is built from:
//! geometry primitives, the per-cell search state machine, the square
//! [`Grid`] arena that owns the cells, and the [`IndexedMinHeap`] used as the
//! open set.

pub mod cell;
pub mod error;
pub mod geom;
pub mod grid;
pub mod heap;

pub use cell::{Cell, Role, SearchState, Tag};
pub use error::{Error, Precondition, Transition};
pub use geom::{Point, Range};
pub use grid::{GRID_SIZE_DEFAULT, GRID_SIZE_MAX, GRID_SIZE_MIN, Grid, RESIZE_STEP};
pub use heap::{HeapError, HeapItem, IndexedMinHeap};
