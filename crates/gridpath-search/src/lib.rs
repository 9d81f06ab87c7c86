//! Step-wise A* search over a [`gridpath_core::Grid`].
//!
//! The crate has two layers:
//!
//! - [`Search`]: a single-threaded engine that performs one expansion per
//!   call, either picking the cheapest open cell itself ([`Search::step`]) or
//!   expanding the cell a user names ([`Search::advance`]).
//! - [`Searcher`]: owns the grid and runs a `Search` on a worker thread,
//!   pausing between automatic steps or blocking until the next advance,
//!   and stopping promptly on cancel.
//!
//! Both report progress as [`SearchEvent`]s through an [`EventSink`].
//!
//! Costs use the octile metric with orthogonal steps of 10 and diagonal
//! steps of 14 ([`octile`]), for edges and for the heuristic alike.

mod config;
mod context;
mod distance;
mod engine;
mod event;
mod path;
mod traits;
mod worker;

pub use config::{Mode, SearchConfig};
pub use context::Context;
pub use distance::{DIAGONAL_COST, ORTHOGONAL_COST, octile, walk_cost};
pub use engine::{Search, Step};
pub use event::{CellView, Outcome, SearchEvent, SearchStats};
pub use path::reconstruct_path;
pub use traits::{EventSink, NullSink};
pub use worker::Searcher;
