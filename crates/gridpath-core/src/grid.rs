//! The search [`Grid`]: an N×N arena of [`Cell`]s plus the Start/Target
//! endpoints.
//!
//! Cells are addressed either by [`Point`] or by their flat row-major index;
//! the index is the handle stored in predecessor links and in the heap.

use crate::cell::{Cell, Role, SearchState};
use crate::error::Error;
use crate::geom::{Point, Range};

/// Smallest accepted grid side length.
pub const GRID_SIZE_MIN: i32 = 6;
/// Largest accepted grid side length.
pub const GRID_SIZE_MAX: i32 = 40;
/// Side length of a grid created with [`Grid::default`].
pub const GRID_SIZE_DEFAULT: i32 = 10;
/// Side length change of one scroll step.
pub const RESIZE_STEP: i32 = 2;

/// A square grid of search cells.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    size: i32,
    cells: Vec<Cell>,
    start: Option<Point>,
    target: Option<Point>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::blank(GRID_SIZE_DEFAULT)
    }
}

impl Grid {
    /// Create a blank `size`×`size` grid.
    pub fn new(size: i32) -> Result<Self, Error> {
        check_size(size)?;
        Ok(Self::blank(size))
    }

    fn blank(size: i32) -> Self {
        Self {
            size,
            cells: Range::square(size).iter().map(Cell::new).collect(),
            start: None,
            target: None,
        }
    }

    /// Reallocate as a blank `n`×`n` grid.
    pub fn resize(&mut self, n: i32) -> Result<(), Error> {
        check_size(n)?;
        *self = Self::blank(n);
        Ok(())
    }

    /// Grow or shrink by `delta` cells per side. A step that would leave the
    /// accepted range is ignored and reported as `false`.
    pub fn resize_by(&mut self, delta: i32) -> bool {
        let n = self.size + delta;
        if delta == 0 || check_size(n).is_err() {
            return false;
        }
        *self = Self::blank(n);
        true
    }

    /// Return every cell to Empty/Unvisited and clear both endpoints.
    pub fn reset(&mut self) {
        *self = Self::blank(self.size);
    }

    /// Wipe search bookkeeping but keep roles and endpoints.
    pub fn clear_search(&mut self) {
        for c in &mut self.cells {
            c.clear_search();
        }
    }

    /// Whether no cell has been touched by a search.
    pub fn is_pristine(&self) -> bool {
        self.cells
            .iter()
            .all(|c| c.state() == SearchState::Unvisited && c.predecessor().is_none())
    }

    #[inline]
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Number of cells, N×N.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn bounds(&self) -> Range {
        Range::square(self.size)
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.bounds().contains(p)
    }

    /// Flat index of `p`, `None` when out of bounds.
    #[inline]
    pub fn idx(&self, p: Point) -> Option<usize> {
        self.bounds().index_of(p)
    }

    /// Position of the cell at flat index `idx`.
    #[inline]
    pub fn point(&self, idx: usize) -> Point {
        self.bounds().point_at(idx)
    }

    pub fn cell(&self, p: Point) -> Option<&Cell> {
        self.idx(p).map(|i| &self.cells[i])
    }

    /// All cells in row-major order.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Mutable access for the search engine and its heap.
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    #[inline]
    pub fn start(&self) -> Option<Point> {
        self.start
    }

    #[inline]
    pub fn target(&self) -> Option<Point> {
        self.target
    }

    /// Number of cells currently Open.
    pub fn open_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_open()).count()
    }

    /// Assign `role` at `p`. A new Start or Target displaces the previous
    /// one, and overwriting an endpoint clears it.
    pub fn set_role(&mut self, p: Point, role: Role) -> Result<(), Error> {
        let idx = self.idx(p).ok_or(Error::OutOfBounds(p))?;

        match self.cells[idx].role() {
            Role::Start => self.start = None,
            Role::Target => self.target = None,
            Role::Empty | Role::Barrier => {}
        }

        let previous = match role {
            Role::Start => self.start.replace(p),
            Role::Target => self.target.replace(p),
            Role::Empty | Role::Barrier => None,
        };
        if let Some(old) = previous.and_then(|old| self.idx(old)) {
            self.cells[old].set_role(Role::Empty);
        }

        self.cells[idx].set_role(role);
        Ok(())
    }

    /// Append into `buf` the (at most 8) neighbors of `p` a search may
    /// relax: in bounds, not a Barrier, not Closed, not the Start cell.
    ///
    /// Diagonal moves are allowed even between two orthogonal barriers.
    pub fn neighbors_of(&self, p: Point, buf: &mut Vec<Point>) {
        buf.clear();
        for n in p.neighbors_8() {
            let Some(c) = self.cell(n) else {
                continue;
            };
            if c.is_barrier() || c.is_closed() || c.role() == Role::Start {
                continue;
            }
            buf.push(n);
        }
    }
}

fn check_size(size: i32) -> Result<(), Error> {
    if (GRID_SIZE_MIN..=GRID_SIZE_MAX).contains(&size) {
        Ok(())
    } else {
        Err(Error::SizeOutOfRange { size })
    }
}
