//! The search [`Cell`], with per-position role, search state and A* costs.
//!
//! Search state only moves forward: Unvisited → Open → Closed. All mutation
//! goes through [`Cell::open`], [`Cell::close`] and [`Cell::relax`].

use crate::error::{Error, Transition};
use crate::geom::Point;
use crate::heap::HeapItem;

/// What a cell is on the map, independent of any search.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    #[default]
    Empty,
    Start,
    Target,
    Barrier,
}

/// Progress of a cell through the open/closed sets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchState {
    #[default]
    Unvisited,
    Open,
    Closed,
}

/// Display class of a cell, derived from its role and search state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Empty,
    Start,
    Target,
    Barrier,
    /// Empty cell currently in the open set.
    Frontier,
    /// Empty cell that has been expanded.
    Explored,
}

/// A single grid cell with its A* bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pos: Point,
    role: Role,
    state: SearchState,
    g: i32,
    h: i32,
    f: i32,
    predecessor: Option<usize>,
    heap_slot: Option<usize>,
}

impl Cell {
    /// A fresh Empty, Unvisited cell at `pos`.
    pub fn new(pos: Point) -> Self {
        Self {
            pos,
            role: Role::Empty,
            state: SearchState::Unvisited,
            g: 0,
            h: 0,
            f: 0,
            predecessor: None,
            heap_slot: None,
        }
    }

    #[inline]
    pub fn pos(&self) -> Point {
        self.pos
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Cost of the best known path from Start. Meaningless while Unvisited.
    #[inline]
    pub fn g(&self) -> i32 {
        self.g
    }

    /// Heuristic estimate to Target, fixed when the cell is first opened.
    #[inline]
    pub fn h(&self) -> i32 {
        self.h
    }

    /// `g + h`.
    #[inline]
    pub fn f(&self) -> i32 {
        self.f
    }

    /// Grid index of the cell this one was most cheaply reached from.
    #[inline]
    pub fn predecessor(&self) -> Option<usize> {
        self.predecessor
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.state == SearchState::Open
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state == SearchState::Closed
    }

    #[inline]
    pub fn is_barrier(&self) -> bool {
        self.role == Role::Barrier
    }

    /// Display class used by renderers.
    pub fn tag(&self) -> Tag {
        match (self.role, self.state) {
            (Role::Start, _) => Tag::Start,
            (Role::Target, _) => Tag::Target,
            (Role::Barrier, _) => Tag::Barrier,
            (Role::Empty, SearchState::Unvisited) => Tag::Empty,
            (Role::Empty, SearchState::Open) => Tag::Frontier,
            (Role::Empty, SearchState::Closed) => Tag::Explored,
        }
    }

    pub(crate) fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    /// Drop all search bookkeeping, keeping position and role.
    pub(crate) fn clear_search(&mut self) {
        *self = Self {
            role: self.role,
            ..Self::new(self.pos)
        };
    }

    /// Unvisited → Open.
    pub fn open(&mut self) -> Result<(), Error> {
        if self.state != SearchState::Unvisited {
            return Err(self.invalid(Transition::Open));
        }
        self.state = SearchState::Open;
        Ok(())
    }

    /// Open → Closed. Target is never closed.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.state != SearchState::Open || self.role == Role::Target {
            return Err(self.invalid(Transition::Close));
        }
        self.state = SearchState::Closed;
        Ok(())
    }

    /// Adopt `candidate_g` reached from `from` if it beats the current cost.
    ///
    /// An Unvisited cell has no meaningful cost and always adopts; a Closed
    /// cell never does. Returns whether the candidate was adopted.
    pub fn relax(&mut self, candidate_g: i32, from: usize) -> bool {
        let better = match self.state {
            SearchState::Unvisited => true,
            SearchState::Open => candidate_g < self.g,
            SearchState::Closed => false,
        };
        if better {
            self.g = candidate_g;
            self.f = self.g + self.h;
            self.predecessor = Some(from);
        }
        better
    }

    /// Seed the cell as the search origin: zero cost, no predecessor.
    pub fn seed(&mut self, h: i32) {
        self.g = 0;
        self.predecessor = None;
        self.set_h(h);
    }

    pub fn set_h(&mut self, h: i32) {
        self.h = h;
        self.f = self.g + self.h;
    }

    fn invalid(&self, op: Transition) -> Error {
        Error::InvalidStateTransition {
            pos: self.pos,
            from: self.state,
            op,
        }
    }
}

impl HeapItem for Cell {
    type Key = (i32, i32);

    #[inline]
    fn key(&self) -> (i32, i32) {
        (self.f, self.h)
    }

    #[inline]
    fn heap_slot(&self) -> Option<usize> {
        self.heap_slot
    }

    #[inline]
    fn set_heap_slot(&mut self, slot: Option<usize>) {
        self.heap_slot = slot;
    }
}
