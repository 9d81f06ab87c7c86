//! The step-wise A* engine.
//!
//! [`Search`] owns the open set and drives the cells of a borrowed [`Grid`]
//! one expansion at a time, so the same engine serves both the automatic
//! loop and user-paced exploration. It never spawns threads or sleeps; that
//! is the worker's job.

use std::time::Instant;

use gridpath_core::{Error, Grid, IndexedMinHeap, Point, Precondition, Role, SearchState};

use crate::distance::octile;
use crate::event::{CellView, Outcome, SearchEvent, SearchStats};
use crate::path::reconstruct_path;
use crate::traits::EventSink;

/// Result of a single engine step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// More work remains.
    Continue,
    /// The requested cell cannot be explored; nothing changed.
    Ignored,
    /// The search has terminated.
    Done(Outcome),
}

/// An in-progress A* search over one grid.
#[derive(Clone, Debug)]
pub struct Search {
    open: IndexedMinHeap,
    start: usize,
    target: usize,
    target_pos: Point,
    nbuf: Vec<Point>,
    stats: SearchStats,
    outcome: Option<Outcome>,
}

impl Search {
    /// Validate the grid and open the Start cell.
    ///
    /// Requires both endpoints placed and distinct and every cell untouched
    /// by a previous search.
    pub fn new<S: EventSink>(grid: &mut Grid, sink: &mut S) -> Result<Self, Error> {
        let start_pos = grid.start().ok_or(Precondition::MissingStart)?;
        let target_pos = grid.target().ok_or(Precondition::MissingTarget)?;
        if start_pos == target_pos {
            return Err(Precondition::SameEndpoints.into());
        }
        if !grid.is_pristine() {
            return Err(Precondition::GridNotReset.into());
        }
        let start = grid.idx(start_pos).ok_or(Error::OutOfBounds(start_pos))?;
        let target = grid.idx(target_pos).ok_or(Error::OutOfBounds(target_pos))?;

        let mut open = IndexedMinHeap::with_capacity(grid.len());
        let cells = grid.cells_mut();
        cells[start].seed(octile(start_pos, target_pos));
        open.insert(cells, start)?;
        cells[start].open()?;
        sink.emit(SearchEvent::CellOpened(CellView::of(&cells[start])));

        Ok(Self {
            open,
            start,
            target,
            target_pos,
            nbuf: Vec::with_capacity(8),
            stats: SearchStats::default(),
            outcome: None,
        })
    }

    /// Number of cells currently in the open set.
    #[inline]
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    #[inline]
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// The terminal outcome, once reached.
    #[inline]
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Automatic mode: extract the cheapest open cell and expand it.
    pub fn step<S: EventSink>(&mut self, grid: &mut Grid, sink: &mut S) -> Result<Step, Error> {
        if let Some(outcome) = &self.outcome {
            return Ok(Step::Done(outcome.clone()));
        }
        let began = Instant::now();
        let step = match self.open.extract_min(grid.cells_mut()) {
            None => self.finish(grid, false, sink),
            Some(current) if current == self.target => self.finish(grid, true, sink),
            Some(current) => {
                log::trace!("expanding {}", grid.point(current));
                self.explore(grid, current, sink).map(|()| Step::Continue)
            }
        };
        self.stats.elapsed += began.elapsed();
        step
    }

    /// Run automatic steps until the search terminates.
    pub fn run<S: EventSink>(&mut self, grid: &mut Grid, sink: &mut S) -> Result<Outcome, Error> {
        loop {
            if let Step::Done(outcome) = self.step(grid, sink)? {
                return Ok(outcome);
            }
        }
    }

    /// Interactive mode: expand Start only, then wait for [`advance`].
    ///
    /// [`advance`]: Search::advance
    pub fn begin_interactive<S: EventSink>(
        &mut self,
        grid: &mut Grid,
        sink: &mut S,
    ) -> Result<Step, Error> {
        let cells = grid.cells_mut();
        if self.outcome.is_some() || !self.open.contains(&*cells, self.start) {
            return Ok(Step::Ignored);
        }
        self.open.remove(cells, self.start)?;
        self.expand_chosen(grid, self.start, sink)
    }

    /// Interactive mode: expand the open cell at `p`.
    ///
    /// Positions outside the grid, cells that are not Open and calls after
    /// termination are ignored without touching any state. Naming Target
    /// ends the search with its path.
    pub fn advance<S: EventSink>(
        &mut self,
        grid: &mut Grid,
        p: Point,
        sink: &mut S,
    ) -> Result<Step, Error> {
        if self.outcome.is_some() {
            return Ok(Step::Ignored);
        }
        let Some(idx) = grid.idx(p) else {
            return Ok(Step::Ignored);
        };
        let cells = grid.cells_mut();
        if cells[idx].state() != SearchState::Open || !self.open.contains(&*cells, idx) {
            return Ok(Step::Ignored);
        }
        self.open.remove(cells, idx)?;
        if idx == self.target {
            let began = Instant::now();
            let step = self.finish(grid, true, sink);
            self.stats.elapsed += began.elapsed();
            return step;
        }
        self.expand_chosen(grid, idx, sink)
    }

    fn expand_chosen<S: EventSink>(
        &mut self,
        grid: &mut Grid,
        idx: usize,
        sink: &mut S,
    ) -> Result<Step, Error> {
        let began = Instant::now();
        let step = self.explore(grid, idx, sink).and_then(|()| {
            if self.open.is_empty() {
                self.finish(grid, false, sink)
            } else {
                Ok(Step::Continue)
            }
        });
        self.stats.elapsed += began.elapsed();
        step
    }

    /// Close `explorer` and relax every neighbor the grid offers.
    fn explore<S: EventSink>(
        &mut self,
        grid: &mut Grid,
        explorer: usize,
        sink: &mut S,
    ) -> Result<(), Error> {
        {
            let cell = &mut grid.cells_mut()[explorer];
            if cell.role() != Role::Target {
                cell.close()?;
                sink.emit(SearchEvent::CellClosed(CellView::of(cell)));
            }
        }
        self.stats.expanded += 1;

        let mut nbuf = std::mem::take(&mut self.nbuf);
        grid.neighbors_of(grid.point(explorer), &mut nbuf);
        let relaxed = self.relax_neighbors(grid, explorer, &nbuf, sink);
        self.nbuf = nbuf;
        relaxed
    }

    fn relax_neighbors<S: EventSink>(
        &mut self,
        grid: &mut Grid,
        explorer: usize,
        neighbors: &[Point],
        sink: &mut S,
    ) -> Result<(), Error> {
        let from = grid.point(explorer);
        let explorer_g = grid.cells()[explorer].g();

        for &np in neighbors {
            let Some(ni) = grid.idx(np) else {
                continue;
            };
            let candidate = explorer_g + octile(from, np);
            let cells = grid.cells_mut();
            let before = cells[ni].state();
            if !cells[ni].relax(candidate, explorer) {
                continue;
            }
            match before {
                SearchState::Unvisited => {
                    cells[ni].set_h(octile(np, self.target_pos));
                    self.open.insert(cells, ni)?;
                    cells[ni].open()?;
                    sink.emit(SearchEvent::CellOpened(CellView::of(&cells[ni])));
                }
                SearchState::Open => {
                    self.open.decrease_key(cells, ni)?;
                    sink.emit(SearchEvent::CellRelaxed(CellView::of(&cells[ni])));
                }
                SearchState::Closed => {}
            }
        }
        Ok(())
    }

    fn finish<S: EventSink>(
        &mut self,
        grid: &Grid,
        reached: bool,
        sink: &mut S,
    ) -> Result<Step, Error> {
        let outcome = if reached {
            Outcome::Found {
                path: reconstruct_path(grid, self.target)?,
                cost: grid.cells()[self.target].g(),
            }
        } else {
            Outcome::NoPath
        };
        sink.emit(outcome.to_event());
        self.outcome = Some(outcome.clone());
        Ok(Step::Done(outcome))
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    use rand::rngs::StdRng;
    use rand::{RngExt, SeedableRng};

    use super::*;
    use crate::distance::walk_cost;
    use crate::traits::NullSink;

    fn grid_with(size: i32, start: (i32, i32), target: (i32, i32)) -> Grid {
        let mut g = Grid::new(size).unwrap();
        g.set_role(Point::new(start.0, start.1), Role::Start).unwrap();
        g.set_role(Point::new(target.0, target.1), Role::Target).unwrap();
        g
    }

    fn full_route(g: &Grid, path: &[Point]) -> Vec<Point> {
        let mut route = vec![g.start().unwrap()];
        route.extend(path.iter().rev());
        route.push(g.target().unwrap());
        route
    }

    fn solve(g: &mut Grid) -> (Outcome, Vec<SearchEvent>) {
        let mut events = Vec::new();
        let mut search = Search::new(g, &mut events).unwrap();
        let outcome = search.run(g, &mut events).unwrap();
        (outcome, events)
    }

    /// Reference Dijkstra over the same 8-connected octile edges.
    fn dijkstra_cost(g: &Grid) -> Option<i32> {
        let start = g.start()?;
        let target = g.target()?;
        let mut dist = vec![i32::MAX; g.len()];
        let mut heap = BinaryHeap::new();
        dist[g.idx(start)?] = 0;
        heap.push(Reverse((0, g.idx(start)?)));
        while let Some(Reverse((d, i))) = heap.pop() {
            if d > dist[i] {
                continue;
            }
            let p = g.point(i);
            if p == target {
                return Some(d);
            }
            for n in p.neighbors_8() {
                let Some(c) = g.cell(n) else { continue };
                if c.is_barrier() {
                    continue;
                }
                let ni = g.idx(n)?;
                let nd = d + octile(p, n);
                if nd < dist[ni] {
                    dist[ni] = nd;
                    heap.push(Reverse((nd, ni)));
                }
            }
        }
        None
    }

    #[test]
    fn straight_line() {
        let mut g = grid_with(10, (0, 0), (5, 0));
        let (outcome, events) = solve(&mut g);
        let Outcome::Found { path, cost } = outcome else {
            panic!("expected a path");
        };
        assert_eq!(cost, 50);
        assert_eq!(
            path,
            vec![
                Point::new(4, 0),
                Point::new(3, 0),
                Point::new(2, 0),
                Point::new(1, 0)
            ]
        );
        assert_eq!(walk_cost(&full_route(&g, &path)), cost);
        assert_eq!(
            events.last(),
            Some(&SearchEvent::PathFound {
                path: path.clone(),
                cost
            })
        );
    }

    #[test]
    fn diagonal() {
        let mut g = grid_with(10, (0, 0), (3, 3));
        let (outcome, _) = solve(&mut g);
        let Outcome::Found { path, cost } = outcome else {
            panic!("expected a path");
        };
        assert_eq!(cost, 42);
        assert_eq!(path, vec![Point::new(2, 2), Point::new(1, 1)]);
        assert!(path.iter().all(|p| p.x == p.y));
    }

    #[test]
    fn adjacent_endpoints() {
        let mut g = grid_with(6, (2, 2), (3, 3));
        let (outcome, _) = solve(&mut g);
        assert_eq!(
            outcome,
            Outcome::Found {
                path: vec![],
                cost: 14
            }
        );
    }

    #[test]
    fn target_is_never_closed() {
        let mut g = grid_with(10, (0, 0), (5, 0));
        solve(&mut g);
        assert_eq!(
            g.cell(Point::new(5, 0)).unwrap().state(),
            SearchState::Open
        );
        assert_eq!(g.cell(Point::new(0, 0)).unwrap().state(), SearchState::Closed);
    }

    #[test]
    fn walled_off_target() {
        let mut g = grid_with(10, (0, 0), (7, 7));
        for n in Point::new(7, 7).neighbors_8() {
            g.set_role(n, Role::Barrier).unwrap();
        }
        let (outcome, events) = solve(&mut g);
        assert_eq!(outcome, Outcome::NoPath);
        assert_eq!(events.last(), Some(&SearchEvent::NoPathFound));
        assert_eq!(
            g.cell(Point::new(7, 7)).unwrap().state(),
            SearchState::Unvisited
        );
        assert!(events.iter().all(|e| match e {
            SearchEvent::CellOpened(v) => v.pos != Point::new(7, 7),
            _ => true,
        }));
        // Every reachable cell ended up expanded.
        let reachable = g.len() - 8 - 1;
        assert_eq!(
            g.cells().iter().filter(|c| c.is_closed()).count(),
            reachable
        );
    }

    #[test]
    fn detour_around_wall() {
        // Vertical wall at x=3 from y=0..=6 on an 8×8 grid.
        let mut g = grid_with(8, (0, 0), (6, 0));
        for y in 0..=6 {
            g.set_role(Point::new(3, y), Role::Barrier).unwrap();
        }
        let expected = dijkstra_cost(&g).unwrap();
        let (outcome, _) = solve(&mut g);
        let Outcome::Found { path, cost } = outcome else {
            panic!("expected a path");
        };
        assert_eq!(cost, expected);
        assert!(path.contains(&Point::new(3, 7)));
        assert_eq!(walk_cost(&full_route(&g, &path)), cost);
    }

    #[test]
    fn start_preconditions() {
        let mut events = Vec::new();

        let mut g = Grid::new(8).unwrap();
        assert_eq!(
            Search::new(&mut g, &mut events).err(),
            Some(Error::PreconditionUnmet(Precondition::MissingStart))
        );
        g.set_role(Point::new(1, 1), Role::Start).unwrap();
        assert_eq!(
            Search::new(&mut g, &mut events).err(),
            Some(Error::PreconditionUnmet(Precondition::MissingTarget))
        );
        g.set_role(Point::new(6, 6), Role::Target).unwrap();

        solve(&mut g);
        assert_eq!(
            Search::new(&mut g, &mut events).err(),
            Some(Error::PreconditionUnmet(Precondition::GridNotReset))
        );
        g.clear_search();
        assert!(Search::new(&mut g, &mut events).is_ok());
    }

    #[test]
    fn open_set_tracks_open_cells() {
        let mut g = grid_with(12, (1, 1), (10, 9));
        for y in 2..10 {
            g.set_role(Point::new(6, y), Role::Barrier).unwrap();
        }
        let mut events = Vec::new();
        let mut search = Search::new(&mut g, &mut events).unwrap();
        loop {
            assert_eq!(search.open_len(), g.open_count());
            let slots = search.open.as_slice();
            for (i, a) in slots.iter().enumerate() {
                assert!(!slots[i + 1..].contains(a));
            }
            if let Step::Done(_) = search.step(&mut g, &mut events).unwrap() {
                break;
            }
        }
    }

    #[test]
    fn frozen_open_set_drains_in_key_order() {
        let mut g = grid_with(15, (0, 7), (14, 7));
        for y in 3..12 {
            g.set_role(Point::new(7, y), Role::Barrier).unwrap();
        }
        let mut events = Vec::new();
        let mut search = Search::new(&mut g, &mut events).unwrap();
        for _ in 0..20 {
            search.step(&mut g, &mut events).unwrap();
        }
        let mut cells = g.cells().to_vec();
        let mut open = search.open.clone();
        let mut keys = Vec::new();
        while let Some(h) = open.extract_min(&mut cells) {
            keys.push((cells[h].f(), cells[h].h()));
        }
        assert!(!keys.is_empty());
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn relaxation_improves_open_cells() {
        // A barrier forces Start's first frontier to be re-reached more
        // cheaply; every improvement must arrive as a CellRelaxed event with
        // a strictly lower g.
        let mut g = grid_with(10, (0, 5), (9, 5));
        for y in 3..=7 {
            g.set_role(Point::new(4, y), Role::Barrier).unwrap();
        }
        let (_, events) = solve(&mut g);
        let mut last_g = std::collections::HashMap::new();
        for e in &events {
            match e {
                SearchEvent::CellOpened(v) => {
                    last_g.insert(v.pos, v.g);
                }
                SearchEvent::CellRelaxed(v) => {
                    let prev = last_g.insert(v.pos, v.g).unwrap();
                    assert!(v.g < prev);
                    assert_eq!(v.f, v.g + v.h);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn matches_reference_on_random_grids() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..60 {
            let size = rng.random_range(6..=20);
            let mut g = Grid::new(size).unwrap();
            for p in g.bounds() {
                if rng.random_range(0..100) < 28 {
                    g.set_role(p, Role::Barrier).unwrap();
                }
            }
            let s = Point::new(rng.random_range(0..size), rng.random_range(0..size));
            let mut t = Point::new(rng.random_range(0..size), rng.random_range(0..size));
            if t == s {
                t = Point::new((s.x + 1) % size, s.y);
            }
            g.set_role(s, Role::Start).unwrap();
            g.set_role(t, Role::Target).unwrap();

            let expected = dijkstra_cost(&g);
            let (outcome, _) = solve(&mut g);
            match (outcome, expected) {
                (Outcome::Found { path, cost }, Some(want)) => {
                    assert_eq!(cost, want);
                    let route = full_route(&g, &path);
                    assert!(route.windows(2).all(|w| w[0].is_adjacent(w[1])));
                    assert_eq!(walk_cost(&route), cost);
                }
                (Outcome::NoPath, None) => {}
                (got, want) => panic!("engine {got:?} vs reference {want:?}"),
            }
        }
    }

    #[test]
    fn step_after_done_repeats_outcome() {
        let mut g = grid_with(6, (0, 0), (2, 0));
        let mut events = Vec::new();
        let mut search = Search::new(&mut g, &mut events).unwrap();
        let outcome = search.run(&mut g, &mut events).unwrap();
        let n = events.len();
        assert_eq!(
            search.step(&mut g, &mut events).unwrap(),
            Step::Done(outcome)
        );
        assert_eq!(events.len(), n);
        assert!(search.stats().expanded >= 1);
    }

    #[test]
    fn silent_run_matches_observed_run() {
        let mut observed = grid_with(10, (0, 9), (9, 0));
        let mut silent = observed.clone();
        let (expected, _) = solve(&mut observed);

        let mut search = Search::new(&mut silent, &mut NullSink).unwrap();
        let outcome = search.run(&mut silent, &mut NullSink).unwrap();
        assert_eq!(outcome, expected);
        assert_eq!(silent, observed);
    }

    // -----------------------------------------------------------------------
    // Interactive mode
    // -----------------------------------------------------------------------

    #[test]
    fn interactive_walk_to_target() {
        let mut g = grid_with(10, (0, 0), (2, 0));
        let mut events = Vec::new();
        let mut search = Search::new(&mut g, &mut events).unwrap();
        assert_eq!(
            search.begin_interactive(&mut g, &mut events).unwrap(),
            Step::Continue
        );
        assert_eq!(search.open_len(), 3);
        assert_eq!(search.open_len(), g.open_count());

        // Target is not open yet.
        assert_eq!(
            search.advance(&mut g, Point::new(2, 0), &mut events).unwrap(),
            Step::Ignored
        );
        assert_eq!(
            search.advance(&mut g, Point::new(1, 0), &mut events).unwrap(),
            Step::Continue
        );
        assert_eq!(search.open_len(), g.open_count());

        let step = search.advance(&mut g, Point::new(2, 0), &mut events).unwrap();
        assert_eq!(
            step,
            Step::Done(Outcome::Found {
                path: vec![Point::new(1, 0)],
                cost: 20
            })
        );
        // Further input is ignored once finished.
        assert_eq!(
            search.advance(&mut g, Point::new(1, 1), &mut events).unwrap(),
            Step::Ignored
        );
    }

    #[test]
    fn interactive_advance_on_closed_cell_is_noop() {
        let mut g = grid_with(10, (4, 4), (8, 8));
        let mut events = Vec::new();
        let mut search = Search::new(&mut g, &mut events).unwrap();
        search.begin_interactive(&mut g, &mut events).unwrap();
        search.advance(&mut g, Point::new(5, 5), &mut events).unwrap();

        let before = g.clone();
        let n = events.len();
        for p in [Point::new(4, 4), Point::new(5, 5), Point::new(0, 0), Point::new(-1, 3)] {
            assert_eq!(search.advance(&mut g, p, &mut events).unwrap(), Step::Ignored);
        }
        assert_eq!(g, before);
        assert_eq!(events.len(), n);
    }

    #[test]
    fn interactive_exhausts_open_set() {
        // Start boxed in a corner with a single free neighbor that leads
        // nowhere.
        let mut g = grid_with(8, (0, 0), (7, 7));
        for p in [(2, 0), (2, 1), (0, 1), (1, 2), (0, 2), (2, 2)] {
            g.set_role(Point::new(p.0, p.1), Role::Barrier).unwrap();
        }
        let mut events = Vec::new();
        let mut search = Search::new(&mut g, &mut events).unwrap();
        search.begin_interactive(&mut g, &mut events).unwrap();
        // (1,0) and (1,1) are open.
        search.advance(&mut g, Point::new(1, 0), &mut events).unwrap();
        let step = search.advance(&mut g, Point::new(1, 1), &mut events).unwrap();
        assert_eq!(step, Step::Done(Outcome::NoPath));
        assert_eq!(events.last(), Some(&SearchEvent::NoPathFound));
    }

    #[test]
    fn interactive_user_order_still_finds_a_path() {
        // Expanding in plain scan order instead of by cost still yields a
        // valid, if not necessarily optimal, route.
        let mut g = grid_with(9, (0, 4), (8, 4));
        for y in 1..8 {
            g.set_role(Point::new(4, y), Role::Barrier).unwrap();
        }
        let mut events = Vec::new();
        let mut search = Search::new(&mut g, &mut events).unwrap();
        search.begin_interactive(&mut g, &mut events).unwrap();
        let target = g.target().unwrap();
        let outcome = loop {
            let next = if g.cell(target).unwrap().is_open() {
                target
            } else {
                g.cells().iter().find(|c| c.is_open()).unwrap().pos()
            };
            if let Step::Done(o) = search.advance(&mut g, next, &mut events).unwrap() {
                break o;
            }
        };
        let Outcome::Found { path, cost } = outcome else {
            panic!("expected a path");
        };
        assert_eq!(walk_cost(&full_route(&g, &path)), cost);
    }
}
