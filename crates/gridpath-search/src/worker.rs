//! [`Searcher`] runs a [`Search`] on a dedicated worker thread.
//!
//! The caller's thread owns the `Searcher` and may read the shared grid at
//! any time. While a search is active only the worker mutates cells; the
//! caller can merely send an advance (interactive mode) or cancel. Advance
//! requests travel over a single-slot channel the worker blocks on, and the
//! same channel wakes the worker for cancellation.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gridpath_core::{Error, Grid, Point, Precondition, Role};

use crate::config::{Mode, SearchConfig};
use crate::context::Context;
use crate::engine::{Search, Step};
use crate::event::{Outcome, SearchEvent};
use crate::traits::EventSink;

/// Messages from the caller to the worker.
#[derive(Copy, Clone, Debug)]
enum Signal {
    /// Expand the open cell at this position.
    Advance(Point),
    /// Re-check the cancellation flag.
    Wake,
}

struct Worker {
    ctx: Context,
    signals: SyncSender<Signal>,
    handle: JoinHandle<()>,
    mode: Mode,
}

/// Owner of a grid and of at most one in-flight search over it.
pub struct Searcher {
    grid: Arc<Mutex<Grid>>,
    events: Sender<SearchEvent>,
    worker: Option<Worker>,
}

fn lock(grid: &Mutex<Grid>) -> MutexGuard<'_, Grid> {
    // A panicking worker leaves cells consistent per step; keep going.
    grid.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Searcher {
    /// Create a searcher over a blank `size`×`size` grid. Events of every
    /// search started through it arrive on the returned receiver.
    pub fn new(size: i32) -> Result<(Self, Receiver<SearchEvent>), Error> {
        let grid = Grid::new(size)?;
        let (tx, rx) = mpsc::channel();
        Ok((
            Self {
                grid: Arc::new(Mutex::new(grid)),
                events: tx,
                worker: None,
            },
            rx,
        ))
    }

    /// Whether a worker is still running.
    pub fn is_active(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Run `f` against the current grid state, e.g. to render it.
    pub fn with_grid<R>(&self, f: impl FnOnce(&Grid) -> R) -> R {
        f(&lock(&self.grid))
    }

    /// A copy of the current grid.
    pub fn snapshot(&self) -> Grid {
        lock(&self.grid).clone()
    }

    /// Replace the grid with a blank one of side `size`, cancelling any
    /// search first. An invalid size leaves everything untouched.
    pub fn configure(&mut self, size: i32) -> Result<(), Error> {
        let fresh = Grid::new(size)?;
        self.cancel();
        *lock(&self.grid) = fresh;
        Ok(())
    }

    /// Grow or shrink the grid by `delta` per side. Steps leaving the size
    /// range are ignored and do not cancel anything.
    pub fn resize_by(&mut self, delta: i32) -> bool {
        let size = lock(&self.grid).size() + delta;
        if delta == 0 || Grid::new(size).is_err() {
            return false;
        }
        self.cancel();
        lock(&self.grid).resize_by(delta)
    }

    /// Cancel any search and blank the grid.
    pub fn reset(&mut self) {
        self.cancel();
        lock(&self.grid).reset();
    }

    /// Cancel any search and wipe its traces, keeping the layout.
    pub fn clear_search(&mut self) {
        self.cancel();
        lock(&self.grid).clear_search();
    }

    /// Assign `role` at `p`. Refused while a search is active.
    pub fn place_role(&mut self, p: Point, role: Role) -> Result<(), Error> {
        if self.is_active() {
            return Err(Precondition::SearchActive.into());
        }
        lock(&self.grid).set_role(p, role)
    }

    /// Validate the grid, open Start and hand the search to a new worker.
    pub fn start_search(&mut self, config: SearchConfig) -> Result<(), Error> {
        if self.is_active() {
            return Err(Precondition::SearchActive.into());
        }
        self.reap();

        let mut events = self.events.clone();
        let search = Search::new(&mut lock(&self.grid), &mut events)?;

        let ctx = Context::new();
        let (signals, rx) = mpsc::sync_channel(1);
        let grid = Arc::clone(&self.grid);
        let worker_ctx = ctx.clone();
        let handle = thread::spawn(move || {
            run_worker(grid, search, config, worker_ctx, rx, events);
        });

        log::debug!("search started: {config:?}");
        self.worker = Some(Worker {
            ctx,
            signals,
            handle,
            mode: config.mode,
        });
        Ok(())
    }

    /// Ask an interactive search to expand the cell at `p`.
    ///
    /// Returns whether the request was handed to the worker. Requests are
    /// dropped when no interactive search is running or when the previous
    /// one has not been picked up yet; the worker itself ignores positions
    /// that are not Open.
    pub fn advance(&self, p: Point) -> bool {
        let Some(w) = self.worker.as_ref() else {
            return false;
        };
        if w.mode != Mode::Interactive {
            return false;
        }
        match w.signals.try_send(Signal::Advance(p)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("advance to {p} dropped: previous request pending");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Stop the running search, if any, and wait for its worker to exit.
    ///
    /// On return no further cell is mutated and no outcome is emitted.
    pub fn cancel(&mut self) {
        let Some(w) = self.worker.take() else {
            return;
        };
        w.ctx.cancel();
        // A full slot already wakes the worker.
        w.signals.try_send(Signal::Wake).ok();
        if w.handle.join().is_err() {
            log::error!("search worker panicked");
        }
    }

    /// Block until the running search terminates on its own.
    pub fn wait(&mut self) {
        if let Some(w) = self.worker.take() {
            if w.handle.join().is_err() {
                log::error!("search worker panicked");
            }
        }
    }

    /// Join a worker that already finished.
    fn reap(&mut self) {
        if self.worker.as_ref().is_some_and(|w| w.handle.is_finished()) {
            self.wait();
        }
    }
}

impl Drop for Searcher {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run_worker(
    grid: Arc<Mutex<Grid>>,
    mut search: Search,
    config: SearchConfig,
    ctx: Context,
    signals: Receiver<Signal>,
    mut events: Sender<SearchEvent>,
) {
    let result = match config.mode {
        Mode::Automatic => {
            let delay = config.delay();
            run_automatic(&grid, &mut search, delay, &ctx, &signals, &mut events)
        }
        Mode::Interactive => run_interactive(&grid, &mut search, &ctx, &signals, &mut events),
    };
    let stats = search.stats();
    match result {
        Ok(Some(outcome)) => log::info!(
            "search finished ({}): {} cells expanded in {:?} (without delay)",
            if outcome.is_found() { "path found" } else { "no path" },
            stats.expanded,
            stats.elapsed,
        ),
        Ok(None) => log::debug!("search cancelled after {} expansions", stats.expanded),
        Err(e) => {
            log::error!("search aborted: {e}");
            events.emit(SearchEvent::Aborted(e));
        }
    }
}

fn run_automatic<S: EventSink>(
    grid: &Mutex<Grid>,
    search: &mut Search,
    delay: Duration,
    ctx: &Context,
    signals: &Receiver<Signal>,
    sink: &mut S,
) -> Result<Option<Outcome>, Error> {
    loop {
        let step = {
            let mut g = lock(grid);
            if ctx.is_done() {
                return Ok(None);
            }
            search.step(&mut g, sink)?
        };
        if let Step::Done(outcome) = step {
            return Ok(Some(outcome));
        }
        if !pause(delay, ctx, signals) {
            return Ok(None);
        }
    }
}

/// Sleep for `delay` unless cancelled first. Returns `false` on cancellation.
fn pause(delay: Duration, ctx: &Context, signals: &Receiver<Signal>) -> bool {
    if delay.is_zero() {
        return !ctx.is_done();
    }
    let deadline = Instant::now() + delay;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return !ctx.is_done();
        }
        match signals.recv_timeout(left) {
            Ok(Signal::Wake) if ctx.is_done() => return false,
            Ok(Signal::Advance(p)) => log::trace!("advance to {p} ignored in automatic mode"),
            Ok(Signal::Wake) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return false,
        }
    }
}

fn run_interactive<S: EventSink>(
    grid: &Mutex<Grid>,
    search: &mut Search,
    ctx: &Context,
    signals: &Receiver<Signal>,
    sink: &mut S,
) -> Result<Option<Outcome>, Error> {
    if let Step::Done(outcome) = search.begin_interactive(&mut lock(grid), sink)? {
        return Ok(Some(outcome));
    }
    // A closed channel means the searcher is gone.
    while let Ok(signal) = signals.recv() {
        if ctx.is_done() {
            return Ok(None);
        }
        let Signal::Advance(p) = signal else {
            continue;
        };
        let mut g = lock(grid);
        if ctx.is_done() {
            return Ok(None);
        }
        match search.advance(&mut g, p, sink)? {
            Step::Done(outcome) => return Ok(Some(outcome)),
            Step::Ignored => log::trace!("advance to {p} ignored"),
            Step::Continue => {}
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use gridpath_core::{SearchState, Transition};

    use super::*;
    use crate::traits::NullSink;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn searcher(start: (i32, i32), target: (i32, i32)) -> (Searcher, Receiver<SearchEvent>) {
        let (mut s, rx) = Searcher::new(10).unwrap();
        s.place_role(Point::new(start.0, start.1), Role::Start).unwrap();
        s.place_role(Point::new(target.0, target.1), Role::Target).unwrap();
        (s, rx)
    }

    /// Receive events until one satisfies `done`, returning all of them.
    fn collect_until(
        rx: &Receiver<SearchEvent>,
        done: impl Fn(&SearchEvent) -> bool,
    ) -> Vec<SearchEvent> {
        let mut out = Vec::new();
        loop {
            let e = rx.recv_timeout(TIMEOUT).expect("worker went silent");
            let stop = done(&e);
            out.push(e);
            if stop {
                return out;
            }
        }
    }

    fn is_terminal(e: &SearchEvent) -> bool {
        matches!(
            e,
            SearchEvent::PathFound { .. } | SearchEvent::NoPathFound | SearchEvent::Aborted(_)
        )
    }

    fn advance_until_accepted(s: &Searcher, p: Point) {
        let deadline = Instant::now() + TIMEOUT;
        while !s.advance(p) {
            assert!(Instant::now() < deadline, "advance never accepted");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn automatic_finds_path() {
        let (mut s, rx) = searcher((0, 0), (5, 0));
        s.start_search(SearchConfig::default()).unwrap();
        let events = collect_until(&rx, is_terminal);
        assert_eq!(
            events.last(),
            Some(&SearchEvent::PathFound {
                path: vec![
                    Point::new(4, 0),
                    Point::new(3, 0),
                    Point::new(2, 0),
                    Point::new(1, 0)
                ],
                cost: 50
            })
        );
        assert!(matches!(events[0], SearchEvent::CellOpened(v) if v.pos == Point::ZERO));
        s.wait();
        assert!(!s.is_active());
        let target = s.with_grid(|g| g.cell(Point::new(5, 0)).unwrap().g());
        assert_eq!(target, 50);
    }

    #[test]
    fn automatic_with_delay_reports_no_path() {
        let (mut s, rx) = searcher((0, 0), (9, 9));
        for p in [(8, 8), (9, 8), (8, 9)] {
            s.place_role(Point::new(p.0, p.1), Role::Barrier).unwrap();
        }
        s.start_search(SearchConfig::default().with_delay_ms(1)).unwrap();
        let events = collect_until(&rx, is_terminal);
        assert_eq!(events.last(), Some(&SearchEvent::NoPathFound));
    }

    #[test]
    fn start_requires_endpoints_and_idle_grid() {
        let (mut s, _rx) = Searcher::new(8).unwrap();
        assert_eq!(
            s.start_search(SearchConfig::default()),
            Err(Error::PreconditionUnmet(Precondition::MissingStart))
        );

        let (mut s, rx) = searcher((0, 0), (9, 9));
        let interactive = SearchConfig::default().with_mode(Mode::Interactive);
        s.start_search(interactive).unwrap();
        assert_eq!(
            s.start_search(interactive),
            Err(Error::PreconditionUnmet(Precondition::SearchActive))
        );
        assert_eq!(
            s.place_role(Point::new(3, 3), Role::Barrier),
            Err(Error::PreconditionUnmet(Precondition::SearchActive))
        );
        s.cancel();
        drop(rx);

        // The cancelled search left traces behind.
        assert_eq!(
            s.start_search(interactive),
            Err(Error::PreconditionUnmet(Precondition::GridNotReset))
        );
        s.clear_search();
        s.start_search(interactive).unwrap();
    }

    #[test]
    fn cancel_stops_slow_search() {
        let (mut s, rx) = searcher((0, 0), (9, 9));
        s.start_search(SearchConfig::default().with_delay_ms(10_000)).unwrap();
        // Wait until the first expansion happened.
        collect_until(&rx, |e| matches!(e, SearchEvent::CellClosed(_)));

        let began = Instant::now();
        s.cancel();
        assert!(began.elapsed() < TIMEOUT);
        assert!(!s.is_active());

        let before = s.snapshot();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(s.snapshot(), before);
        assert!(rx.try_iter().all(|e| !is_terminal(&e)));

        s.reset();
        assert!(s.with_grid(|g| g.is_pristine() && g.start().is_none()));
    }

    #[test]
    fn interactive_follows_advances() {
        let (mut s, rx) = searcher((0, 0), (2, 0));
        s.start_search(SearchConfig::default().with_mode(Mode::Interactive))
            .unwrap();
        // Start is expanded right away.
        collect_until(&rx, |e| {
            matches!(e, SearchEvent::CellOpened(v) if v.pos == Point::new(1, 1))
        });

        // Closed cell: no events, no state change.
        let before = s.snapshot();
        advance_until_accepted(&s, Point::new(0, 0));
        advance_until_accepted(&s, Point::new(1, 0));
        let events = collect_until(&rx, |e| {
            matches!(e, SearchEvent::CellOpened(v) if v.pos == Point::new(2, 0))
        });
        assert!(matches!(events[0], SearchEvent::CellClosed(v) if v.pos == Point::new(1, 0)));
        assert_eq!(
            before.cell(Point::new(1, 0)).unwrap().state(),
            SearchState::Open
        );

        advance_until_accepted(&s, Point::new(2, 0));
        let events = collect_until(&rx, is_terminal);
        assert_eq!(
            events.last(),
            Some(&SearchEvent::PathFound {
                path: vec![Point::new(1, 0)],
                cost: 20
            })
        );
        s.wait();
        assert!(!s.advance(Point::new(1, 1)));
    }

    #[test]
    fn advance_is_refused_in_automatic_mode() {
        let (mut s, rx) = searcher((0, 0), (9, 0));
        s.start_search(SearchConfig::default().with_delay_ms(10_000)).unwrap();
        assert!(!s.advance(Point::new(1, 0)));
        s.cancel();
        drop(rx);
    }

    #[test]
    fn configure_cancels_and_validates() {
        let (mut s, _rx) = searcher((0, 0), (9, 9));
        s.start_search(SearchConfig::default().with_mode(Mode::Interactive))
            .unwrap();
        assert_eq!(s.configure(41), Err(Error::SizeOutOfRange { size: 41 }));
        assert!(s.is_active());

        s.configure(6).unwrap();
        assert!(!s.is_active());
        assert_eq!(s.with_grid(Grid::size), 6);

        assert!(s.resize_by(2));
        assert_eq!(s.with_grid(Grid::size), 8);
        assert!(!s.resize_by(-4));
        assert_eq!(s.with_grid(Grid::size), 8);
    }

    #[test]
    fn engine_violation_is_reported_as_aborted() {
        let mut grid = Grid::new(6).unwrap();
        grid.set_role(Point::new(0, 0), Role::Start).unwrap();
        grid.set_role(Point::new(5, 5), Role::Target).unwrap();
        let search = Search::new(&mut grid, &mut NullSink).unwrap();
        // The opened Start is reset behind the engine's back.
        grid.clear_search();

        let (_signals, rx) = mpsc::sync_channel(1);
        let (tx, events) = mpsc::channel();
        run_worker(
            Arc::new(Mutex::new(grid)),
            search,
            SearchConfig::default(),
            Context::new(),
            rx,
            tx,
        );

        assert_eq!(
            events.try_iter().collect::<Vec<_>>(),
            vec![SearchEvent::Aborted(Error::InvalidStateTransition {
                pos: Point::new(0, 0),
                from: SearchState::Unvisited,
                op: Transition::Close,
            })]
        );
    }
}
