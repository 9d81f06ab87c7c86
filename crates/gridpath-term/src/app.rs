//! The interactive session: input handling, search control and redraws.

use std::io::{self, Write};
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use rand::{Rng, RngExt, SeedableRng};

use gridpath_core::{Error, Point, RESIZE_STEP, Role};
use gridpath_search::{Mode, SearchEvent, Searcher};

use crate::config::TermConfig;
use crate::render::{self, View};

const FRAME: Duration = Duration::from_millis(16);

/// A user request, decoded from a terminal event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Select the role placed by subsequent clicks.
    Tool(Role),
    /// Start a search in the configured mode.
    Search,
    Run(Mode),
    Reset,
    Clear,
    Resize(i32),
    ToggleCosts,
    Click { column: u16, row: u16 },
    Redraw,
    Quit,
}

/// Decode a crossterm event. Unbound keys and mouse motion yield `None`.
pub fn command_of(ev: &Event) -> Option<Command> {
    match *ev {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) => key_command(code, modifiers),
        Event::Mouse(MouseEvent {
            kind, column, row, ..
        }) => match kind {
            MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left) => {
                Some(Command::Click { column, row })
            }
            MouseEventKind::ScrollUp => Some(Command::Resize(RESIZE_STEP)),
            MouseEventKind::ScrollDown => Some(Command::Resize(-RESIZE_STEP)),
            _ => None,
        },
        Event::Resize(..) => Some(Command::Redraw),
        _ => None,
    }
}

fn key_command(code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
    if modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(code, KeyCode::Char('c')).then_some(Command::Quit);
    }
    let cmd = match code {
        KeyCode::Char('s') => Command::Tool(Role::Start),
        KeyCode::Char('t') => Command::Tool(Role::Target),
        KeyCode::Char('b') => Command::Tool(Role::Barrier),
        KeyCode::Char('e') => Command::Tool(Role::Empty),
        KeyCode::Enter => Command::Search,
        KeyCode::Char('a') => Command::Run(Mode::Automatic),
        KeyCode::Char('i') => Command::Run(Mode::Interactive),
        KeyCode::Char('r') => Command::Reset,
        KeyCode::Char('c') => Command::Clear,
        KeyCode::Char('+' | '=') => Command::Resize(RESIZE_STEP),
        KeyCode::Char('-') => Command::Resize(-RESIZE_STEP),
        KeyCode::Char('v') => Command::ToggleCosts,
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

/// Turn roughly `density` percent of the Empty cells into barriers.
///
/// Returns how many barriers were placed.
pub fn scatter_barriers(
    searcher: &mut Searcher,
    density: u32,
    rng: &mut impl Rng,
) -> Result<usize, Error> {
    if density == 0 {
        return Ok(0);
    }
    let free: Vec<Point> = searcher.with_grid(|g| {
        g.bounds()
            .iter()
            .filter(|&p| g.cell(p).is_some_and(|c| c.role() == Role::Empty))
            .collect()
    });
    let mut placed = 0;
    for p in free {
        if rng.random_range(0..100) < density {
            searcher.place_role(p, Role::Barrier)?;
            placed += 1;
        }
    }
    Ok(placed)
}

pub struct App {
    searcher: Searcher,
    events: Receiver<SearchEvent>,
    config: TermConfig,
    view: View,
    tool: Role,
    message: String,
    dirty: bool,
}

impl App {
    pub fn new(config: TermConfig) -> Result<Self, Error> {
        let (mut searcher, events) = Searcher::new(config.size)?;
        let placed = match config.seed {
            Some(seed) => scatter_barriers(
                &mut searcher,
                config.barrier_density,
                &mut rand::rngs::StdRng::seed_from_u64(seed),
            )?,
            None => scatter_barriers(&mut searcher, config.barrier_density, &mut rand::rng())?,
        };
        if placed > 0 {
            log::debug!("scattered {placed} barriers");
        }
        let view = View {
            costs: config.costs,
            only_path: config.only_path,
            ..View::default()
        };
        Ok(Self {
            searcher,
            events,
            config,
            view,
            tool: Role::Start,
            message: String::new(),
            dirty: true,
        })
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Apply one command. Returns `false` when the session should end.
    pub fn handle(&mut self, cmd: Command) -> bool {
        self.dirty = true;
        match cmd {
            Command::Quit => return false,
            Command::Tool(role) => self.tool = role,
            Command::Search => self.run_search(self.config.search.mode),
            Command::Run(mode) => self.run_search(mode),
            Command::Reset => {
                self.searcher.reset();
                self.forget_search();
            }
            Command::Clear => {
                self.searcher.clear_search();
                self.forget_search();
            }
            Command::Resize(delta) => {
                if self.searcher.resize_by(delta) {
                    self.forget_search();
                }
            }
            Command::ToggleCosts => self.view.costs = self.view.costs.next(),
            Command::Click { column, row } => self.click(column, row),
            Command::Redraw => {}
        }
        true
    }

    fn click(&mut self, column: u16, row: u16) {
        let Some(p) = self
            .searcher
            .with_grid(|g| self.view.screen_to_grid(column, row, g))
        else {
            return;
        };
        if self.searcher.is_active() {
            // Only interactive searches accept clicks; stale ones are dropped.
            self.searcher.advance(p);
            return;
        }
        if !self.searcher.with_grid(|g| g.is_pristine()) {
            self.searcher.clear_search();
            self.forget_search();
        }
        if let Err(e) = self.searcher.place_role(p, self.tool) {
            self.message = e.to_string();
        }
    }

    fn run_search(&mut self, mode: Mode) {
        if self.searcher.is_active() {
            self.message = "a search is already running".into();
            return;
        }
        if !self.searcher.with_grid(|g| g.is_pristine()) {
            self.searcher.clear_search();
        }
        self.forget_search();
        match self.searcher.start_search(self.config.search.with_mode(mode)) {
            Ok(()) if mode == Mode::Interactive => {
                self.message = "click an open cell to expand it".into();
            }
            Ok(()) => self.message = "searching".into(),
            Err(e) => self.message = e.to_string(),
        }
    }

    /// Drop the results of the previous search and any of its queued events.
    fn forget_search(&mut self) {
        while self.events.try_recv().is_ok() {}
        self.view.path.clear();
        self.view.banner = None;
        self.message.clear();
    }

    /// Consume pending search events. Returns whether any arrived.
    pub fn drain_events(&mut self) -> bool {
        let mut any = false;
        while let Ok(ev) = self.events.try_recv() {
            any = true;
            match ev {
                SearchEvent::PathFound { path, cost } => {
                    self.view.path = path;
                    self.message = format!("path found, cost {cost}");
                }
                SearchEvent::NoPathFound => {
                    self.view.banner = Some("No Path".into());
                    self.message = "no path".into();
                }
                SearchEvent::Aborted(e) => self.message = format!("search aborted: {e}"),
                SearchEvent::CellOpened(_)
                | SearchEvent::CellClosed(_)
                | SearchEvent::CellRelaxed(_) => {}
            }
        }
        self.dirty |= any;
        any
    }

    fn status(&self) -> String {
        let size = self.searcher.with_grid(|g| g.size());
        format!(
            "{size}x{size}  tool: {:?}  {}",
            self.tool, self.message
        )
    }

    /// Take in pending search events and redraw if a command or an event
    /// changed anything since the last frame. Returns whether it drew.
    ///
    /// Every cell mutation of a search is announced by an event, so an idle
    /// interactive search costs no redraws.
    pub fn frame(&mut self, out: &mut impl Write) -> io::Result<bool> {
        self.drain_events();
        if !self.dirty {
            return Ok(false);
        }
        self.view.status = self.status();
        let grid = self.searcher.snapshot();
        render::draw(out, &grid, &self.view)?;
        self.dirty = false;
        Ok(true)
    }

    /// Drive the session until the user quits.
    pub fn run(&mut self, out: &mut impl Write) -> io::Result<()> {
        loop {
            self.frame(out)?;
            if !event::poll(FRAME)? {
                continue;
            }
            while event::poll(Duration::ZERO)? {
                let Some(cmd) = command_of(&event::read()?) else {
                    continue;
                };
                if !self.handle(cmd) {
                    return Ok(());
                }
            }
        }
    }
}
