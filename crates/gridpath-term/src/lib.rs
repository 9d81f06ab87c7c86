//! Terminal front end for the gridpath A* visualizer.
//!
//! Draws a [`gridpath_core::Grid`] with crossterm, turns keys and mouse
//! clicks into edits and search commands, and follows a running
//! [`gridpath_search::Searcher`] through its event channel.

mod app;
mod config;
mod render;
mod terminal;

pub use app::{App, Command, command_of, scatter_barriers};
pub use config::{ArgError, TermConfig, USAGE};
pub use render::{Costs, HEADER_ROWS, View, draw, tag_color};
pub use terminal::Terminal;
