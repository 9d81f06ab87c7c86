//! Drawing the grid into a terminal with crossterm.

use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use gridpath_core::{Grid, Point, Role, SearchState, Tag};
use gridpath_search::DIAGONAL_COST;

/// Terminal rows above the grid (status and help lines).
pub const HEADER_ROWS: u16 = 2;

const WHITE: Color = Color::Rgb {
    r: 0xff,
    g: 0xff,
    b: 0xff,
};
const INK: Color = Color::Rgb {
    r: 0x16,
    g: 0x16,
    b: 0x16,
};
const PATH: Color = Color::Rgb {
    r: 0x76,
    g: 0x62,
    b: 0xc2,
};

const HELP: &str =
    "[s]tart [t]arget [b]arrier [e]rase  enter:run [a]uto [i]nteractive [c]lear [r]eset +/-:size [v]alues [q]uit";

/// Background colour of a cell class.
pub fn tag_color(tag: Tag, only_path: bool) -> Color {
    match tag {
        Tag::Empty => WHITE,
        Tag::Start => Color::Rgb {
            r: 0x29,
            g: 0x9b,
            b: 0xc3,
        },
        Tag::Target => Color::Rgb {
            r: 0xc3,
            g: 0x29,
            b: 0xc0,
        },
        Tag::Barrier => Color::Black,
        Tag::Frontier | Tag::Explored if only_path => WHITE,
        Tag::Frontier => Color::Rgb {
            r: 0x6c,
            g: 0xbf,
            b: 0x03,
        },
        Tag::Explored => Color::Rgb {
            r: 0xbf,
            g: 0x13,
            b: 0x06,
        },
    }
}

/// Which costs a touched cell shows inside its box.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Costs {
    #[default]
    Hidden,
    /// f alone.
    Total,
    /// g and h as `g/h`.
    Split,
}

impl Costs {
    /// The option after this one, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Self::Hidden => Self::Total,
            Self::Total => Self::Split,
            Self::Split => Self::Hidden,
        }
    }
}

/// Upper bound of g on a `size`-sided grid: a route through every cell, all
/// of it diagonal.
fn max_g(size: i32) -> i32 {
    DIAGONAL_COST * (size * size - 1)
}

/// Upper bound of the octile heuristic on a `size`-sided grid.
fn max_h(size: i32) -> i32 {
    DIAGONAL_COST * (size - 1)
}

fn digits(n: i32) -> usize {
    n.max(1).ilog10() as usize + 1
}

/// Everything drawn besides the grid itself.
#[derive(Clone, Debug, Default)]
pub struct View {
    pub costs: Costs,
    pub only_path: bool,
    /// Intermediate cells of the found route.
    pub path: Vec<Point>,
    /// Large message shown under the grid, e.g. "No Path".
    pub banner: Option<String>,
    pub status: String,
}

impl View {
    /// Terminal columns per grid cell on a `size`-sided grid. Wide enough
    /// for the largest cost any cell of that grid can carry.
    pub fn cell_width(&self, size: i32) -> u16 {
        let width = match self.costs {
            Costs::Hidden => 2,
            Costs::Total => digits(max_g(size) + max_h(size)) + 1,
            Costs::Split => digits(max_g(size)) + 1 + digits(max_h(size)) + 1,
        };
        width as u16
    }

    /// Translate a terminal position into a grid position.
    pub fn screen_to_grid(&self, column: u16, row: u16, grid: &Grid) -> Option<Point> {
        let row = row.checked_sub(HEADER_ROWS)?;
        let p = Point::new(
            i32::from(column / self.cell_width(grid.size())),
            i32::from(row),
        );
        grid.contains(p).then_some(p)
    }

    /// Label drawn inside a cell, exactly `cell_width` columns wide. Costs
    /// appear once the search touched the cell.
    fn label(&self, grid: &Grid, p: Point) -> String {
        let size = grid.size();
        let width = usize::from(self.cell_width(size));
        let Some(cell) = grid.cell(p) else {
            return " ".repeat(width);
        };
        let touched = cell.state() != SearchState::Unvisited && cell.role() != Role::Start;
        if !touched || self.only_path {
            return " ".repeat(width);
        }
        match self.costs {
            Costs::Hidden => " ".repeat(width),
            Costs::Total => format!("{:>w$} ", cell.f(), w = width - 1),
            Costs::Split => format!(
                "{:>gw$}/{:<hw$} ",
                cell.g(),
                cell.h(),
                gw = digits(max_g(size)),
                hw = digits(max_h(size)),
            ),
        }
    }
}

/// Redraw the screen, overwriting the previous frame in place.
pub fn draw(out: &mut impl Write, grid: &Grid, view: &View) -> io::Result<()> {
    queue!(
        out,
        cursor::MoveTo(0, 0),
        Print(&view.status),
        Clear(ClearType::UntilNewLine),
        cursor::MoveTo(0, 1),
        Print(HELP),
        Clear(ClearType::UntilNewLine),
    )?;

    for y in 0..grid.size() {
        queue!(out, cursor::MoveTo(0, HEADER_ROWS + y as u16))?;
        for x in 0..grid.size() {
            let p = Point::new(x, y);
            let Some(cell) = grid.cell(p) else { continue };
            let bg = if view.path.contains(&p) {
                PATH
            } else {
                tag_color(cell.tag(), view.only_path)
            };
            queue!(
                out,
                SetBackgroundColor(bg),
                SetForegroundColor(INK),
                Print(view.label(grid, p)),
            )?;
        }
        queue!(out, ResetColor, Clear(ClearType::UntilNewLine))?;
    }
    // Rows left over from a larger grid or an old banner.
    queue!(
        out,
        cursor::MoveTo(0, HEADER_ROWS + grid.size() as u16),
        Clear(ClearType::FromCursorDown),
    )?;

    if let Some(banner) = &view.banner {
        queue!(
            out,
            cursor::MoveTo(0, HEADER_ROWS + grid.size() as u16 + 1),
            Print(banner),
        )?;
    }
    out.flush()
}
