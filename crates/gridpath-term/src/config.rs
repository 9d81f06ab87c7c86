//! Command-line configuration of the terminal front end.

use std::fmt;

use gridpath_core::{GRID_SIZE_DEFAULT, GRID_SIZE_MAX, GRID_SIZE_MIN};
use gridpath_search::{Mode, SearchConfig};

use crate::render::Costs;

pub const USAGE: &str = "\
usage: gridpath [options]
  --size N         grid side length (6-40, default 10)
  --delay MS       pause between automatic steps in milliseconds (default 50)
  --interactive    expand cells by clicking them instead of automatically
  --barriers PCT   scatter random barriers over PCT percent of the grid
  --seed N         seed for --barriers
  --costs          show f costs inside explored cells
  --split-costs    show g/h costs inside explored cells
  --only-path      hide explored cells and run without delay
  --help           print this message";

/// Settings of one terminal session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermConfig {
    pub size: i32,
    pub search: SearchConfig,
    /// Percentage of cells turned into barriers at startup.
    pub barrier_density: u32,
    pub seed: Option<u64>,
    pub costs: Costs,
    pub only_path: bool,
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            size: GRID_SIZE_DEFAULT,
            search: SearchConfig::default().with_delay_ms(50),
            barrier_density: 0,
            seed: None,
            costs: Costs::Hidden,
            only_path: false,
        }
    }
}

/// A command line that could not be understood.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgError {
    /// `--help` was given.
    Help,
    Unknown(String),
    MissingValue(&'static str),
    BadValue { flag: &'static str, value: String },
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => f.write_str(USAGE),
            Self::Unknown(arg) => write!(f, "unknown argument \u{201c}{arg}\u{201d}\n{USAGE}"),
            Self::MissingValue(flag) => write!(f, "{flag} needs a value"),
            Self::BadValue { flag, value } => write!(f, "invalid value for {flag}: {value}"),
        }
    }
}

impl std::error::Error for ArgError {}

impl TermConfig {
    /// Parse arguments, excluding the program name.
    pub fn from_args<I>(args: I) -> Result<Self, ArgError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cfg = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--size" => {
                    let size: i32 = value(&mut args, "--size")?;
                    if !(GRID_SIZE_MIN..=GRID_SIZE_MAX).contains(&size) {
                        return Err(ArgError::BadValue {
                            flag: "--size",
                            value: size.to_string(),
                        });
                    }
                    cfg.size = size;
                }
                "--delay" => cfg.search.delay_ms = value(&mut args, "--delay")?,
                "--interactive" => cfg.search.mode = Mode::Interactive,
                "--barriers" => {
                    let pct: u32 = value(&mut args, "--barriers")?;
                    if pct > 100 {
                        return Err(ArgError::BadValue {
                            flag: "--barriers",
                            value: pct.to_string(),
                        });
                    }
                    cfg.barrier_density = pct;
                }
                "--seed" => cfg.seed = Some(value(&mut args, "--seed")?),
                "--costs" => cfg.costs = Costs::Total,
                "--split-costs" => cfg.costs = Costs::Split,
                "--only-path" => cfg.only_path = true,
                "--help" | "-h" => return Err(ArgError::Help),
                _ => return Err(ArgError::Unknown(arg)),
            }
        }
        if cfg.only_path {
            cfg.search.delay_ms = 0;
        }
        Ok(cfg)
    }
}

fn value<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgError> {
    let raw = args.next().ok_or(ArgError::MissingValue(flag))?;
    raw.parse().map_err(|_| ArgError::BadValue { flag, value: raw })
}
