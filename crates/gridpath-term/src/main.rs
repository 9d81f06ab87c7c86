use std::io;
use std::process;

use gridpath_term::{App, ArgError, TermConfig, Terminal, USAGE};

fn main() {
    env_logger::init();

    let config = match TermConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(ArgError::Help) => {
            println!("{USAGE}");
            return;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    log::debug!("starting with {config:?}");

    if let Err(e) = run(config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(config: TermConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(config)?;
    let _term = Terminal::init(true)?;
    app.run(&mut io::stdout().lock())?;
    Ok(())
}
