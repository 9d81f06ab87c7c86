use std::io;

use crossterm::{cursor, event, execute, terminal};

/// Raw-mode alternate screen, restored when dropped.
pub struct Terminal {
    mouse_enabled: bool,
}

impl Terminal {
    pub fn init(mouse_enabled: bool) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let term = Self { mouse_enabled };
        let mut stdout = io::stdout();
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All)
        )?;
        if mouse_enabled {
            execute!(stdout, event::EnableMouseCapture)?;
        }
        Ok(term)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        if self.mouse_enabled {
            let _ = execute!(stdout, event::DisableMouseCapture);
        }
        let _ = execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
