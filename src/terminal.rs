//! Terminal abstraction using crossterm

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{self, ClearType},
};

use codelines::Result;

/// Input events surfaced to the pager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Key(KeyEvent),
    /// The terminal changed size; the layout must be redrawn
    Resize,
}

/// Raw-mode alternate screen, restored on drop
pub struct Terminal {
    /// Terminal width in columns
    cols: u16,
    /// Terminal height in rows
    rows: u16,
}

impl Terminal {
    /// Enter raw mode and the alternate screen
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let (cols, rows) = terminal::size()?;
        // Long lines are clipped at the right edge instead of wrapping
        execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            terminal::DisableLineWrap,
            cursor::Hide
        )?;
        Ok(Self { cols, rows })
    }

    /// Get terminal width
    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Get terminal height
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Clear the entire screen
    pub fn clear_screen(&mut self) -> Result<()> {
        queue!(io::stdout(), terminal::Clear(ClearType::All))?;
        Ok(())
    }

    /// Clear from cursor to end of line
    pub fn clear_to_eol(&mut self) -> Result<()> {
        queue!(io::stdout(), terminal::Clear(ClearType::UntilNewLine))?;
        Ok(())
    }

    /// Move cursor to position (0-indexed)
    pub fn move_cursor(&mut self, row: u16, col: u16) -> Result<()> {
        queue!(io::stdout(), cursor::MoveTo(col, row))?;
        Ok(())
    }

    /// Write a string at current cursor position
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        queue!(io::stdout(), Print(s))?;
        Ok(())
    }

    /// Flush output buffer to terminal
    pub fn flush(&mut self) -> Result<()> {
        io::stdout().flush()?;
        Ok(())
    }

    /// Wait up to `timeout` for input the pager reacts to.
    ///
    /// Resizes update the stored size before they are reported. Timeouts
    /// and other events give None so the caller can keep polling.
    pub fn poll_input(&mut self, timeout: Duration) -> Result<Option<Input>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(self.translate(event::read()?))
    }

    fn translate(&mut self, event: Event) -> Option<Input> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Some(Input::Key(key)),
            Event::Resize(cols, rows) => {
                self.cols = cols;
                self.rows = rows;
                Some(Input::Resize)
            }
            _ => None,
        }
    }

    /// Set reverse video mode
    pub fn set_reverse(&mut self, enabled: bool) -> Result<()> {
        let attr = if enabled { Attribute::Reverse } else { Attribute::NoReverse };
        queue!(io::stdout(), SetAttribute(attr))?;
        Ok(())
    }

    /// Set dim/faint mode (for line numbers)
    pub fn set_dim(&mut self, enabled: bool) -> Result<()> {
        let attr = if enabled { Attribute::Dim } else { Attribute::NormalIntensity };
        queue!(io::stdout(), SetAttribute(attr))?;
        Ok(())
    }

    /// Reset all attributes
    pub fn reset_attributes(&mut self) -> Result<()> {
        queue!(io::stdout(), SetAttribute(Attribute::Reset))?;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        // Restore terminal state
        let _ = execute!(
            io::stdout(),
            cursor::Show,
            terminal::EnableLineWrap,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_resize_is_reported_and_recorded() {
        // Built directly so the test does not touch the real terminal
        let mut term = Terminal { cols: 80, rows: 24 };
        assert_eq!(term.translate(Event::Resize(100, 40)), Some(Input::Resize));
        assert_eq!((term.cols(), term.rows()), (100, 40));

        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(term.translate(Event::Key(key)), Some(Input::Key(key)));
        assert_eq!(term.translate(Event::FocusGained), None);
        std::mem::forget(term);
    }
}
