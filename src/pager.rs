//! Interactive pager
//!
//! Shows a document's formatted lines in the alternate screen. Large
//! documents get a progressive first screen while the full build runs on a
//! worker thread; the finished cache is swapped in when it arrives.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use unicode_width::UnicodeWidthChar;

use codelines::{BackgroundBuilder, Config, Document, Result};

use crate::terminal::{Input, Terminal};

/// How long to wait for a key before checking on background work
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Pager state
pub struct Pager {
    doc: Document,
    builder: BackgroundBuilder,
    /// First line on screen
    top: usize,
    /// Show unformatted text
    raw: bool,
    show_line_numbers: bool,
    lines_per_screen: usize,
    needs_redraw: bool,
}

impl Pager {
    /// Start paging `doc`, whose cache is still empty, over `text`
    pub fn new(mut doc: Document, text: String, config: &Config) -> Self {
        let mut builder = BackgroundBuilder::new();
        let code = doc.code_mut();
        code.begin_progressive(&text);
        if !code.build_next(config.lines_per_screen) && text.len() >= config.background_threshold {
            let generation = builder.start(code, text);
            tracing::debug!(generation, "first screen ready, finishing in background");
        }
        Self {
            doc,
            builder,
            top: 0,
            raw: false,
            show_line_numbers: config.line_numbers,
            lines_per_screen: config.lines_per_screen,
            needs_redraw: true,
        }
    }

    /// Run until the user quits
    pub fn run(&mut self, terminal: &mut Terminal) -> Result<()> {
        loop {
            self.advance_build();
            if self.needs_redraw {
                self.render(terminal)?;
            }
            match terminal.poll_input(POLL_INTERVAL)? {
                Some(Input::Key(key)) => {
                    if !self.handle_key(key, terminal.rows() as usize) {
                        return Ok(());
                    }
                }
                Some(Input::Resize) => self.handle_resize(terminal.rows() as usize),
                None => {}
            }
        }
    }

    /// Pick up a finished background build, or extend a foreground one
    fn advance_build(&mut self) {
        if self.builder.is_pending() {
            if let Some(code) = self.builder.poll() {
                self.doc.replace_code(code);
                self.needs_redraw = true;
            }
        } else if !self.doc.code().is_complete() {
            self.doc.code_mut().build_next(self.lines_per_screen);
            self.needs_redraw = true;
        }
    }

    fn page_height(rows: usize) -> usize {
        rows.saturating_sub(1).max(1)
    }

    /// Handle a key press. Returns false to quit.
    fn handle_key(&mut self, key: KeyEvent, rows: usize) -> bool {
        let len = self.doc.code().len();
        let page = Self::page_height(rows);
        let last_top = len.saturating_sub(page);
        let old_top = self.top;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Enter => self.top += 1,
            KeyCode::Up | KeyCode::Char('k') => self.top = self.top.saturating_sub(1),
            KeyCode::PageDown | KeyCode::Char(' ') => self.top += page,
            KeyCode::PageUp | KeyCode::Char('b') => self.top = self.top.saturating_sub(page),
            KeyCode::Home | KeyCode::Char('g') => self.top = 0,
            KeyCode::End | KeyCode::Char('G') => self.top = last_top,
            KeyCode::Char('r') => {
                self.raw = !self.raw;
                self.needs_redraw = true;
            }
            KeyCode::Char('n') => {
                self.show_line_numbers = !self.show_line_numbers;
                self.needs_redraw = true;
            }
            _ => {}
        }

        self.top = self.top.min(last_top);
        if self.top != old_top {
            self.needs_redraw = true;
        }
        true
    }

    /// Re-clamp the scroll position for the new height and redraw
    fn handle_resize(&mut self, rows: usize) {
        let last_top = self.doc.code().len().saturating_sub(Self::page_height(rows));
        self.top = self.top.min(last_top);
        self.needs_redraw = true;
    }

    /// Calculate width needed for line numbers (including separator)
    fn line_number_width(&self) -> usize {
        if !self.show_line_numbers {
            return 0;
        }
        let digits = self.doc.code().len().to_string().len();
        digits.max(3) + 1
    }

    fn render(&mut self, terminal: &mut Terminal) -> Result<()> {
        let cols = terminal.cols() as usize;
        let rows = terminal.rows() as usize;
        let height = Self::page_height(rows);
        let lnum_width = self.line_number_width();
        let text_cols = cols.saturating_sub(lnum_width);

        terminal.clear_screen()?;
        for row in 0..height {
            let idx = self.top + row;
            terminal.move_cursor(row as u16, 0)?;
            match self.doc.code().line(idx) {
                Ok(line) => {
                    if self.show_line_numbers {
                        terminal.set_dim(true)?;
                        terminal.write_str(&format!("{:>width$} ", idx + 1, width = lnum_width - 1))?;
                        terminal.set_dim(false)?;
                    }
                    if self.raw {
                        terminal.write_str(&truncate_to_width(line.unformatted(), text_cols))?;
                    } else {
                        // Escapes cannot be cut safely; the terminal clips instead
                        terminal.write_str(line.formatted())?;
                        terminal.reset_attributes()?;
                    }
                }
                Err(_) => {
                    terminal.set_dim(true)?;
                    terminal.write_str("~")?;
                    terminal.set_dim(false)?;
                }
            }
            terminal.clear_to_eol()?;
        }

        self.render_mode_line(terminal, height as u16, cols)?;
        terminal.flush()?;
        self.needs_redraw = false;
        Ok(())
    }

    fn render_mode_line(&self, terminal: &mut Terminal, row: u16, cols: usize) -> Result<()> {
        let code = self.doc.code();
        let len = code.len();
        let bottom = (self.top + Self::page_height(row as usize + 1)).min(len);
        let percent = if len <= 1 || (self.top == 0 && bottom >= len) {
            "All".to_string()
        } else if self.top == 0 {
            "Top".to_string()
        } else if bottom >= len {
            "Bot".to_string()
        } else {
            format!("{}%", bottom * 100 / len)
        };
        let status = if code.is_complete() { "" } else { " [building]" };
        let mode = if self.raw { "raw" } else { "fmt" };

        let mode_line = format!(
            "-- {} ({}) {} L{}/{} {}{} ",
            self.doc.name(),
            code.rules().name(),
            mode,
            self.top + 1,
            len,
            percent,
            status
        );
        let padded = if mode_line.len() < cols {
            format!("{}{}", mode_line, "-".repeat(cols - mode_line.len()))
        } else {
            truncate_to_width(&mode_line, cols)
        };

        terminal.move_cursor(row, 0)?;
        terminal.set_reverse(true)?;
        terminal.write_str(&padded)?;
        terminal.set_reverse(false)?;
        Ok(())
    }
}

/// Truncate a string to fit within a display width
fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut width = 0;

    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(1);
        if width + ch_width > max_width {
            break;
        }
        result.push(ch);
        width += ch_width;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use codelines::Code;

    fn pager_over(text: &str) -> Pager {
        let config = Config::default();
        let code = Code::new(config.registry().rules_for_path(Path::new("x.txt")), config.formatter());
        Pager::new(Document::scratch(code), text.to_string(), &config)
    }

    #[test]
    fn test_resize_clamps_scroll_and_redraws() {
        let text: String = (0..50).map(|i| format!("line {}\n", i)).collect();
        let mut pager = pager_over(&text);
        while !pager.doc.code().is_complete() {
            pager.advance_build();
        }

        // Scroll to the end on a small terminal
        pager.handle_key(KeyEvent::new(KeyCode::End, KeyModifiers::NONE), 11);
        assert_eq!(pager.top, pager.doc.code().len() - 10);
        pager.needs_redraw = false;

        // Taller terminal: the last page now starts higher up
        pager.handle_resize(41);
        assert!(pager.needs_redraw);
        assert_eq!(pager.top, pager.doc.code().len() - 40);
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("hello", 3), "hel");
        assert_eq!(truncate_to_width("日本語", 5), "日本");
        assert_eq!(truncate_to_width("ab", 10), "ab");
    }
}
