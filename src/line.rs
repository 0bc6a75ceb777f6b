//! Line records
//!
//! A line keeps its raw text and the same text decorated with markup.
//! Stripping the markup from `formatted` always gives back `unformatted`.

/// A single renderable line (without trailing newline)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    unformatted: String,
    formatted: String,
}

impl Line {
    /// Create a new empty line
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a line from its two representations
    pub fn from_parts(unformatted: impl Into<String>, formatted: impl Into<String>) -> Self {
        Self {
            unformatted: unformatted.into(),
            formatted: formatted.into(),
        }
    }

    /// Get the raw text
    pub fn unformatted(&self) -> &str {
        &self.unformatted
    }

    /// Get the markup-decorated text
    pub fn formatted(&self) -> &str {
        &self.formatted
    }

    /// Replace both representations, reusing the allocations
    pub fn set(&mut self, unformatted: &str, formatted: &str) {
        self.unformatted.clear();
        self.unformatted.push_str(unformatted);
        self.formatted.clear();
        self.formatted.push_str(formatted);
    }

    /// Replace only the raw text (formatted is left as-is until rebuilt)
    pub(crate) fn set_unformatted(&mut self, unformatted: &str) {
        self.unformatted.clear();
        self.unformatted.push_str(unformatted);
    }

    /// Clear the line content
    pub fn clear(&mut self) {
        self.unformatted.clear();
        self.formatted.clear();
    }

    /// Check if the line is empty
    pub fn is_empty(&self) -> bool {
        self.unformatted.is_empty()
    }
}

/// Free-list of line records reused across full rebuilds
#[derive(Debug, Default)]
pub struct LinePool {
    free: Vec<Line>,
}

impl LinePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a cleared line, reusing a pooled one when available
    pub fn take(&mut self) -> Line {
        self.free.pop().unwrap_or_default()
    }

    /// Return a line to the pool
    pub fn give(&mut self, mut line: Line) {
        line.clear();
        self.free.push(line);
    }

    /// Return every line in `lines` to the pool
    pub fn give_all(&mut self, lines: &mut Vec<Line>) {
        for line in lines.drain(..) {
            self.give(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_line_operations() {
        let mut line = Line::from_parts("Hello", "Hello");
        assert_eq!(line.unformatted(), "Hello");
        assert_eq!(line.formatted(), "Hello");

        line.set("if", "<b>if</b>");
        assert_eq!(line.unformatted(), "if");
        assert_eq!(line.formatted(), "<b>if</b>");

        line.set_unformatted("fi");
        assert_eq!(line.unformatted(), "fi");
        assert_eq!(line.formatted(), "<b>if</b>");

        line.clear();
        assert!(line.is_empty());
        assert!(line.formatted().is_empty());
    }

    #[test]
    fn test_pool_reuses_allocations() {
        let mut pool = LinePool::new();
        let mut lines = vec![Line::from_parts("abcdefgh", "<b>abcdefgh</b>"), Line::new()];
        pool.give_all(&mut lines);
        assert!(lines.is_empty());

        // Lines come back last-in first-out
        assert_eq!(pool.take().unformatted.capacity(), 0);
        let line = pool.take();
        assert!(line.is_empty());
        assert!(line.unformatted.capacity() >= 8);
        assert!(line.formatted.capacity() >= 15);

        assert_eq!(pool.take(), Line::new());
    }
}
