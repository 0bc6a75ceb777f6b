//! Line cache
//!
//! [`Code`] holds a document as an ordered list of [`Line`] records, each
//! with raw and formatted text. A full build tokenizes the whole document;
//! single-line edits re-tokenize just the edited line and can optionally
//! trigger a full rebuild to settle multi-line constructs (block comments,
//! unterminated strings) the edit may have opened or closed.
//!
//! The document text is always recoverable with `to_string()`, which joins
//! the raw lines with the configured terminator. Re-building from that text
//! gives back the same lines.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{CodeError, Result};
use crate::line::{Line, LinePool};
use crate::syntax::{
    display_width, has_line_break, Aggregator, Blocks, Formatter, LexicalRules, Tokenizer,
    MIN_RENDERED_WIDTH,
};

/// Newline sequence used when joining lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    Lf,
    CrLf,
}

impl LineTerminator {
    /// The host platform's natural newline
    pub fn platform() -> Self {
        if cfg!(windows) {
            LineTerminator::CrLf
        } else {
            LineTerminator::Lf
        }
    }

    /// Guess from existing text: CRLF if any CRLF is present
    pub fn detect(text: &str) -> Option<Self> {
        if text.contains("\r\n") {
            Some(LineTerminator::CrLf)
        } else if text.contains('\n') {
            Some(LineTerminator::Lf)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineTerminator::Lf => "\n",
            LineTerminator::CrLf => "\r\n",
        }
    }
}

/// Ordered, editable cache of tokenized lines
pub struct Code {
    /// Lines in document order
    lines: Vec<Line>,
    /// Widest line of the last full build, in columns
    width: usize,
    /// Lines with something besides whitespace and comments
    code_lines: usize,
    /// Tokenizer of the last full pass; `blocks()` reads from it
    tokenizer: Tokenizer,
    /// Tokenizer for single-line edits, so they leave the full pass intact
    scratch: Tokenizer,
    aggregator: Aggregator,
    formatter: Arc<dyn Formatter>,
    pool: LinePool,
    terminator: LineTerminator,
    tab_width: usize,
    /// Blocks of the current pass already folded into `lines`
    consumed: usize,
    /// Whether the current full pass has reached the end of the text
    complete: bool,
    /// `lines` holds only a stand-in empty line until the first chunk lands
    placeholder: bool,
}

impl Code {
    /// Create an empty cache (one empty line)
    pub fn new(rules: Arc<dyn LexicalRules>, formatter: Arc<dyn Formatter>) -> Self {
        Self {
            lines: vec![Line::new()],
            width: MIN_RENDERED_WIDTH,
            code_lines: 0,
            tokenizer: Tokenizer::new(rules.clone()),
            scratch: Tokenizer::new(rules),
            aggregator: Aggregator::new(),
            formatter,
            pool: LinePool::new(),
            terminator: LineTerminator::platform(),
            tab_width: 4,
            consumed: 0,
            complete: true,
            placeholder: false,
        }
    }

    /// Create an empty cache sharing this one's rules and settings
    pub fn empty_like(&self) -> Self {
        let mut code = Self::new(self.tokenizer.rules().clone(), self.formatter.clone());
        code.terminator = self.terminator;
        code.tab_width = self.tab_width;
        let highlight = self.tokenizer.highlight();
        code.tokenizer.set_highlight(highlight);
        code.scratch.set_highlight(highlight);
        code
    }

    pub fn terminator(&self) -> LineTerminator {
        self.terminator
    }

    /// Set the terminator used by `to_string()`
    pub fn set_terminator(&mut self, terminator: LineTerminator) {
        self.terminator = terminator;
    }

    /// Set the tab width used for width measurement
    pub fn set_tab_width(&mut self, tab_width: usize) {
        self.tab_width = tab_width.max(1);
    }

    pub fn rules(&self) -> &Arc<dyn LexicalRules> {
        self.tokenizer.rules()
    }

    pub fn formatter(&self) -> &Arc<dyn Formatter> {
        &self.formatter
    }

    /// Swap language rules and rebuild
    pub fn set_rules(&mut self, rules: Arc<dyn LexicalRules>) {
        self.finish();
        self.tokenizer.set_rules(rules.clone());
        self.scratch.set_rules(rules);
        self.rebuild();
    }

    /// Swap formatter and rebuild
    pub fn set_formatter(&mut self, formatter: Arc<dyn Formatter>) {
        self.finish();
        self.formatter = formatter;
        self.rebuild();
    }

    /// Turn highlighting on or off and rebuild
    pub fn set_highlight(&mut self, highlight: bool) {
        self.finish();
        self.tokenizer.set_highlight(highlight);
        self.scratch.set_highlight(highlight);
        self.rebuild();
    }

    pub fn highlight(&self) -> bool {
        self.tokenizer.highlight()
    }

    /// Tokenize `text` from scratch and replace every line
    pub fn build(&mut self, text: &str) {
        let started = Instant::now();
        self.begin_progressive(text);
        self.build_next(usize::MAX);
        tracing::debug!(
            language = self.rules().name(),
            lines = self.lines.len(),
            blocks = self.tokenizer.blocks().len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "full build"
        );
    }

    /// Start a build that is driven in chunks by [`Code::build_next`]
    pub fn begin_progressive(&mut self, text: &str) {
        self.tokenizer.set_code(text);
        self.pool.give_all(&mut self.lines);
        self.lines.push(self.pool.take());
        self.placeholder = true;
        self.aggregator.reset();
        self.width = MIN_RENDERED_WIDTH;
        self.code_lines = 0;
        self.consumed = 0;
        self.complete = false;
    }

    /// Tokenize up to `max_lines` more lines. Returns true once complete.
    pub fn build_next(&mut self, max_lines: usize) -> bool {
        if self.complete {
            return true;
        }
        let target = self.tokenizer.line_count().saturating_add(max_lines);
        self.tokenizer.build_next_blocks(target);

        let finished = self.tokenizer.is_finished();
        let blocks = self.tokenizer.blocks();
        // Chunks always end right after a line break, so the new tail
        // starts a fresh line and can be measured on its own.
        let tail = blocks.tail(self.consumed);
        if self.placeholder {
            self.pool.give_all(&mut self.lines);
            self.placeholder = false;
        }
        self.aggregator.append_lines(
            tail,
            self.formatter.as_ref(),
            &mut self.lines,
            &mut self.pool,
            finished,
        );
        if self.lines.is_empty() {
            // Nothing completed yet (e.g. `max_lines == 0`)
            self.lines.push(self.pool.take());
            self.placeholder = true;
        }
        let tab_width = self.tab_width;
        self.width = self
            .width
            .max(Aggregator::max_rendered_width(tail, |b| display_width(b, tab_width)));
        self.code_lines += tail.line_count_excluding_blank_or_comment_only();
        self.consumed = blocks.len();
        self.complete = finished;
        finished
    }

    /// Run any unfinished progressive build to completion
    pub fn finish(&mut self) {
        self.build_next(usize::MAX);
    }

    /// Whether the last build has reached the end of the document
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Re-tokenize the whole document from its current lines
    pub fn rebuild(&mut self) {
        let text = self.to_string();
        self.build(&text);
    }

    /// Blocks of the last full pass; single-line edits without a rebuild
    /// do not show up here
    pub fn blocks(&self) -> Blocks<'_> {
        self.tokenizer.blocks()
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check whether the document is a single empty line
    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// Widest line in columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Lines that are neither blank nor comment-only
    pub fn code_line_count(&self) -> usize {
        self.code_lines
    }

    /// Iterate over lines in document order
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.lines.len() {
            Ok(())
        } else {
            Err(CodeError::OutOfRange {
                index,
                len: self.lines.len(),
            })
        }
    }

    /// Get a line record
    pub fn line(&self, index: usize) -> Result<&Line> {
        self.check_index(index)?;
        Ok(&self.lines[index])
    }

    /// Get a line's formatted text
    pub fn get(&self, index: usize) -> Result<&str> {
        self.line(index).map(Line::formatted)
    }

    /// Get a line's raw text
    pub fn get_unformatted(&self, index: usize) -> Result<&str> {
        self.line(index).map(Line::unformatted)
    }

    /// Tokenize one line on its own
    fn format_single_line(&mut self, value: &str) -> Line {
        self.scratch.set_code(value);
        self.scratch.build_all_blocks();
        let mut line = self
            .aggregator
            .to_single_line(self.scratch.blocks(), self.formatter.as_ref());
        if has_line_break(value) {
            // Keep the full text; the forced rebuild splits it into lines
            line.set_unformatted(value);
        }
        let tab_width = self.tab_width;
        self.width = self
            .width
            .max(Aggregator::max_rendered_width(self.scratch.blocks(), |b| display_width(b, tab_width)));
        line
    }

    /// Replace line `index`.
    ///
    /// With `rebuild` the whole document is re-tokenized afterwards, which
    /// is needed whenever the edit may open or close a multi-line construct.
    /// Text containing a line break always forces a rebuild.
    pub fn set_line(&mut self, index: usize, value: &str, rebuild: bool) -> Result<()> {
        self.finish();
        self.check_index(index)?;
        let line = self.format_single_line(value);
        let old = std::mem::replace(&mut self.lines[index], line);
        self.pool.give(old);
        if rebuild || has_line_break(value) {
            self.rebuild();
        }
        Ok(())
    }

    /// Insert a new line before `index` (`index == len()` appends)
    pub fn insert_at(&mut self, index: usize, content: &str, rebuild: bool) -> Result<()> {
        self.finish();
        if index > self.lines.len() {
            return Err(CodeError::OutOfRange {
                index,
                len: self.lines.len(),
            });
        }
        let line = self.format_single_line(content);
        self.lines.insert(index, line);
        if rebuild || has_line_break(content) {
            self.rebuild();
        }
        Ok(())
    }

    /// Remove line `index`. Removing the only line leaves one empty line.
    pub fn remove_at(&mut self, index: usize, rebuild: bool) -> Result<()> {
        self.finish();
        self.check_index(index)?;
        let old = self.lines.remove(index);
        self.pool.give(old);
        if self.lines.is_empty() {
            self.lines.push(Line::new());
        }
        if rebuild {
            self.rebuild();
        }
        Ok(())
    }

    /// Reset to a single empty line, pooling the old records
    pub fn clear(&mut self) {
        self.finish();
        self.pool.give_all(&mut self.lines);
        self.lines.push(Line::new());
        self.tokenizer.set_code(String::new());
        self.width = MIN_RENDERED_WIDTH;
        self.code_lines = 0;
    }
}

impl fmt::Display for Code {
    /// Join raw lines with the line terminator
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terminator = self.terminator.as_str();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str(terminator)?;
            }
            f.write_str(line.unformatted())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Code")
            .field("language", &self.rules().name())
            .field("lines", &self.lines.len())
            .field("width", &self.width)
            .field("complete", &self.complete)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{LanguageDefinition, PlainFormatter, RichTextFormatter, Theme};
    use pretty_assertions::assert_eq;

    fn toy_rules() -> Arc<dyn LexicalRules> {
        let mut lang = LanguageDefinition::new("Toy");
        lang.add_keywords(&["if", "class", "ref"]);
        lang.add_types(&["List", "MyClass"]);
        lang.set_block_comment("/*", "*/");
        lang.set_line_comment("//");
        Arc::new(lang)
    }

    fn code(text: &str) -> Code {
        let mut code = Code::new(toy_rules(), Arc::new(RichTextFormatter::new(&Theme::default())));
        code.set_terminator(LineTerminator::Lf);
        code.build(text);
        code
    }

    fn raw_lines(code: &Code) -> Vec<&str> {
        code.lines().map(Line::unformatted).collect()
    }

    #[test]
    fn test_build_and_get() {
        let code = code("class A\n// hi\nx");
        assert_eq!(code.len(), 3);
        assert_eq!(code.get_unformatted(0).unwrap(), "class A");
        assert!(code.get(0).unwrap().starts_with("<color="));
        assert_eq!(code.code_line_count(), 2);
        assert!(code.get(3).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_empty_document_is_one_line() {
        let code = code("");
        assert_eq!(code.len(), 1);
        assert_eq!(code.get(0).unwrap(), "");
        assert!(code.is_empty());
        assert_eq!(code.width(), MIN_RENDERED_WIDTH);
    }

    #[test]
    fn test_set_line_without_rebuild() {
        let mut code = code("a\nb\nc");
        code.set_line(0, "new content", false).unwrap();
        assert_eq!(raw_lines(&code), vec!["new content", "b", "c"]);
        assert_eq!(code.get(1).unwrap(), "b");
    }

    #[test]
    fn test_set_line_with_rebuild_opens_comment() {
        let mut code = code("a\nb\nc");
        code.set_line(0, "/* open", false).unwrap();
        // Single-line tokenization cannot know line 1 is now inside a comment
        assert_eq!(code.get(1).unwrap(), "b");

        code.set_line(0, "/* open", true).unwrap();
        assert_ne!(code.get(1).unwrap(), "b");
        assert_eq!(code.code_line_count(), 0);
    }

    #[test]
    fn test_set_line_with_line_break_forces_rebuild() {
        let mut code = code("a\nb");
        code.set_line(0, "x\ny", false).unwrap();
        assert_eq!(raw_lines(&code), vec!["x", "y", "b"]);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut code = code("a\nb\nc");
        code.insert_at(1, "", false).unwrap();
        assert_eq!(raw_lines(&code), vec!["a", "", "b", "c"]);

        code.insert_at(4, "d", true).unwrap();
        assert_eq!(code.to_string(), "a\n\nb\nc\nd");

        assert!(code.insert_at(9, "x", false).unwrap_err().is_out_of_range());

        code.remove_at(1, false).unwrap();
        assert_eq!(raw_lines(&code), vec!["a", "b", "c", "d"]);
        assert!(code.remove_at(4, false).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_remove_only_line() {
        let mut code = code("solo");
        code.remove_at(0, true).unwrap();
        assert_eq!(code.len(), 1);
        assert!(code.is_empty());
    }

    #[test]
    fn test_to_string_uses_terminator() {
        let mut code = code("a\r\nb\rc");
        assert_eq!(code.to_string(), "a\nb\nc");
        code.set_terminator(LineTerminator::CrLf);
        assert_eq!(code.to_string(), "a\r\nb\r\nc");
    }

    #[test]
    fn test_progressive_matches_full_build() {
        let text = (0..50)
            .map(|i| if i % 7 == 0 { "/* a\nb */".to_string() } else { format!("if x{}", i) })
            .collect::<Vec<_>>()
            .join("\n");
        let full = code(&text);

        let mut progressive = full.empty_like();
        progressive.begin_progressive(&text);
        let mut rounds = 0;
        while !progressive.build_next(5) {
            rounds += 1;
            assert!(!progressive.is_complete());
        }
        assert!(rounds > 1);
        assert_eq!(
            progressive.lines().collect::<Vec<_>>(),
            full.lines().collect::<Vec<_>>()
        );
        assert_eq!(progressive.width(), full.width());
        assert_eq!(progressive.code_line_count(), full.code_line_count());
    }

    #[test]
    fn test_progressive_keeps_one_line_before_first_chunk() {
        let mut code = code("old\ntext");
        code.begin_progressive("a\nb");
        assert_eq!(code.len(), 1);
        assert_eq!(code.get(0).unwrap(), "");

        assert!(!code.build_next(0));
        assert_eq!(code.len(), 1);
        assert_eq!(code.get_unformatted(0).unwrap(), "");

        assert!(!code.build_next(1));
        assert_eq!(raw_lines(&code), vec!["a"]);

        assert!(code.build_next(1));
        assert_eq!(raw_lines(&code), vec!["a", "b"]);
    }

    #[test]
    fn test_single_line_edit_keeps_full_pass_blocks() {
        let mut code = code("a\n/* b */\nc");
        code.set_line(0, "if x", false).unwrap();
        assert_eq!(code.blocks().line_count(), code.len());
        assert_eq!(code.blocks().concat(), "a\n/* b */\nc");

        code.set_line(0, "if x", true).unwrap();
        assert_eq!(code.blocks().concat(), "if x\n/* b */\nc");
        assert_eq!(code.blocks().line_count(), code.len());
    }

    #[test]
    fn test_edit_finishes_progressive_build() {
        let mut code = code("");
        code.begin_progressive("a\nb\nc\nd");
        code.build_next(1);
        code.set_line(3, "z", false).unwrap();
        assert_eq!(code.to_string(), "a\nb\nc\nz");
    }

    #[test]
    fn test_highlight_toggle() {
        let mut code = code("if x");
        assert_ne!(code.get(0).unwrap(), "if x");
        code.set_highlight(false);
        assert_eq!(code.get(0).unwrap(), "if x");
        code.set_formatter(Arc::new(PlainFormatter));
        code.set_highlight(true);
        assert_eq!(code.get(0).unwrap(), "if x");
    }

    #[test]
    fn test_width_tracks_longest_line() {
        let long = "y".repeat(MIN_RENDERED_WIDTH * 2);
        let code = code(&format!("x\n{}", long));
        assert_eq!(code.width(), MIN_RENDERED_WIDTH * 2);
    }
}
