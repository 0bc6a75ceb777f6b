//! Block aggregation into lines
//!
//! Regroups a flat block sequence into per-line records, splitting at
//! `LineBreak` blocks. Line text is accumulated in two buffers owned by the
//! [`Aggregator`] and reused for every line of a pass.

use unicode_width::UnicodeWidthChar;

use super::block::{Block, Blocks};
use super::format::Formatter;
use super::kind::BlockKind;
use crate::line::{Line, LinePool};

/// Width reserved even for empty documents
pub const MIN_RENDERED_WIDTH: usize = 40;

/// Reusable line builder
#[derive(Debug, Default)]
pub struct Aggregator {
    unformatted: String,
    formatted: String,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any partially accumulated line
    pub fn reset(&mut self) {
        self.unformatted.clear();
        self.formatted.clear();
    }

    fn push_block(&mut self, block: &Block<'_>, formatter: &dyn Formatter) {
        self.unformatted.push_str(block.content);
        formatter.write_block(block, &mut self.formatted);
    }

    fn flush_line(&mut self, pool: &mut LinePool) -> Line {
        let mut line = pool.take();
        line.set(&self.unformatted, &self.formatted);
        self.reset();
        line
    }

    /// Split `blocks` into lines
    pub fn to_lines(&mut self, blocks: Blocks<'_>, formatter: &dyn Formatter) -> Vec<Line> {
        let mut lines = Vec::with_capacity(blocks.line_count());
        let mut pool = LinePool::new();
        self.reset();
        self.append_lines(blocks, formatter, &mut lines, &mut pool, true);
        lines
    }

    /// Append the lines completed by `blocks` to `out`.
    ///
    /// A line still open at the end of `blocks` stays buffered for the next
    /// call unless `finished` is set, in which case it is emitted too.
    pub fn append_lines(
        &mut self,
        blocks: Blocks<'_>,
        formatter: &dyn Formatter,
        out: &mut Vec<Line>,
        pool: &mut LinePool,
        finished: bool,
    ) {
        for block in blocks.iter() {
            if block.kind == BlockKind::LineBreak {
                let line = self.flush_line(pool);
                out.push(line);
            } else {
                self.push_block(&block, formatter);
            }
        }
        if finished {
            let line = self.flush_line(pool);
            out.push(line);
        }
    }

    /// Build only the first line of `blocks`
    pub fn to_single_line(&mut self, blocks: Blocks<'_>, formatter: &dyn Formatter) -> Line {
        self.reset();
        for block in blocks.iter() {
            if block.kind == BlockKind::LineBreak {
                break;
            }
            self.push_block(&block, formatter);
        }
        let line = Line::from_parts(self.unformatted.as_str(), self.formatted.as_str());
        self.reset();
        line
    }

    /// Widest line by summed block widths, never below [`MIN_RENDERED_WIDTH`]
    pub fn max_rendered_width<F>(blocks: Blocks<'_>, measure: F) -> usize
    where
        F: Fn(&Block<'_>) -> usize,
    {
        let mut widest = 0;
        let mut current = 0;
        for block in blocks.iter() {
            if block.kind == BlockKind::LineBreak {
                widest = widest.max(current);
                current = 0;
            } else {
                current += measure(&block);
            }
        }
        widest.max(current).max(MIN_RENDERED_WIDTH)
    }
}

/// Terminal column width of a block, with tabs counted as `tab_width`
pub fn display_width(block: &Block<'_>, tab_width: usize) -> usize {
    block
        .content
        .chars()
        .map(|ch| match ch {
            '\t' => tab_width,
            _ => ch.width().unwrap_or(0),
        })
        .sum()
}
