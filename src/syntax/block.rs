//! Blocks and block sequences
//!
//! The tokenizer records blocks as byte ranges into the text it owns.
//! [`Blocks`] pairs those ranges back up with the text so consumers see
//! `(content, kind)` blocks without copying.

use std::ops::Range;

use super::kind::BlockKind;

/// A block as stored by the tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Byte range into the tokenized text
    pub range: Range<usize>,
    pub kind: BlockKind,
}

/// A typed, contiguous substring of the tokenized text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// Exact source text covered by this block
    pub content: &'a str,
    pub kind: BlockKind,
}

impl<'a> Block<'a> {
    pub fn new(content: &'a str, kind: BlockKind) -> Self {
        Self { content, kind }
    }

    /// Check if the block has only whitespace
    pub fn is_blank(&self) -> bool {
        self.content.chars().all(char::is_whitespace)
    }

    /// Check whether this block makes its line count as code
    fn is_code(&self) -> bool {
        self.kind != BlockKind::LineBreak && !self.kind.is_comment() && !self.is_blank()
    }
}

/// Read-only view of one tokenization pass's block sequence
#[derive(Debug, Clone, Copy)]
pub struct Blocks<'a> {
    text: &'a str,
    spans: &'a [BlockSpan],
}

impl<'a> Blocks<'a> {
    /// Create a view over spans recorded against `text`
    pub fn new(text: &'a str, spans: &'a [BlockSpan]) -> Self {
        Self { text, spans }
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Get a block by index
    pub fn get(&self, idx: usize) -> Option<Block<'a>> {
        let text = self.text;
        self.spans
            .get(idx)
            .map(|span| Block::new(&text[span.range.clone()], span.kind))
    }

    /// Iterate over blocks in emission order
    pub fn iter(&self) -> impl Iterator<Item = Block<'a>> + 'a {
        let text = self.text;
        self.spans
            .iter()
            .map(move |span| Block::new(&text[span.range.clone()], span.kind))
    }

    /// View of the blocks from `start` onwards
    pub fn tail(&self, start: usize) -> Blocks<'a> {
        Blocks {
            text: self.text,
            spans: &self.spans[start.min(self.spans.len())..],
        }
    }

    /// Number of lines: line breaks + 1
    pub fn line_count(&self) -> usize {
        self.spans
            .iter()
            .filter(|span| span.kind == BlockKind::LineBreak)
            .count()
            + 1
    }

    /// Number of lines holding something other than whitespace or comments
    pub fn line_count_excluding_blank_or_comment_only(&self) -> usize {
        let mut count = 0;
        let mut has_code = false;
        for block in self.iter() {
            if block.kind == BlockKind::LineBreak {
                if has_code {
                    count += 1;
                }
                has_code = false;
            } else if block.is_code() {
                has_code = true;
            }
        }
        if has_code {
            count += 1;
        }
        count
    }

    /// Concatenate all block contents
    pub fn concat(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        for block in self.iter() {
            out.push_str(block.content);
        }
        out
    }
}
