//! Syntax module
//!
//! This module provides the highlighting pipeline:
//! - Tokenizing text into typed blocks
//! - Regrouping blocks into formatted lines
//! - Language policies and markup formatters

mod aggregate;
mod block;
mod builtin;
mod format;
mod kind;
mod language;
mod registry;
mod tokenizer;

pub use aggregate::{display_width, Aggregator, MIN_RENDERED_WIDTH};
pub use block::{Block, BlockSpan, Blocks};
pub use builtin::{all_languages, plain_language, PLAIN};
pub use format::{
    describe_block, AnsiFormatter, Formatter, PlainFormatter, Rgb, RichTextFormatter, Theme,
};
pub use kind::{BlockKind, ThemeSlot};
pub use language::{is_ident_byte, word_at, LanguageDefinition, LexicalRules};
pub use registry::LanguageRegistry;
pub use tokenizer::{has_line_break, line_end_len, line_ranges, Tokenizer};
