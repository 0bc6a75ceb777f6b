//! codelines - incremental syntax tokenizing and line caching
//!
//! The pipeline runs in three stages:
//! - [`syntax::Tokenizer`] splits text into typed blocks under pluggable
//!   [`syntax::LexicalRules`]
//! - [`syntax::Aggregator`] regroups blocks into lines with raw and
//!   formatted text
//! - [`code::Code`] caches those lines and supports single-line edits
//!
//! [`document::Document`] binds a cache to a file and [`background`] runs
//! full builds off the calling thread.

pub mod background;
pub mod code;
pub mod config;
pub mod document;
pub mod error;
pub mod line;
pub mod logging;
pub mod syntax;

pub use background::BackgroundBuilder;
pub use code::{Code, LineTerminator};
pub use config::{Config, MarkupKind};
pub use document::Document;
pub use error::{CodeError, Result};
pub use line::Line;
