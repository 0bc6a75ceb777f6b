//! Configuration file support
//!
//! Loads settings from ~/.codelines.toml (or %USERPROFILE%\.codelines.toml on Windows)
//!
//! Example:
//! ```text
//! # codelines configuration
//! highlight = true
//! markup = "ansi"
//! line-terminator = "lf"
//! lines-per-screen = 200
//! tab-width = 4
//!
//! [theme]
//! keyword = "#569CD6"
//!
//! [[language]]
//! name = "Toy"
//! extensions = ["toy"]
//! keywords = ["if", "else"]
//! line_comment = "--"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::code::LineTerminator;
use crate::error::Result;
use crate::syntax::{
    AnsiFormatter, Formatter, LanguageDefinition, LanguageRegistry, RichTextFormatter, Rgb, Theme,
    ThemeSlot,
};

/// Markup surface for formatted lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MarkupKind {
    /// ANSI truecolor escapes
    #[default]
    Ansi,
    /// `<color=#RRGGBB>` tags
    RichText,
}

/// Line terminator used when joining lines back into a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminatorPolicy {
    #[default]
    Platform,
    Lf,
    Crlf,
}

/// Theme overrides as `#RRGGBB` strings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub comment: Option<String>,
    pub string: Option<String>,
    pub number: Option<String>,
    pub keyword: Option<String>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub preprocessor: Option<String>,
}

impl ThemeConfig {
    fn get(&self, slot: ThemeSlot) -> Option<&str> {
        match slot {
            ThemeSlot::Comment => self.comment.as_deref(),
            ThemeSlot::String => self.string.as_deref(),
            ThemeSlot::Number => self.number.as_deref(),
            ThemeSlot::Keyword => self.keyword.as_deref(),
            ThemeSlot::Type => self.type_name.as_deref(),
            ThemeSlot::Preprocessor => self.preprocessor.as_deref(),
        }
    }
}

/// Configuration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Whether to colour blocks at all
    pub highlight: bool,
    pub markup: MarkupKind,
    pub line_terminator: TerminatorPolicy,
    /// Lines tokenized per chunk for the first paint
    pub lines_per_screen: usize,
    /// Documents at least this many bytes are built on a worker thread
    pub background_threshold: usize,
    /// Tab width used when measuring line widths
    pub tab_width: usize,
    /// Whether the pager shows line numbers
    pub line_numbers: bool,
    pub theme: ThemeConfig,
    /// User-defined languages
    #[serde(rename = "language")]
    pub languages: Vec<LanguageDefinition>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            highlight: true,
            markup: MarkupKind::Ansi,
            line_terminator: TerminatorPolicy::Platform,
            lines_per_screen: 200,
            background_threshold: 256 * 1024,
            tab_width: 4,
            line_numbers: false,
            theme: ThemeConfig::default(),
            languages: Vec::new(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".codelines.toml"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".codelines.toml"))
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`; a missing file gives the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse config file contents
    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.normalize();
        Ok(config)
    }

    fn normalize(&mut self) {
        self.lines_per_screen = self.lines_per_screen.max(1);
        self.tab_width = self.tab_width.clamp(1, 16); // Between 1 and 16
    }

    /// Build the theme, keeping defaults for invalid colours
    pub fn theme(&self) -> Theme {
        let mut theme = Theme::default();
        for slot in ThemeSlot::ALL {
            if let Some(value) = self.theme.get(slot) {
                match Rgb::parse_hex(value) {
                    Some(color) => theme.set(slot, color),
                    None => tracing::warn!(slot = slot.name(), value, "invalid theme colour"),
                }
            }
        }
        theme
    }

    /// Build the configured formatter
    pub fn formatter(&self) -> Arc<dyn Formatter> {
        let theme = self.theme();
        match self.markup {
            MarkupKind::Ansi => Arc::new(AnsiFormatter::new(&theme)),
            MarkupKind::RichText => Arc::new(RichTextFormatter::new(&theme)),
        }
    }

    /// Resolve the terminator policy
    pub fn terminator(&self) -> LineTerminator {
        match self.line_terminator {
            TerminatorPolicy::Platform => LineTerminator::platform(),
            TerminatorPolicy::Lf => LineTerminator::Lf,
            TerminatorPolicy::Crlf => LineTerminator::CrLf,
        }
    }

    /// Built-in languages plus user-defined ones
    pub fn registry(&self) -> LanguageRegistry {
        let mut registry = LanguageRegistry::new();
        for lang in &self.languages {
            registry.add_language(lang.clone());
        }
        registry
    }
}
