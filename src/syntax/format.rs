//! Markup formatters
//!
//! A formatter supplies the opening tag for each coloured block kind and
//! one closing tag shared by all of them. Two surfaces are supported:
//! rich-text `<color=#RRGGBB>` markup and ANSI truecolor escapes.

use std::fmt::Write;
use std::sync::OnceLock;

use crossterm::style::{Color, ResetColor, SetForegroundColor};
use crossterm::Command;
use regex::{Captures, Regex};

use super::block::Block;
use super::kind::{BlockKind, ThemeSlot};

/// An RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the `#` is optional)
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Format as `#RRGGBB`
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Colours for the six theme slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    colors: [Rgb; 6],
}

impl Default for Theme {
    fn default() -> Self {
        let mut colors = [Rgb::new(0, 0, 0); 6];
        colors[ThemeSlot::Comment.index()] = Rgb::new(0x57, 0xA6, 0x4A);
        colors[ThemeSlot::String.index()] = Rgb::new(0xD6, 0x9D, 0x85);
        colors[ThemeSlot::Number.index()] = Rgb::new(0xB5, 0xCE, 0xA8);
        colors[ThemeSlot::Keyword.index()] = Rgb::new(0x56, 0x9C, 0xD6);
        colors[ThemeSlot::Type.index()] = Rgb::new(0x4E, 0xC9, 0xB0);
        colors[ThemeSlot::Preprocessor.index()] = Rgb::new(0x9B, 0x9B, 0x9B);
        Self { colors }
    }
}

impl Theme {
    pub fn get(&self, slot: ThemeSlot) -> Rgb {
        self.colors[slot.index()]
    }

    pub fn set(&mut self, slot: ThemeSlot, color: Rgb) {
        self.colors[slot.index()] = color;
    }
}

/// Per-kind markup used by the aggregator
pub trait Formatter: Send + Sync {
    /// Opening tag for `kind`, or `None` for uncoloured kinds
    fn open_tag(&self, kind: BlockKind) -> Option<&str>;

    /// Closing tag applied after every opened span
    fn close_tag(&self) -> &str;

    /// Append block text to `out` so that it cannot be read as markup
    fn escape_into(&self, content: &str, out: &mut String) {
        out.push_str(content);
    }

    /// Remove all markup this formatter inserts and undo its escaping.
    ///
    /// Exact inverse of [`Formatter::write_block`] over a whole line.
    fn strip_markup(&self, formatted: &str) -> String;

    /// Append a block's formatted text to `out`
    fn write_block(&self, block: &Block<'_>, out: &mut String) {
        match self.open_tag(block.kind) {
            Some(tag) if !block.content.is_empty() => {
                out.push_str(tag);
                self.escape_into(block.content, out);
                out.push_str(self.close_tag());
            }
            _ => self.escape_into(block.content, out),
        }
    }
}

fn open_tag_for<'a>(tags: &'a [String; 6], kind: BlockKind) -> Option<&'a str> {
    kind.theme_slot().map(|slot| tags[slot.index()].as_str())
}

/// A literal `<` in block text, shielded from the rich-text parser
const RICH_TEXT_LT: &str = "<noparse><</noparse>";

/// `<color=#RRGGBB>...</color>` markup
pub struct RichTextFormatter {
    tags: [String; 6],
}

impl RichTextFormatter {
    pub fn new(theme: &Theme) -> Self {
        Self {
            tags: ThemeSlot::ALL.map(|slot| format!("<color={}>", theme.get(slot).to_hex())),
        }
    }
}

impl Formatter for RichTextFormatter {
    fn open_tag(&self, kind: BlockKind) -> Option<&str> {
        open_tag_for(&self.tags, kind)
    }

    fn close_tag(&self) -> &str {
        "</color>"
    }

    fn escape_into(&self, content: &str, out: &mut String) {
        for (i, part) in content.split('<').enumerate() {
            if i > 0 {
                out.push_str(RICH_TEXT_LT);
            }
            out.push_str(part);
        }
    }

    fn strip_markup(&self, formatted: &str) -> String {
        static TAG: OnceLock<Regex> = OnceLock::new();
        let re = TAG.get_or_init(|| {
            Regex::new(r"<noparse><</noparse>|<color=#[0-9A-Fa-f]{6}>|</color>").unwrap()
        });
        // Escaped text holds no bare `<`, so every match starts at real markup
        re.replace_all(formatted, |caps: &Captures<'_>| {
            if &caps[0] == RICH_TEXT_LT {
                "<"
            } else {
                ""
            }
        })
        .into_owned()
    }
}

/// Stands in for a raw ESC byte in block text (shown as `␛`)
const ANSI_ESC: &str = "\u{241B}\u{2060}";
/// A literal `␛` in block text, doubled so it cannot be read as [`ANSI_ESC`]
const ANSI_SYMBOL: &str = "\u{241B}\u{241B}";

/// ANSI truecolor escapes for terminal output
pub struct AnsiFormatter {
    tags: [String; 6],
    reset: String,
}

impl AnsiFormatter {
    pub fn new(theme: &Theme) -> Self {
        let tags = ThemeSlot::ALL.map(|slot| {
            let Rgb { r, g, b } = theme.get(slot);
            let mut tag = String::new();
            let _ = SetForegroundColor(Color::Rgb { r, g, b }).write_ansi(&mut tag);
            tag
        });
        let mut reset = String::new();
        let _ = ResetColor.write_ansi(&mut reset);
        Self { tags, reset }
    }
}

impl Formatter for AnsiFormatter {
    fn open_tag(&self, kind: BlockKind) -> Option<&str> {
        open_tag_for(&self.tags, kind)
    }

    fn close_tag(&self) -> &str {
        &self.reset
    }

    fn escape_into(&self, content: &str, out: &mut String) {
        for ch in content.chars() {
            match ch {
                '\x1b' => out.push_str(ANSI_ESC),
                '\u{241B}' => out.push_str(ANSI_SYMBOL),
                _ => out.push(ch),
            }
        }
    }

    fn strip_markup(&self, formatted: &str) -> String {
        static SGR: OnceLock<Regex> = OnceLock::new();
        let re = SGR.get_or_init(|| Regex::new("\x1b\\[[0-9;]*m|\u{241B}[\u{241B}\u{2060}]").unwrap());
        re.replace_all(formatted, |caps: &Captures<'_>| match &caps[0] {
            ANSI_ESC => "\x1b",
            ANSI_SYMBOL => "\u{241B}",
            _ => "",
        })
        .into_owned()
    }
}

/// Formatter that inserts no markup at all
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn open_tag(&self, _kind: BlockKind) -> Option<&str> {
        None
    }

    fn close_tag(&self) -> &str {
        ""
    }

    fn strip_markup(&self, formatted: &str) -> String {
        formatted.to_string()
    }
}

/// Describe a block for debug dumps: `Kind "content"`
pub fn describe_block(block: &Block<'_>) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<22} {:?}", block.kind.name(), block.content);
    out
}
