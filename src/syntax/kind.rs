//! Block kinds produced by the tokenizer
//!
//! This module defines the classification attached to every block of
//! text and the theme slot each kind is coloured with.

/// Classification of a tokenized block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockKind {
    /// Plain text (also the tokenizer's idle state)
    #[default]
    Default,
    /// String literals ("..." or @"...")
    String,
    /// Character literals ('a')
    Char,
    /// Block comments (/* */), one block per physical line
    CommentBlock,
    /// Line comments (//)
    CommentLine,
    /// Type names from the language's type table
    Type,
    /// Language keywords
    Keyword,
    /// Numeric literals including suffixes
    Number,
    /// Preprocessor directives (#region, #define)
    PreprocessorDirective,
    /// A single line terminator (LF, CRLF or CR)
    LineBreak,
    /// Text emitted with highlighting turned off
    Unformatted,
}

/// The six colour slots a formatter provides tags for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeSlot {
    Comment,
    String,
    Number,
    Keyword,
    Type,
    Preprocessor,
}

impl ThemeSlot {
    pub const ALL: [ThemeSlot; 6] = [
        ThemeSlot::Comment,
        ThemeSlot::String,
        ThemeSlot::Number,
        ThemeSlot::Keyword,
        ThemeSlot::Type,
        ThemeSlot::Preprocessor,
    ];

    /// Position of this slot in [`ThemeSlot::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Config key for this slot
    pub fn name(&self) -> &'static str {
        match self {
            ThemeSlot::Comment => "comment",
            ThemeSlot::String => "string",
            ThemeSlot::Number => "number",
            ThemeSlot::Keyword => "keyword",
            ThemeSlot::Type => "type",
            ThemeSlot::Preprocessor => "preprocessor",
        }
    }
}

impl BlockKind {
    /// All kinds, in declaration order
    pub const ALL: [BlockKind; 11] = [
        BlockKind::Default,
        BlockKind::String,
        BlockKind::Char,
        BlockKind::CommentBlock,
        BlockKind::CommentLine,
        BlockKind::Type,
        BlockKind::Keyword,
        BlockKind::Number,
        BlockKind::PreprocessorDirective,
        BlockKind::LineBreak,
        BlockKind::Unformatted,
    ];

    /// Get the colour slot for this kind, if it is coloured at all
    pub fn theme_slot(&self) -> Option<ThemeSlot> {
        match self {
            BlockKind::CommentBlock | BlockKind::CommentLine => Some(ThemeSlot::Comment),
            BlockKind::String | BlockKind::Char => Some(ThemeSlot::String),
            BlockKind::Number => Some(ThemeSlot::Number),
            BlockKind::Keyword => Some(ThemeSlot::Keyword),
            BlockKind::Type => Some(ThemeSlot::Type),
            BlockKind::PreprocessorDirective => Some(ThemeSlot::Preprocessor),
            BlockKind::Default | BlockKind::LineBreak | BlockKind::Unformatted => None,
        }
    }

    /// Check if this is either comment kind
    pub fn is_comment(&self) -> bool {
        matches!(self, BlockKind::CommentBlock | BlockKind::CommentLine)
    }

    /// Get a human-readable name for this kind
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Default => "Default",
            BlockKind::String => "String",
            BlockKind::Char => "Char",
            BlockKind::CommentBlock => "CommentBlock",
            BlockKind::CommentLine => "CommentLine",
            BlockKind::Type => "Type",
            BlockKind::Keyword => "Keyword",
            BlockKind::Number => "Number",
            BlockKind::PreprocessorDirective => "PreprocessorDirective",
            BlockKind::LineBreak => "LineBreak",
            BlockKind::Unformatted => "Unformatted",
        }
    }

    /// Parse a kind from its name
    pub fn from_name(name: &str) -> Option<Self> {
        BlockKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}
