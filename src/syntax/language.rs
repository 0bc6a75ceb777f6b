//! Language policies for the tokenizer
//!
//! The tokenizer state machine is language-agnostic. Everything that
//! differs between languages (comment delimiters, keyword and type tables,
//! string markers) is answered through the [`LexicalRules`] trait.
//! [`LanguageDefinition`] is the data-driven implementation used by the
//! built-in languages and by `[[language]]` tables in the config file.

use std::collections::HashSet;

use serde::Deserialize;

/// Check whether a byte can be part of an identifier.
///
/// Non-ASCII bytes count as identifier bytes so that word boundaries
/// always fall on UTF-8 character boundaries.
pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// Get the identifier that starts at `index`, if any
pub fn word_at(text: &str, index: usize) -> Option<&str> {
    if index >= text.len() || !text.is_char_boundary(index) {
        return None;
    }
    let bytes = text.as_bytes();
    let end = bytes[index..]
        .iter()
        .position(|&b| !is_ident_byte(b))
        .map_or(bytes.len(), |p| index + p);
    if end == index {
        None
    } else {
        Some(&text[index..end])
    }
}

/// Lexical capabilities the tokenizer asks of a language.
///
/// All methods are pure functions of the text and a byte index. Methods
/// returning `Option<usize>` give the length of the matched token.
pub trait LexicalRules: Send + Sync {
    /// Language name (for logging and lookup)
    fn name(&self) -> &str;

    /// Block comment opener at `index`
    fn comment_block_start(&self, text: &str, index: usize) -> Option<usize>;

    /// Block comment closer at `index`
    fn comment_block_end(&self, text: &str, index: usize) -> Option<usize>;

    /// Line comment opener at `index`
    fn comment_line_start(&self, text: &str, index: usize) -> Option<usize>;

    /// Preprocessor directive marker at `index`
    fn preprocessor_start(&self, text: &str, index: usize) -> bool;

    /// String opener at `index` (1, or 2 with a verbatim prefix)
    fn string_start(&self, text: &str, index: usize) -> Option<usize>;

    /// Whether `b` closes a string
    fn is_string_end(&self, b: u8) -> bool;

    /// Char literal opener at `index`
    fn char_start(&self, text: &str, index: usize) -> Option<usize>;

    /// Whether `b` closes a char literal
    fn is_char_end(&self, b: u8) -> bool;

    /// Length of the keyword that is exactly the word at `index`
    fn keyword_len(&self, text: &str, index: usize) -> Option<usize>;

    /// Length of the type name that is exactly the word at `index`
    fn type_len(&self, text: &str, index: usize) -> Option<usize>;
}

/// A complete, data-driven language definition
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LanguageDefinition {
    /// Language name (e.g., "CSharp", "Rust")
    pub name: String,
    /// File extensions without the dot
    pub extensions: Vec<String>,
    pub keywords: HashSet<String>,
    pub types: HashSet<String>,
    /// Block comment delimiters, e.g. `["/*", "*/"]`
    pub block_comment: Option<(String, String)>,
    /// Line comment opener, e.g. `"//"`
    pub line_comment: Option<String>,
    /// Preprocessor marker, only recognised as the first non-blank on a line
    pub preprocessor: Option<char>,
    pub string_delimiter: Option<char>,
    /// Prefix that makes the following string verbatim (C# `@`)
    pub verbatim_prefix: Option<char>,
    pub char_delimiter: Option<char>,
    /// Only open a char literal when its closing delimiter is close by.
    /// Needed where the delimiter doubles as a lifetime or label marker.
    pub char_lookahead: bool,
}

impl Default for LanguageDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            extensions: Vec::new(),
            keywords: HashSet::new(),
            types: HashSet::new(),
            block_comment: None,
            line_comment: None,
            preprocessor: None,
            string_delimiter: Some('"'),
            verbatim_prefix: None,
            char_delimiter: None,
            char_lookahead: false,
        }
    }
}

/// Bytes scanned ahead for an escaped char literal's closing delimiter
const CHAR_ESCAPE_WINDOW: usize = 10;

impl LanguageDefinition {
    /// Create a new definition with only a string delimiter
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Add a file extension
    pub fn add_extension(&mut self, ext: &str) {
        self.extensions.push(ext.to_string());
    }

    /// Add keywords
    pub fn add_keywords(&mut self, words: &[&str]) {
        self.keywords.extend(words.iter().map(|w| w.to_string()));
    }

    /// Add type names
    pub fn add_types(&mut self, words: &[&str]) {
        self.types.extend(words.iter().map(|w| w.to_string()));
    }

    /// Set block comment delimiters
    pub fn set_block_comment(&mut self, open: &str, close: &str) {
        self.block_comment = Some((open.to_string(), close.to_string()));
    }

    /// Set line comment opener
    pub fn set_line_comment(&mut self, open: &str) {
        self.line_comment = Some(open.to_string());
    }

    fn byte_is(text: &str, index: usize, ch: Option<char>) -> bool {
        match (ch, text.as_bytes().get(index)) {
            (Some(ch), Some(&b)) => ch.is_ascii() && b == ch as u8,
            _ => false,
        }
    }

    fn starts_with_at(text: &str, index: usize, token: &str) -> Option<usize> {
        let bytes = text.as_bytes();
        if !token.is_empty() && index < bytes.len() && bytes[index..].starts_with(token.as_bytes()) {
            Some(token.len())
        } else {
            None
        }
    }

    /// Look for a closing char delimiter right after the opener at `index`
    fn char_closes(&self, text: &str, index: usize, delim: u8) -> bool {
        let rest = match text.get(index + 1..) {
            Some(rest) => rest,
            None => return false,
        };
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, '\\')) => rest
                .bytes()
                .skip(2)
                .take(CHAR_ESCAPE_WINDOW)
                .take_while(|&b| b != b'\n' && b != b'\r')
                .any(|b| b == delim),
            Some((_, c)) if c != '\n' && c != '\r' && c as u32 != delim as u32 => {
                chars.next().map_or(false, |(_, next)| next as u32 == delim as u32)
            }
            _ => false,
        }
    }
}

impl LexicalRules for LanguageDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn comment_block_start(&self, text: &str, index: usize) -> Option<usize> {
        let (open, _) = self.block_comment.as_ref()?;
        Self::starts_with_at(text, index, open)
    }

    fn comment_block_end(&self, text: &str, index: usize) -> Option<usize> {
        let (_, close) = self.block_comment.as_ref()?;
        Self::starts_with_at(text, index, close)
    }

    fn comment_line_start(&self, text: &str, index: usize) -> Option<usize> {
        Self::starts_with_at(text, index, self.line_comment.as_deref()?)
    }

    fn preprocessor_start(&self, text: &str, index: usize) -> bool {
        if !Self::byte_is(text, index, self.preprocessor) {
            return false;
        }
        // Only leading whitespace may precede the marker on its line
        text.as_bytes()[..index]
            .iter()
            .rev()
            .take_while(|&&b| b != b'\n' && b != b'\r')
            .all(|&b| b == b' ' || b == b'\t')
    }

    fn string_start(&self, text: &str, index: usize) -> Option<usize> {
        if self.verbatim_prefix.is_some()
            && Self::byte_is(text, index, self.verbatim_prefix)
            && Self::byte_is(text, index + 1, self.string_delimiter)
        {
            return Some(2);
        }
        Self::byte_is(text, index, self.string_delimiter).then_some(1)
    }

    fn is_string_end(&self, b: u8) -> bool {
        self.string_delimiter.map_or(false, |d| d.is_ascii() && b == d as u8)
    }

    fn char_start(&self, text: &str, index: usize) -> Option<usize> {
        if !Self::byte_is(text, index, self.char_delimiter) {
            return None;
        }
        if self.char_lookahead {
            let delim = self.char_delimiter? as u8;
            if !self.char_closes(text, index, delim) {
                return None;
            }
        }
        Some(1)
    }

    fn is_char_end(&self, b: u8) -> bool {
        self.char_delimiter.map_or(false, |d| d.is_ascii() && b == d as u8)
    }

    fn keyword_len(&self, text: &str, index: usize) -> Option<usize> {
        word_at(text, index)
            .filter(|w| self.keywords.contains(*w))
            .map(str::len)
    }

    fn type_len(&self, text: &str, index: usize) -> Option<usize> {
        word_at(text, index)
            .filter(|w| self.types.contains(*w))
            .map(str::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_language() -> LanguageDefinition {
        let mut lang = LanguageDefinition::new("Test");
        lang.add_extension("test");
        lang.add_keywords(&["if", "class", "ref"]);
        lang.add_types(&["List", "MyClass"]);
        lang.set_block_comment("/*", "*/");
        lang.set_line_comment("//");
        lang.preprocessor = Some('#');
        lang.verbatim_prefix = Some('@');
        lang.char_delimiter = Some('\'');
        lang
    }

    #[test]
    fn test_word_at() {
        assert_eq!(word_at("if (x)", 0), Some("if"));
        assert_eq!(word_at("if (x)", 2), None);
        assert_eq!(word_at("a_b1 c", 0), Some("a_b1"));
        assert_eq!(word_at("héllo x", 0), Some("héllo"));
        // Not a char boundary
        assert_eq!(word_at("é", 1), None);
        assert_eq!(word_at("", 0), None);
    }

    #[test]
    fn test_keywords_whole_word() {
        let lang = create_test_language();
        assert_eq!(lang.keyword_len("if (x)", 0), Some(2));
        assert_eq!(lang.keyword_len("iffy", 0), None);
        assert_eq!(lang.keyword_len("classy", 0), None);
        assert_eq!(lang.type_len("List<int>", 0), Some(4));
        assert_eq!(lang.type_len("Lists", 0), None);
    }

    #[test]
    fn test_comments() {
        let lang = create_test_language();
        assert_eq!(lang.comment_block_start("/* x */", 0), Some(2));
        assert_eq!(lang.comment_block_end("/* x */", 5), Some(2));
        assert_eq!(lang.comment_line_start("x // y", 2), Some(2));
        assert_eq!(lang.comment_line_start("x / y", 2), None);

        let plain = LanguageDefinition::new("Plain");
        assert_eq!(plain.comment_block_start("/* x */", 0), None);
        assert_eq!(plain.comment_line_start("// x", 0), None);
    }

    #[test]
    fn test_strings() {
        let lang = create_test_language();
        assert_eq!(lang.string_start("\"abc\"", 0), Some(1));
        assert_eq!(lang.string_start("@\"abc\"", 0), Some(2));
        assert_eq!(lang.string_start("@abc", 0), None);
        assert!(lang.is_string_end(b'"'));
        assert!(!lang.is_string_end(b'\''));
    }

    #[test]
    fn test_preprocessor_only_at_line_start() {
        let lang = create_test_language();
        assert!(lang.preprocessor_start("#region", 0));
        assert!(lang.preprocessor_start("x;\n  #if DEBUG", 5));
        assert!(!lang.preprocessor_start("x # y", 2));
    }

    #[test]
    fn test_char_lookahead() {
        let mut lang = create_test_language();
        assert_eq!(lang.char_start("'a'", 0), Some(1));
        assert_eq!(lang.char_start("'a", 0), Some(1));

        lang.char_lookahead = true;
        assert_eq!(lang.char_start("'a'", 0), Some(1));
        assert_eq!(lang.char_start("'\\n'", 0), Some(1));
        assert_eq!(lang.char_start("'\\u{1F600}'", 0), Some(1));
        assert_eq!(lang.char_start("'é'", 0), Some(1));
        // Lifetime, not a char
        assert_eq!(lang.char_start("'a>", 0), None);
        assert_eq!(lang.char_start("'static", 0), None);
    }

    #[test]
    fn test_deserialize_definition() {
        let src = r#"
            name = "Toy"
            extensions = ["toy"]
            keywords = ["if", "else"]
            types = ["Int"]
            block_comment = ["(*", "*)"]
            line_comment = "--"
        "#;
        let lang: LanguageDefinition = toml::from_str(src).unwrap();
        assert_eq!(lang.name, "Toy");
        assert_eq!(lang.comment_block_start("(* a *)", 0), Some(2));
        assert_eq!(lang.comment_line_start("-- a", 0), Some(2));
        assert_eq!(lang.keyword_len("else", 0), Some(4));
        // Default string delimiter survives
        assert_eq!(lang.string_start("\"s\"", 0), Some(1));
    }
}
