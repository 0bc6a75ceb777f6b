//! Tokenizer state machine
//!
//! Splits text into typed blocks. The machine walks the text one byte at a
//! time; every trigger it reacts to is ASCII, so block boundaries always
//! land on UTF-8 character boundaries.
//!
//! States are [`BlockKind`] values with `Default` as the idle state:
//!
//! - `Default`: watches for comment, string, char and directive openers,
//!   line breaks, whole-word keywords and type names, and digits
//! - `CommentBlock`: runs to the closer; each physical line is its own block
//! - `CommentLine` / `PreprocessorDirective`: run to the end of the line
//! - `String` / `Char`: run to an unescaped delimiter, or the end of the line
//! - `Number`: digits plus suffix letters
//! - `Unformatted`: raw mode, only line breaks split blocks
//!
//! The machine never fails. Unterminated constructs end at the line break
//! (strings, chars) or at the end of the text (block comments).

use std::ops::Range;
use std::sync::Arc;

use super::block::{BlockSpan, Blocks};
use super::kind::BlockKind;
use super::language::{is_ident_byte, LexicalRules};
use crate::error::{CodeError, Result};

/// Length of the line terminator at `index` (LF, CRLF or bare CR)
pub fn line_end_len(bytes: &[u8], index: usize) -> Option<usize> {
    match bytes.get(index)? {
        b'\n' => Some(1),
        b'\r' if bytes.get(index + 1) == Some(&b'\n') => Some(2),
        b'\r' => Some(1),
        _ => None,
    }
}

/// Byte ranges of each line's content, terminators excluded.
///
/// Always yields at least one range, so "" is one empty line.
pub fn line_ranges(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(n) = line_end_len(bytes, i) {
            ranges.push(start..i);
            i += n;
            start = i;
        } else {
            i += 1;
        }
    }
    ranges.push(start..bytes.len());
    ranges
}

/// Check whether `text` contains any line terminator
pub fn has_line_break(text: &str) -> bool {
    text.bytes().any(|b| b == b'\n' || b == b'\r')
}

/// Cursor and mode of a tokenization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TokenizerState {
    /// Current byte position
    index: usize,
    /// Position the cursor moves to after the current step
    next_index: usize,
    /// Start of the block being accumulated
    block_start: usize,
    /// Kind of the block being accumulated
    kind: BlockKind,
    /// Previous byte was an unconsumed backslash inside a string or char
    escape: bool,
    /// Line breaks emitted so far
    line_count: usize,
}

impl TokenizerState {
    fn start(kind: BlockKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// End the current block at `end`, dropping it if empty
    fn end_block_at(&mut self, end: usize, kind: BlockKind, len: usize, out: &mut Vec<BlockSpan>) {
        let end = end.min(len);
        if end > self.block_start {
            out.push(BlockSpan {
                range: self.block_start..end,
                kind,
            });
        }
        self.block_start = end.max(self.block_start);
    }

    /// Emit a line break of `n` bytes at `at`
    fn line_break(&mut self, at: usize, n: usize, out: &mut Vec<BlockSpan>) {
        out.push(BlockSpan {
            range: at..at + n,
            kind: BlockKind::LineBreak,
        });
        self.block_start = at + n;
        self.next_index = at + n;
        self.line_count += 1;
    }

    fn at_word_start(bytes: &[u8], index: usize) -> bool {
        index == 0 || !is_ident_byte(bytes[index - 1])
    }

    /// Run one transition at `self.index`
    fn step(&mut self, text: &str, rules: &dyn LexicalRules, out: &mut Vec<BlockSpan>) {
        self.next_index = self.index + 1;
        match self.kind {
            BlockKind::CommentBlock => self.step_comment_block(text, rules, out),
            BlockKind::CommentLine | BlockKind::PreprocessorDirective => {
                self.step_to_line_end(text, out)
            }
            BlockKind::String | BlockKind::Char => self.step_quoted(text, rules, out),
            BlockKind::Number => self.step_number(text, out),
            BlockKind::Unformatted => self.step_unformatted(text, out),
            BlockKind::Default | BlockKind::Keyword | BlockKind::Type | BlockKind::LineBreak => {
                self.step_default(text, rules, out)
            }
        }
        self.index = self.next_index;
    }

    fn step_default(&mut self, text: &str, rules: &dyn LexicalRules, out: &mut Vec<BlockSpan>) {
        let bytes = text.as_bytes();
        let len = bytes.len();
        let i = self.index;

        if let Some(n) = line_end_len(bytes, i) {
            self.end_block_at(i, BlockKind::Default, len, out);
            self.line_break(i, n, out);
            self.kind = BlockKind::Default;
            return;
        }

        let opener = rules
            .comment_block_start(text, i)
            .map(|n| (n, BlockKind::CommentBlock))
            .or_else(|| rules.comment_line_start(text, i).map(|n| (n, BlockKind::CommentLine)))
            .or_else(|| rules.string_start(text, i).map(|n| (n, BlockKind::String)))
            .or_else(|| rules.char_start(text, i).map(|n| (n, BlockKind::Char)))
            .or_else(|| {
                rules
                    .preprocessor_start(text, i)
                    .then_some((1, BlockKind::PreprocessorDirective))
            });
        if let Some((n, kind)) = opener {
            self.end_block_at(i, BlockKind::Default, len, out);
            self.kind = kind;
            self.escape = false;
            self.next_index = i + n;
            return;
        }

        if !Self::at_word_start(bytes, i) {
            self.kind = BlockKind::Default;
            return;
        }

        let word = rules
            .keyword_len(text, i)
            .map(|n| (n, BlockKind::Keyword))
            .or_else(|| rules.type_len(text, i).map(|n| (n, BlockKind::Type)));
        if let Some((n, kind)) = word {
            self.end_block_at(i, BlockKind::Default, len, out);
            self.end_block_at(i + n, kind, len, out);
            self.kind = BlockKind::Default;
            self.next_index = i + n;
        } else if bytes[i].is_ascii_digit() {
            self.end_block_at(i, BlockKind::Default, len, out);
            self.kind = BlockKind::Number;
            // The Number state consumes the digit
            self.next_index = i;
        } else {
            self.kind = BlockKind::Default;
        }
    }

    fn step_comment_block(&mut self, text: &str, rules: &dyn LexicalRules, out: &mut Vec<BlockSpan>) {
        let bytes = text.as_bytes();
        let i = self.index;
        if let Some(n) = rules.comment_block_end(text, i) {
            self.end_block_at(i + n, BlockKind::CommentBlock, bytes.len(), out);
            self.kind = BlockKind::Default;
            self.next_index = i + n;
        } else if let Some(n) = line_end_len(bytes, i) {
            // Stay inside the comment; the next line starts a new block
            self.end_block_at(i, BlockKind::CommentBlock, bytes.len(), out);
            self.line_break(i, n, out);
        }
    }

    fn step_to_line_end(&mut self, text: &str, out: &mut Vec<BlockSpan>) {
        let bytes = text.as_bytes();
        let i = self.index;
        if let Some(n) = line_end_len(bytes, i) {
            self.end_block_at(i, self.kind, bytes.len(), out);
            self.line_break(i, n, out);
            self.kind = BlockKind::Default;
        }
    }

    fn step_quoted(&mut self, text: &str, rules: &dyn LexicalRules, out: &mut Vec<BlockSpan>) {
        let bytes = text.as_bytes();
        let i = self.index;
        let b = bytes[i];
        let closes = match self.kind {
            BlockKind::Char => rules.is_char_end(b),
            _ => rules.is_string_end(b),
        };

        if closes && !self.escape {
            self.end_block_at(i + 1, self.kind, bytes.len(), out);
            self.kind = BlockKind::Default;
            self.escape = false;
        } else if b == b'\\' && !self.escape {
            self.escape = true;
        } else if let Some(n) = line_end_len(bytes, i) {
            // Unterminated literal: stop at the line end
            self.end_block_at(i, self.kind, bytes.len(), out);
            self.line_break(i, n, out);
            self.kind = BlockKind::Default;
            self.escape = false;
        } else {
            self.escape = false;
        }
    }

    fn step_number(&mut self, text: &str, out: &mut Vec<BlockSpan>) {
        let bytes = text.as_bytes();
        let i = self.index;
        let so_far = &bytes[self.block_start..i];
        if !accepts_number_byte(so_far, bytes[i]) {
            self.end_block_at(i, BlockKind::Number, bytes.len(), out);
            self.kind = BlockKind::Default;
            // Re-examine this byte from Default
            self.next_index = i;
        }
    }

    fn step_unformatted(&mut self, text: &str, out: &mut Vec<BlockSpan>) {
        let bytes = text.as_bytes();
        let i = self.index;
        if let Some(n) = line_end_len(bytes, i) {
            self.end_block_at(i, BlockKind::Unformatted, bytes.len(), out);
            self.line_break(i, n, out);
        }
    }
}

/// Check whether `b` continues a number literal whose bytes so far are `so_far`
fn accepts_number_byte(so_far: &[u8], b: u8) -> bool {
    let hex = so_far.len() >= 2 && so_far[0] == b'0' && matches!(so_far[1], b'x' | b'X');
    match b {
        b'0'..=b'9' | b'_' => true,
        b'x' | b'X' => so_far == b"0",
        b'b' | b'B' => so_far == b"0" || hex,
        b'a' | b'c' | b'A' | b'C' => hex,
        // Exponent, or double suffix / hex digit
        b'e' | b'E' | b'd' | b'D' | b'f' | b'F' => true,
        b'm' | b'M' => !hex,
        _ => false,
    }
}

/// Incremental tokenizer over an owned text
pub struct Tokenizer {
    rules: Arc<dyn LexicalRules>,
    /// Unformatted text being tokenized
    text: String,
    /// Emitted blocks, cleared and reused between passes
    spans: Vec<BlockSpan>,
    state: TokenizerState,
    finished: bool,
    /// When false, only line breaks split the text
    highlight: bool,
}

impl Tokenizer {
    /// Create a tokenizer with the given language rules
    pub fn new(rules: Arc<dyn LexicalRules>) -> Self {
        Self {
            rules,
            text: String::new(),
            spans: Vec::new(),
            state: TokenizerState::start(BlockKind::Default),
            finished: false,
            highlight: true,
        }
    }

    /// Get the language rules
    pub fn rules(&self) -> &Arc<dyn LexicalRules> {
        &self.rules
    }

    /// Replace the language rules and reset the pass
    pub fn set_rules(&mut self, rules: Arc<dyn LexicalRules>) {
        self.rules = rules;
        self.clear();
    }

    /// Turn highlighting on or off and reset the pass
    pub fn set_highlight(&mut self, highlight: bool) {
        self.highlight = highlight;
        self.clear();
    }

    pub fn highlight(&self) -> bool {
        self.highlight
    }

    /// Store new text and reset all state. Does not tokenize.
    pub fn set_code(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.clear();
    }

    /// Reset cursor state and emitted blocks, keeping the text
    pub fn clear(&mut self) {
        let start = if self.highlight {
            BlockKind::Default
        } else {
            BlockKind::Unformatted
        };
        self.state = TokenizerState::start(start);
        self.spans.clear();
        self.finished = false;
    }

    /// Tokenize the rest of the text
    pub fn build_all_blocks(&mut self) {
        self.build_next_blocks(usize::MAX);
    }

    /// Tokenize until the end of the text or until `max_lines` line breaks
    /// have been emitted in this pass
    pub fn build_next_blocks(&mut self, max_lines: usize) {
        if self.finished {
            return;
        }
        let text = self.text.as_str();
        let rules = self.rules.as_ref();
        let len = text.len();
        while self.state.index < len && self.state.line_count < max_lines {
            self.state.step(text, rules, &mut self.spans);
        }
        if self.state.index >= len {
            let kind = self.state.kind;
            self.state.end_block_at(len, kind, len, &mut self.spans);
            self.finished = true;
        }
    }

    /// Replace line `line_idx` of the stored text and re-tokenize everything
    pub fn set_line(&mut self, line_idx: usize, value: &str) -> Result<()> {
        let ranges = line_ranges(&self.text);
        let range = ranges.get(line_idx).cloned().ok_or(CodeError::OutOfRange {
            index: line_idx,
            len: ranges.len(),
        })?;

        let mut patched = String::with_capacity(self.text.len() + value.len());
        patched.push_str(&self.text[..range.start]);
        patched.push_str(value);
        patched.push_str(&self.text[range.end..]);

        self.set_code(patched);
        self.build_all_blocks();
        Ok(())
    }

    /// Blocks emitted so far in this pass
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks::new(&self.text, &self.spans)
    }

    /// Get the stored text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Line breaks emitted so far in this pass
    pub fn line_count(&self) -> usize {
        self.state.line_count
    }

    /// Whether the pass has reached the end of the text
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::block::Block;
    use crate::syntax::language::LanguageDefinition;
    use pretty_assertions::assert_eq;

    fn toy_rules() -> Arc<dyn LexicalRules> {
        let mut lang = LanguageDefinition::new("Toy");
        lang.add_keywords(&["if", "class", "ref"]);
        lang.add_types(&["List", "MyClass"]);
        lang.set_block_comment("/*", "*/");
        lang.set_line_comment("//");
        lang.preprocessor = Some('#');
        lang.verbatim_prefix = Some('@');
        lang.char_delimiter = Some('\'');
        Arc::new(lang)
    }

    fn tokenize(text: &str) -> Vec<(String, BlockKind)> {
        let mut tokenizer = Tokenizer::new(toy_rules());
        tokenizer.set_code(text);
        tokenizer.build_all_blocks();
        let blocks = tokenizer.blocks();
        assert_eq!(blocks.concat(), text);
        blocks
            .iter()
            .map(|b: Block| (b.content.to_string(), b.kind))
            .collect()
    }

    fn b(content: &str, kind: BlockKind) -> (String, BlockKind) {
        (content.to_string(), kind)
    }

    #[test]
    fn test_keyword_then_default() {
        assert_eq!(
            tokenize("if (x) { }"),
            vec![b("if", BlockKind::Keyword), b(" (x) { }", BlockKind::Default)]
        );
    }

    #[test]
    fn test_keyword_must_be_whole_word() {
        assert_eq!(tokenize("iffy"), vec![b("iffy", BlockKind::Default)]);
        assert_eq!(tokenize("myif"), vec![b("myif", BlockKind::Default)]);
        assert_eq!(
            tokenize("new MyClass()"),
            vec![
                b("new ", BlockKind::Default),
                b("MyClass", BlockKind::Type),
                b("()", BlockKind::Default),
            ]
        );
    }

    #[test]
    fn test_line_comment_then_code() {
        assert_eq!(
            tokenize("// hello\nint x;"),
            vec![
                b("// hello", BlockKind::CommentLine),
                b("\n", BlockKind::LineBreak),
                b("int x;", BlockKind::Default),
            ]
        );
    }

    #[test]
    fn test_escaped_quote_in_string() {
        assert_eq!(tokenize("\"a\\\"b\""), vec![b("\"a\\\"b\"", BlockKind::String)]);
    }

    #[test]
    fn test_double_backslash_does_not_escape_quote() {
        assert_eq!(
            tokenize("\"a\\\\\" x"),
            vec![b("\"a\\\\\"", BlockKind::String), b(" x", BlockKind::Default)]
        );
    }

    #[test]
    fn test_verbatim_string() {
        assert_eq!(
            tokenize("s = @\"C:\\dir\";"),
            vec![
                b("s = ", BlockKind::Default),
                b("@\"C:\\dir\"", BlockKind::String),
                b(";", BlockKind::Default),
            ]
        );
    }

    #[test]
    fn test_multiline_block_comment() {
        assert_eq!(
            tokenize("/* multi\nline */ x"),
            vec![
                b("/* multi", BlockKind::CommentBlock),
                b("\n", BlockKind::LineBreak),
                b("line */", BlockKind::CommentBlock),
                b(" x", BlockKind::Default),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_stops_at_line_end() {
        assert_eq!(
            tokenize("\"oops\nif"),
            vec![
                b("\"oops", BlockKind::String),
                b("\n", BlockKind::LineBreak),
                b("if", BlockKind::Keyword),
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_end() {
        assert_eq!(
            tokenize("x /* never\nclosed"),
            vec![
                b("x ", BlockKind::Default),
                b("/* never", BlockKind::CommentBlock),
                b("\n", BlockKind::LineBreak),
                b("closed", BlockKind::CommentBlock),
            ]
        );
    }

    #[test]
    fn test_char_literal() {
        assert_eq!(
            tokenize("c = '\\'';"),
            vec![
                b("c = ", BlockKind::Default),
                b("'\\''", BlockKind::Char),
                b(";", BlockKind::Default),
            ]
        );
    }

    #[test]
    fn test_preprocessor_directive() {
        assert_eq!(
            tokenize("#region Foo\nx"),
            vec![
                b("#region Foo", BlockKind::PreprocessorDirective),
                b("\n", BlockKind::LineBreak),
                b("x", BlockKind::Default),
            ]
        );
    }

    #[test]
    fn test_numbers_and_suffixes() {
        assert_eq!(
            tokenize("x = 1.5f;"),
            vec![
                b("x = ", BlockKind::Default),
                b("1", BlockKind::Number),
                b(".", BlockKind::Default),
                b("5f", BlockKind::Number),
                b(";", BlockKind::Default),
            ]
        );
        assert_eq!(
            tokenize("0xFF_AB"),
            vec![b("0xFF_AB", BlockKind::Number)]
        );
        // Hex letters only continue hex literals
        assert_eq!(
            tokenize("123abc"),
            vec![b("123", BlockKind::Number), b("abc", BlockKind::Default)]
        );
        // Digits inside identifiers are not numbers
        assert_eq!(tokenize("x1"), vec![b("x1", BlockKind::Default)]);
    }

    #[test]
    fn test_suffix_letter_does_not_start_number() {
        assert_eq!(tokenize("f"), vec![b("f", BlockKind::Default)]);
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(
            tokenize("a\r\nb\rc\n"),
            vec![
                b("a", BlockKind::Default),
                b("\r\n", BlockKind::LineBreak),
                b("b", BlockKind::Default),
                b("\r", BlockKind::LineBreak),
                b("c", BlockKind::Default),
                b("\n", BlockKind::LineBreak),
            ]
        );
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(
            tokenize("// héllo\n\"ü\" if"),
            vec![
                b("// héllo", BlockKind::CommentLine),
                b("\n", BlockKind::LineBreak),
                b("\"ü\"", BlockKind::String),
                b(" ", BlockKind::Default),
                b("if", BlockKind::Keyword),
            ]
        );
    }

    #[test]
    fn test_empty_text() {
        let mut tokenizer = Tokenizer::new(toy_rules());
        tokenizer.set_code("");
        tokenizer.build_all_blocks();
        assert!(tokenizer.blocks().is_empty());
        assert_eq!(tokenizer.blocks().line_count(), 1);
        assert!(tokenizer.is_finished());
    }

    #[test]
    fn test_build_next_blocks_in_chunks() {
        let text = "a\n/* b\nc */\nd\ne";
        let mut tokenizer = Tokenizer::new(toy_rules());
        tokenizer.set_code(text);

        tokenizer.build_next_blocks(2);
        assert_eq!(tokenizer.line_count(), 2);
        assert!(!tokenizer.is_finished());

        tokenizer.build_next_blocks(3);
        assert_eq!(tokenizer.line_count(), 3);

        tokenizer.build_all_blocks();
        assert!(tokenizer.is_finished());
        assert_eq!(tokenizer.blocks().line_count(), 5);
        assert_eq!(tokenizer.blocks().concat(), text);

        // Same result as a single pass
        let chunked: Vec<_> = tokenizer.blocks().iter().map(|b| (b.content.to_string(), b.kind)).collect();
        assert_eq!(chunked, tokenize(text));
    }

    #[test]
    fn test_clear_keeps_text() {
        let mut tokenizer = Tokenizer::new(toy_rules());
        tokenizer.set_code("if x");
        tokenizer.build_all_blocks();
        tokenizer.clear();
        assert!(tokenizer.blocks().is_empty());
        assert_eq!(tokenizer.text(), "if x");
        tokenizer.build_all_blocks();
        assert_eq!(tokenizer.blocks().len(), 2);
    }

    #[test]
    fn test_set_line() {
        let mut tokenizer = Tokenizer::new(toy_rules());
        tokenizer.set_code("a\r\nb\nc");
        tokenizer.set_line(1, "// new").unwrap();
        assert_eq!(tokenizer.text(), "a\r\n// new\nc");
        assert_eq!(tokenizer.blocks().get(2).unwrap().kind, BlockKind::CommentLine);

        let err = tokenizer.set_line(3, "x").unwrap_err();
        assert!(err.is_out_of_range());
        // Text untouched on error
        assert_eq!(tokenizer.text(), "a\r\n// new\nc");
    }

    #[test]
    fn test_unformatted_mode() {
        let mut tokenizer = Tokenizer::new(toy_rules());
        tokenizer.set_highlight(false);
        tokenizer.set_code("if x // y\n\"z");
        tokenizer.build_all_blocks();
        let kinds: Vec<_> = tokenizer.blocks().iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![BlockKind::Unformatted, BlockKind::LineBreak, BlockKind::Unformatted]
        );
    }

    #[test]
    fn test_line_ranges() {
        assert_eq!(line_ranges(""), vec![0..0]);
        assert_eq!(line_ranges("a\r\nbc\r"), vec![0..1, 3..5, 6..6]);
        assert!(has_line_break("a\rb"));
        assert!(!has_line_break("ab"));
    }
}
