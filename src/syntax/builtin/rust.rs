//! Rust language definition

use crate::syntax::language::LanguageDefinition;

/// Create Rust language definition
pub fn rust_language() -> LanguageDefinition {
    let mut lang = LanguageDefinition::new("Rust");
    lang.add_extension("rs");

    // Nested block comments are treated as flat
    lang.set_block_comment("/*", "*/");
    lang.set_line_comment("//");
    lang.char_delimiter = Some('\'');
    // 'a is a lifetime unless a closing quote follows
    lang.char_lookahead = true;

    lang.add_keywords(&[
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
        "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
        "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait",
        "true", "type", "unsafe", "use", "where", "while",
    ]);

    lang.add_types(&[
        "bool", "char", "f32", "f64", "i8", "i16", "i32", "i64", "i128", "isize", "str", "u8",
        "u16", "u32", "u64", "u128", "usize", "Box", "HashMap", "HashSet", "Option", "Result",
        "Rc", "Arc", "String", "Vec",
    ]);

    lang
}
