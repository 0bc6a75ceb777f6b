//! C/C++ language definition

use crate::syntax::language::LanguageDefinition;

/// Create C language definition (also works for C++)
pub fn c_language() -> LanguageDefinition {
    let mut lang = LanguageDefinition::new("C");
    lang.add_extension("c");
    lang.add_extension("h");
    lang.add_extension("cpp");
    lang.add_extension("hpp");
    lang.add_extension("cc");
    lang.add_extension("cxx");

    lang.set_block_comment("/*", "*/");
    lang.set_line_comment("//");
    lang.preprocessor = Some('#');
    lang.char_delimiter = Some('\'');

    lang.add_keywords(&[
        "auto", "break", "case", "const", "continue", "default", "do", "else", "enum", "extern",
        "for", "goto", "if", "inline", "register", "restrict", "return", "sizeof", "static",
        "struct", "switch", "typedef", "union", "volatile", "while",
        // C++
        "catch", "class", "constexpr", "delete", "explicit", "false", "friend", "mutable",
        "namespace", "new", "noexcept", "nullptr", "operator", "private", "protected", "public",
        "template", "this", "throw", "true", "try", "typename", "using", "virtual",
    ]);

    lang.add_types(&[
        "bool", "char", "double", "float", "int", "long", "short", "signed", "unsigned", "void",
        "size_t", "ptrdiff_t", "intptr_t", "uintptr_t", "int8_t", "int16_t", "int32_t",
        "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t", "FILE",
    ]);

    lang
}
