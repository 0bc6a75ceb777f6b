//! C# language definition

use crate::syntax::language::LanguageDefinition;

/// Create C# language definition
pub fn csharp_language() -> LanguageDefinition {
    let mut lang = LanguageDefinition::new("CSharp");
    lang.add_extension("cs");

    lang.set_block_comment("/*", "*/");
    lang.set_line_comment("//");
    // #region, #if, #pragma ...
    lang.preprocessor = Some('#');
    // @"verbatim"
    lang.verbatim_prefix = Some('@');
    lang.char_delimiter = Some('\'');

    lang.add_keywords(&[
        "abstract", "as", "base", "break", "case", "catch", "checked", "class", "const",
        "continue", "default", "delegate", "do", "else", "enum", "event", "explicit", "extern",
        "false", "finally", "fixed", "for", "foreach", "get", "goto", "if", "implicit", "in",
        "interface", "internal", "is", "lock", "namespace", "new", "null", "operator", "out",
        "override", "params", "partial", "private", "protected", "public", "readonly", "ref",
        "return", "sealed", "set", "sizeof", "stackalloc", "static", "struct", "switch", "this",
        "throw", "true", "try", "typeof", "unchecked", "unsafe", "using", "value", "var",
        "virtual", "void", "volatile", "where", "while", "yield", "async", "await",
    ]);

    lang.add_types(&[
        "bool", "byte", "char", "decimal", "double", "float", "int", "long", "object", "sbyte",
        "short", "string", "uint", "ulong", "ushort", "Boolean", "Byte", "Char", "DateTime",
        "Decimal", "Dictionary", "Double", "Exception", "Func", "Action", "HashSet", "IEnumerable",
        "IEnumerator", "Int32", "Int64", "List", "Object", "Single", "String", "StringBuilder",
        "Task", "Type",
    ]);

    lang
}
