//! Built-in language definitions
//!
//! This module provides lexical policies for common C-like
//! languages, plus a plain-text fallback with no rules.

mod c;
mod csharp;
mod rust;

use super::language::LanguageDefinition;

/// Name of the rule-less fallback language
pub const PLAIN: &str = "Plain";

/// Get all built-in language definitions
pub fn all_languages() -> Vec<LanguageDefinition> {
    vec![
        csharp::csharp_language(),
        c::c_language(),
        rust::rust_language(),
        plain_language(),
    ]
}

/// Plain text: no comments, strings, keywords or directives
pub fn plain_language() -> LanguageDefinition {
    let mut lang = LanguageDefinition::new(PLAIN);
    lang.add_extension("txt");
    lang.string_delimiter = None;
    lang
}
