//! Language registry
//!
//! Maps language names and file extensions to shared language
//! definitions that can be handed to tokenizers on any thread.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::builtin;
use super::language::{LanguageDefinition, LexicalRules};
use crate::error::{CodeError, Result};

/// Registered languages keyed by lowercase name
pub struct LanguageRegistry {
    /// Loaded language definitions
    languages: HashMap<String, Arc<LanguageDefinition>>,
    /// Extension to language key mapping
    extension_map: HashMap<String, String>,
}

impl LanguageRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            languages: HashMap::new(),
            extension_map: HashMap::new(),
        }
    }

    /// Create a registry with the built-in languages
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for lang in builtin::all_languages() {
            registry.add_language(lang);
        }
        registry
    }

    /// Add a language definition, replacing any with the same name
    pub fn add_language(&mut self, lang: LanguageDefinition) {
        let key = lang.name.to_lowercase();
        if self.languages.contains_key(&key) {
            tracing::debug!(language = %lang.name, "replacing registered language");
            self.extension_map.retain(|_, v| *v != key);
        }
        for ext in &lang.extensions {
            self.extension_map.insert(ext.to_lowercase(), key.clone());
        }
        self.languages.insert(key, Arc::new(lang));
    }

    /// Detect language from filename
    pub fn detect_language(&self, filename: &Path) -> Option<&str> {
        let ext = filename.extension()?.to_str()?.to_lowercase();
        let key = self.extension_map.get(&ext)?;
        self.languages.get(key).map(|lang| lang.name.as_str())
    }

    /// Get a language definition by name (case-insensitive)
    pub fn get_language(&self, name: &str) -> Option<Arc<LanguageDefinition>> {
        self.languages.get(&name.to_lowercase()).cloned()
    }

    /// Get rules by name, as the tokenizer consumes them
    pub fn rules(&self, name: &str) -> Result<Arc<dyn LexicalRules>> {
        self.get_language(name)
            .map(|lang| lang as Arc<dyn LexicalRules>)
            .ok_or_else(|| CodeError::UnknownLanguage(name.to_string()))
    }

    /// Get rules for a file, falling back to plain text
    pub fn rules_for_path(&self, path: &Path) -> Arc<dyn LexicalRules> {
        let name = self.detect_language(path).unwrap_or(builtin::PLAIN).to_string();
        self.rules(&name)
            .unwrap_or_else(|_| Arc::new(builtin::plain_language()))
    }

    /// List available languages
    pub fn list_languages(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.languages.values().map(|l| l.name.as_str()).collect();
        names.sort();
        names
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl std::fmt::Debug for dyn LexicalRules {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("LexicalRules").field("name", &self.name()).finish()
        }
    }

    #[test]
    fn test_detect_language() {
        let registry = LanguageRegistry::new();

        assert_eq!(registry.detect_language(Path::new("Player.cs")), Some("CSharp"));
        assert_eq!(registry.detect_language(Path::new("main.rs")), Some("Rust"));
        assert_eq!(registry.detect_language(Path::new("main.C")), Some("C"));
        assert_eq!(registry.detect_language(Path::new("notes.txt")), Some("Plain"));
        assert_eq!(registry.detect_language(Path::new("no_extension")), None);
    }

    #[test]
    fn test_rules_lookup() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.rules("csharp").unwrap().name(), "CSharp");
        assert!(registry.rules("cobol").unwrap_err().to_string().contains("cobol"));
        assert_eq!(registry.rules_for_path(Path::new("x.unknown")).name(), "Plain");
    }

    #[test]
    fn test_override_language() {
        let mut registry = LanguageRegistry::new();
        let mut custom = LanguageDefinition::new("rust");
        custom.add_extension("rsx");
        registry.add_language(custom);

        assert_eq!(registry.detect_language(Path::new("a.rsx")), Some("rust"));
        // Old extension mapping dropped with the replaced definition
        assert_eq!(registry.detect_language(Path::new("a.rs")), None);
        assert_eq!(registry.list_languages(), vec!["C", "CSharp", "Plain", "rust"]);
    }
}
