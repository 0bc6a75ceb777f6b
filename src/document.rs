//! Documents - a line cache bound to a file on disk

use std::fs;
use std::path::{Path, PathBuf};

use crate::code::{Code, LineTerminator};
use crate::config::Config;
use crate::error::{CodeError, Result};
use crate::syntax::{line_end_len, LanguageRegistry};

/// A file loaded into a [`Code`] cache
#[derive(Debug)]
pub struct Document {
    /// Tokenized lines
    code: Code,
    /// Display name (file name without directories)
    name: String,
    /// Associated file path (None for scratch documents)
    path: Option<PathBuf>,
    /// Whether the document has unsaved changes
    modified: bool,
    /// Whether the file ended with a line terminator
    trailing_newline: bool,
}

/// Strip one trailing terminator, returning whether there was one
fn strip_trailing_terminator(text: &mut String) -> bool {
    let bytes = text.as_bytes();
    let cut = match bytes.len() {
        0 => None,
        n if n >= 2 && &bytes[n - 2..] == b"\r\n" => Some(n - 2),
        n if line_end_len(bytes, n - 1).is_some() => Some(n - 1),
        _ => None,
    };
    match cut {
        Some(at) => {
            text.truncate(at);
            true
        }
        None => false,
    }
}

impl Document {
    /// Create an empty scratch document
    pub fn scratch(code: Code) -> Self {
        Self {
            code,
            name: "*scratch*".to_string(),
            path: None,
            modified: false,
            trailing_newline: false,
        }
    }

    /// Open and fully tokenize `path`.
    ///
    /// `language` overrides detection by file extension.
    pub fn open(
        path: &Path,
        registry: &LanguageRegistry,
        config: &Config,
        language: Option<&str>,
    ) -> Result<Self> {
        let (mut doc, text) = Self::open_deferred(path, registry, config, language)?;
        doc.code.build(&text);
        Ok(doc)
    }

    /// Open `path` without tokenizing it.
    ///
    /// Returns the document with an empty cache plus the text to build,
    /// so the caller can build it progressively or in the background.
    pub fn open_deferred(
        path: &Path,
        registry: &LanguageRegistry,
        config: &Config,
        language: Option<&str>,
    ) -> Result<(Self, String)> {
        let mut text = fs::read_to_string(path)?;
        let rules = match language {
            Some(name) => registry.rules(name)?,
            None => registry.rules_for_path(path),
        };

        let mut code = Code::new(rules, config.formatter());
        code.set_terminator(LineTerminator::detect(&text).unwrap_or_else(|| config.terminator()));
        code.set_tab_width(config.tab_width);
        if !config.highlight {
            code.set_highlight(false);
        }

        let trailing_newline = strip_trailing_terminator(&mut text);
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());

        tracing::info!(
            path = %path.display(),
            language = code.rules().name(),
            bytes = text.len(),
            "opened document"
        );

        Ok((
            Self {
                code,
                name,
                path: Some(path.to_path_buf()),
                modified: false,
                trailing_newline,
            },
            text,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Check if document has unsaved changes
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn code_mut(&mut self) -> &mut Code {
        &mut self.code
    }

    /// Swap in a cache built elsewhere (e.g. on a worker thread)
    pub fn replace_code(&mut self, code: Code) {
        self.code = code;
    }

    /// Replace line `index`, rebuilding so multi-line constructs settle
    pub fn set_line(&mut self, index: usize, value: &str) -> Result<()> {
        self.code.set_line(index, value, true)?;
        self.modified = true;
        Ok(())
    }

    /// Insert a line before `index`
    pub fn insert_above(&mut self, index: usize, value: &str) -> Result<()> {
        self.code.insert_at(index, value, true)?;
        self.modified = true;
        Ok(())
    }

    /// Insert a line after `index`
    pub fn insert_below(&mut self, index: usize, value: &str) -> Result<()> {
        if index >= self.code.len() {
            return Err(CodeError::OutOfRange {
                index,
                len: self.code.len(),
            });
        }
        self.code.insert_at(index + 1, value, true)?;
        self.modified = true;
        Ok(())
    }

    /// Delete line `index`
    pub fn delete_line(&mut self, index: usize) -> Result<()> {
        self.code.remove_at(index, true)?;
        self.modified = true;
        Ok(())
    }

    /// File contents as they would be saved
    pub fn contents(&self) -> String {
        let mut out = self.code.to_string();
        if self.trailing_newline {
            out.push_str(self.code.terminator().as_str());
        }
        out
    }

    /// Write to the associated path
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| CodeError::Message("no file name set".to_string()))?;
        self.write_to(&path)
    }

    /// Write to `path` and make it the associated path
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        self.write_to(path)?;
        self.name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn write_to(&mut self, path: &Path) -> Result<()> {
        self.code.finish();
        fs::write(path, self.contents())?;
        self.modified = false;
        tracing::info!(path = %path.display(), lines = self.code.len(), "saved document");
        Ok(())
    }
}
