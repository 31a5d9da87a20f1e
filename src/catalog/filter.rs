//! Source file filtering by extension.

use std::path::Path;

/// Extensions loaded when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["ttl"];

/// Decides which files are RDF sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilter {
    extensions: Vec<String>,
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl SourceFilter {
    /// Create a filter accepting the given extensions.
    ///
    /// Extensions are matched case-insensitively; a leading dot is ignored.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions: Vec<String> = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        extensions.sort();
        extensions.dedup();
        Self { extensions }
    }

    /// Accepted extensions, lowercased.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Check if a path names a source file.
    ///
    /// Only the name is inspected, so this also answers for paths that no
    /// longer exist.
    #[must_use]
    pub fn is_source_file(&self, path: &Path) -> bool {
        if Self::is_hidden(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
    }

    /// Check if the final path component is a dotfile.
    #[must_use]
    pub fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with('.'))
    }
}
