//! Directory scanner for source discovery.
//!
//! Walks a directory tree and reports the directories to watch and the
//! source files to load.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use super::filter::SourceFilter;

/// Result of walking one directory tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Every directory of the tree, the root included.
    pub directories: Vec<PathBuf>,
    /// Source files accepted by the filter.
    pub files: Vec<PathBuf>,
}

/// Walk `root` and collect its directories and source files.
///
/// Hidden entries below the root are skipped. With `respect_gitignore`,
/// `.gitignore` and `.ignore` files are honoured even outside a git
/// repository. Unreadable entries are logged and skipped.
#[must_use]
pub fn discover(root: &Path, filter: &SourceFilter, respect_gitignore: bool) -> Discovery {
    let mut discovery = Discovery::default();
    let mut skipped = 0_u64;
    let mut errors = 0_u64;

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .follow_links(false)
        .require_git(false)
        .git_ignore(respect_gitignore)
        .git_global(respect_gitignore)
        .git_exclude(respect_gitignore)
        .ignore(respect_gitignore)
        .parents(respect_gitignore)
        .build();

    for entry in walker {
        match entry {
            Ok(entry) => {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                let path = entry.into_path();

                if is_dir {
                    discovery.directories.push(path);
                } else if filter.is_source_file(&path) {
                    discovery.files.push(path);
                } else {
                    skipped += 1;
                }
            }
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "Error walking directory");
                errors += 1;
            }
        }
    }

    discovery.directories.sort();
    discovery.files.sort();

    tracing::debug!(
        root = %root.display(),
        directories = discovery.directories.len(),
        files = discovery.files.len(),
        skipped,
        errors,
        "Directory scan complete"
    );

    discovery
}
