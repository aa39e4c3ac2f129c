//! Source provider abstraction for filesystem-independent compilation.
//!
//! The [`SourceProvider`] trait abstracts file I/O so the compiler can read
//! MOF sources from disk or from memory, and so include resolution can be
//! tested without touching the filesystem.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Trait that abstracts file I/O for the compilation pipeline.
///
/// Implementations provide source text reading, include path joining, and
/// path canonicalization. The latter is the identity used for cycle
/// detection and re-include tracking.
pub trait SourceProvider {
    /// Read the source text for a given path.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;

    /// Join an include path onto a base directory.
    fn resolve_include(&self, base: &Path, include: &str) -> PathBuf;

    /// Canonicalize a path. Fails when the file does not exist.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error>;

    /// Whether `path` names a readable source file.
    fn exists(&self, path: &Path) -> bool {
        self.canonicalize(path).is_ok()
    }
}

/// Default filesystem-backed source provider.
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }

    fn resolve_include(&self, base: &Path, include: &str) -> PathBuf {
        base.join(include)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        path.canonicalize()
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory source provider for embedding and testing.
///
/// Maps paths to source text. Canonicalization normalizes the path without
/// filesystem access.
pub struct InMemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    pub fn new(files: HashMap<PathBuf, String>) -> Self {
        let files = files
            .into_iter()
            .map(|(path, text)| (Self::normalize_path(&path), text))
            .collect();
        Self { files }
    }

    /// Normalize a path by resolving `.` and `..` components without
    /// touching the filesystem.
    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !components.is_empty() {
                        components.pop();
                    }
                }
                other => components.push(other),
            }
        }
        components.iter().collect()
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let normalized = Self::normalize_path(path);
        self.files.get(&normalized).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found in memory: {}", normalized.display()),
            )
        })
    }

    fn resolve_include(&self, base: &Path, include: &str) -> PathBuf {
        Self::normalize_path(&base.join(include))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        let normalized = Self::normalize_path(path);
        if self.files.contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "path not found in memory provider: {}",
                    normalized.display()
                ),
            ))
        }
    }
}
