//! Compilation context: the active namespace, locales, and include stack.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

#[derive(Debug, Clone)]
pub struct CompilationContext {
    pub namespace: String,
    pub locale: Option<String>,
    pub instance_locale: Option<String>,
    /// Canonical paths of the files being compiled, outermost first.
    pub include_stack: Vec<PathBuf>,
    /// Canonical paths of files compiled to the end.
    pub completed: HashSet<PathBuf>,
}

/// State saved on entering a file and restored when it is left.
#[derive(Debug)]
#[must_use = "pass the scope back to leave_file"]
pub struct FileScope {
    path: PathBuf,
    namespace: String,
    locale: Option<String>,
    instance_locale: Option<String>,
}

impl CompilationContext {
    pub fn new(namespace: &str) -> Self {
        CompilationContext {
            namespace: namespace.to_owned(),
            locale: None,
            instance_locale: None,
            include_stack: Vec::new(),
            completed: HashSet::new(),
        }
    }

    /// Whether `path` is open on the include stack.
    pub fn is_active(&self, path: &Path) -> bool {
        self.include_stack.iter().any(|p| p == path)
    }

    pub fn is_completed(&self, path: &Path) -> bool {
        self.completed.contains(path)
    }

    /// Directory of the innermost open file.
    pub fn current_dir(&self) -> Option<&Path> {
        self.include_stack.last().and_then(|p| p.parent())
    }

    /// The include chain from the first occurrence of `path` back to it,
    /// e.g. `x.mof -> y.mof -> x.mof`.
    pub fn cycle_chain(&self, path: &Path) -> String {
        let start = self
            .include_stack
            .iter()
            .position(|p| p == path)
            .unwrap_or(0);
        self.include_stack[start..]
            .iter()
            .chain(std::iter::once(&path.to_path_buf()))
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn enter_file(&mut self, path: PathBuf) -> FileScope {
        debug!(file = %path.display(), depth = self.include_stack.len(), "entering file");
        self.include_stack.push(path.clone());
        FileScope {
            path,
            namespace: self.namespace.clone(),
            locale: self.locale.clone(),
            instance_locale: self.instance_locale.clone(),
        }
    }

    /// Pop the file and restore the includer's namespace and locales.
    /// The file is marked completed only when `finished` is set.
    pub fn leave_file(&mut self, scope: FileScope, finished: bool) {
        debug!(file = %scope.path.display(), "leaving file");
        if let Some(pos) = self.include_stack.iter().rposition(|p| *p == scope.path) {
            self.include_stack.truncate(pos);
        }
        self.namespace = scope.namespace;
        self.locale = scope.locale;
        self.instance_locale = scope.instance_locale;
        if finished {
            self.completed.insert(scope.path);
        }
    }
}
