use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::Provenance;

/// Classification of a compilation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Semantic,
    CyclicInclude,
    IncompleteSchema,
    RepositoryConflict,
    Transport,
    Io,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Semantic => "semantic error",
            ErrorKind::CyclicInclude => "cyclic include",
            ErrorKind::IncompleteSchema => "incomplete schema",
            ErrorKind::RepositoryConflict => "repository conflict",
            ErrorKind::Transport => "transport error",
            ErrorKind::Io => "i/o error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A compilation error with the source position it was raised at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{file}:{line}:{column}: {kind}: {message}")]
pub struct CompileError {
    pub kind: ErrorKind,
    /// Name of the schema element being processed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    /// Property, method, parameter or qualifier within `element`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl CompileError {
    pub fn new(kind: ErrorKind, prov: &Provenance, message: impl Into<String>) -> Self {
        CompileError {
            kind,
            element: None,
            member: None,
            file: prov.file.clone(),
            line: prov.line,
            column: prov.column,
            message: message.into(),
        }
    }

    pub fn lexical(prov: &Provenance, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::Lexical, prov, message)
    }

    pub fn syntax(prov: &Provenance, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::Syntax, prov, message)
    }

    pub fn semantic(
        prov: &Provenance,
        element: &str,
        member: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        CompileError {
            element: Some(element.to_owned()),
            member: member.map(str::to_owned),
            ..CompileError::new(ErrorKind::Semantic, prov, message)
        }
    }

    pub fn incomplete(prov: &Provenance, element: &str, message: impl Into<String>) -> Self {
        CompileError {
            element: Some(element.to_owned()),
            ..CompileError::new(ErrorKind::IncompleteSchema, prov, message)
        }
    }

    pub fn with_element(mut self, element: &str) -> Self {
        self.element = Some(element.to_owned());
        self
    }

    /// Only semantic errors may be accumulated; all other kinds abort the
    /// compilation unit.
    pub fn is_fatal(&self) -> bool {
        self.kind != ErrorKind::Semantic
    }

    /// Serialize with every field present (null for missing ones).
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "column":  self.column,
            "element": self.element,
            "file":    self.file,
            "kind":    self.kind,
            "line":    self.line,
            "member":  self.member,
            "message": self.message,
        })
    }
}
