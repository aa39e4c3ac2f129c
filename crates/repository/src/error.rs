/// All errors that can be returned by a Repository implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// An element with the same identity already exists with a different
    /// definition.
    #[error("conflict on {namespace}:{name}: {reason}")]
    Conflict {
        namespace: String,
        name: String,
        reason: String,
    },

    /// No element with the given name exists in the namespace, or a
    /// definition depends on one that does not.
    #[error("not found: {namespace}:{name}")]
    NotFound { namespace: String, name: String },

    /// A backend-specific failure (connection, protocol, serialization).
    #[error("repository transport error: {0}")]
    Transport(String),
}

impl RepositoryError {
    pub fn conflict(namespace: &str, name: &str, reason: impl Into<String>) -> Self {
        RepositoryError::Conflict {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn not_found(namespace: &str, name: &str) -> Self {
        RepositoryError::NotFound {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}
