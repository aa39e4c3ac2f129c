//! Repository sink: one define call per validated element.

use mofc_repository::{Repository, RepositoryError};
use mofc_schema::{ClassDefinition, InstanceDefinition, QualifierDeclaration};
use tracing::info;

use crate::ast::Provenance;
use crate::error::{CompileError, ErrorKind};

pub struct RepositorySink<'r> {
    repository: &'r dyn Repository,
}

impl<'r> RepositorySink<'r> {
    pub fn new(repository: &'r dyn Repository) -> Self {
        RepositorySink { repository }
    }

    pub fn qualifier(
        &self,
        namespace: &str,
        decl: &QualifierDeclaration,
        prov: &Provenance,
    ) -> Result<(), CompileError> {
        self.repository
            .define_qualifier_declaration(namespace, decl)
            .map_err(|e| define_error(e, prov, &decl.name))?;
        info!(namespace, qualifier = %decl.name, "defined qualifier");
        Ok(())
    }

    pub fn class(
        &self,
        namespace: &str,
        class: &ClassDefinition,
        prov: &Provenance,
    ) -> Result<(), CompileError> {
        self.repository
            .define_class(namespace, class)
            .map_err(|e| define_error(e, prov, &class.name))?;
        info!(namespace, class = %class.name, "defined class");
        Ok(())
    }

    pub fn instance(
        &self,
        namespace: &str,
        instance: &InstanceDefinition,
        prov: &Provenance,
    ) -> Result<(), CompileError> {
        self.repository
            .define_instance(namespace, instance)
            .map_err(|e| define_error(e, prov, &instance.class_name))?;
        info!(namespace, path = %instance.path, "defined instance");
        Ok(())
    }
}

/// `NotFound` during a define means the repository lacks something the
/// element depends on; it is reported as a conflict.
fn define_error(err: RepositoryError, prov: &Provenance, element: &str) -> CompileError {
    let kind = match err {
        RepositoryError::Transport(_) => ErrorKind::Transport,
        RepositoryError::Conflict { .. } | RepositoryError::NotFound { .. } => {
            ErrorKind::RepositoryConflict
        }
    };
    CompileError::new(kind, prov, err.to_string()).with_element(element)
}

/// Translate a failed lookup. `NotFound` never reaches here; lookups map it
/// to `None` first.
pub(crate) fn lookup_error(err: RepositoryError, prov: &Provenance) -> CompileError {
    let kind = match err {
        RepositoryError::Transport(_) => ErrorKind::Transport,
        _ => ErrorKind::RepositoryConflict,
    };
    CompileError::new(kind, prov, err.to_string())
}
