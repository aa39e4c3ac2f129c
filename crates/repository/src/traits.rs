use mofc_schema::{ClassDefinition, InstanceDefinition, QualifierDeclaration};

use crate::error::RepositoryError;

/// The store a MOF compilation defines its elements into.
///
/// ## Define semantics
///
/// Every `define_*` call is idempotent: defining an element identical to
/// the stored one succeeds without change. Defining an element whose
/// identity (qualifier name, class name, instance path) is already taken by
/// a different definition returns `Err(RepositoryError::Conflict)`.
/// Identities are compared case-insensitively.
///
/// A class whose superclass is not stored, and an instance whose class is
/// not stored, are rejected with `Err(RepositoryError::NotFound)`.
///
/// ## Lookups
///
/// `lookup_*` return `Err(RepositoryError::NotFound)` for unknown names.
/// Classes are returned with their effective (inherited) member set, as
/// they were defined.
///
/// ## Thread Safety
///
/// Methods take `&self` and implementations must be `Send + Sync`, so
/// independent compilations may share one repository. Calls are blocking;
/// the compiler never retries.
pub trait Repository: Send + Sync {
    /// Define a qualifier declaration in `namespace`.
    fn define_qualifier_declaration(
        &self,
        namespace: &str,
        decl: &QualifierDeclaration,
    ) -> Result<(), RepositoryError>;

    /// Define a class in `namespace`.
    fn define_class(&self, namespace: &str, class: &ClassDefinition)
        -> Result<(), RepositoryError>;

    /// Define an instance in `namespace`, identified by its path.
    fn define_instance(
        &self,
        namespace: &str,
        instance: &InstanceDefinition,
    ) -> Result<(), RepositoryError>;

    /// Fetch a class by name.
    fn lookup_class(&self, namespace: &str, name: &str) -> Result<ClassDefinition, RepositoryError>;

    /// Fetch a qualifier declaration by name.
    fn lookup_qualifier(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<QualifierDeclaration, RepositoryError>;
}
