//! In-memory repository for tests, the CLI, and embedding.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use mofc_schema::{find_named, position_named, ClassDefinition, InstanceDefinition, QualifierDeclaration};
use tracing::debug;

use crate::error::RepositoryError;
use crate::traits::Repository;

#[derive(Debug, Default)]
struct NamespaceStore {
    qualifiers: Vec<QualifierDeclaration>,
    classes: Vec<ClassDefinition>,
    instances: Vec<InstanceDefinition>,
}

/// A [`Repository`] holding everything in process memory.
///
/// Namespaces are created on first define and compared case-insensitively.
/// Elements are kept in definition order.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    namespaces: RwLock<HashMap<String, NamespaceStore>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, NamespaceStore>>, RepositoryError> {
        self.namespaces
            .read()
            .map_err(|e| RepositoryError::Transport(format!("repository lock poisoned: {}", e)))
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<String, NamespaceStore>>, RepositoryError> {
        self.namespaces
            .write()
            .map_err(|e| RepositoryError::Transport(format!("repository lock poisoned: {}", e)))
    }

    /// Names of all namespaces that hold at least one element.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .read()
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn qualifiers(&self, namespace: &str) -> Vec<QualifierDeclaration> {
        self.snapshot(namespace, |store| store.qualifiers.clone())
    }

    pub fn classes(&self, namespace: &str) -> Vec<ClassDefinition> {
        self.snapshot(namespace, |store| store.classes.clone())
    }

    pub fn instances(&self, namespace: &str) -> Vec<InstanceDefinition> {
        self.snapshot(namespace, |store| store.instances.clone())
    }

    fn snapshot<T>(&self, namespace: &str, f: impl Fn(&NamespaceStore) -> Vec<T>) -> Vec<T> {
        match self.read() {
            Ok(ns) => ns.get(&namespace_key(namespace)).map(f).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }
}

fn namespace_key(namespace: &str) -> String {
    namespace.trim_matches('/').to_ascii_lowercase()
}

impl Repository for InMemoryRepository {
    fn define_qualifier_declaration(
        &self,
        namespace: &str,
        decl: &QualifierDeclaration,
    ) -> Result<(), RepositoryError> {
        let mut ns = self.write()?;
        let store = ns.entry(namespace_key(namespace)).or_default();
        match find_named(&store.qualifiers, &decl.name) {
            Some(existing) if existing.same_signature(decl) => Ok(()),
            Some(_) => Err(RepositoryError::conflict(
                namespace,
                &decl.name,
                "qualifier is already declared with a different signature",
            )),
            None => {
                debug!(namespace, qualifier = %decl.name, "stored qualifier declaration");
                store.qualifiers.push(decl.clone());
                Ok(())
            }
        }
    }

    fn define_class(
        &self,
        namespace: &str,
        class: &ClassDefinition,
    ) -> Result<(), RepositoryError> {
        let mut ns = self.write()?;
        let store = ns.entry(namespace_key(namespace)).or_default();
        if let Some(superclass) = &class.superclass {
            if find_named(&store.classes, superclass).is_none() {
                return Err(RepositoryError::not_found(namespace, superclass));
            }
        }
        match position_named(&store.classes, &class.name) {
            Some(idx) if store.classes[idx] == *class => Ok(()),
            Some(_) => Err(RepositoryError::conflict(
                namespace,
                &class.name,
                "class already exists with a different definition",
            )),
            None => {
                debug!(namespace, class = %class.name, "stored class");
                store.classes.push(class.clone());
                Ok(())
            }
        }
    }

    fn define_instance(
        &self,
        namespace: &str,
        instance: &InstanceDefinition,
    ) -> Result<(), RepositoryError> {
        let mut ns = self.write()?;
        let store = ns.entry(namespace_key(namespace)).or_default();
        if find_named(&store.classes, &instance.class_name).is_none() {
            return Err(RepositoryError::not_found(namespace, &instance.class_name));
        }
        match store
            .instances
            .iter()
            .find(|existing| existing.path.same_as(&instance.path))
        {
            Some(existing) if existing == instance => Ok(()),
            Some(_) => Err(RepositoryError::conflict(
                namespace,
                &instance.path.to_string(),
                "instance already exists with different property values",
            )),
            None => {
                debug!(namespace, path = %instance.path, "stored instance");
                store.instances.push(instance.clone());
                Ok(())
            }
        }
    }

    fn lookup_class(&self, namespace: &str, name: &str) -> Result<ClassDefinition, RepositoryError> {
        let ns = self.read()?;
        ns.get(&namespace_key(namespace))
            .and_then(|store| find_named(&store.classes, name))
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(namespace, name))
    }

    fn lookup_qualifier(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<QualifierDeclaration, RepositoryError> {
        let ns = self.read()?;
        ns.get(&namespace_key(namespace))
            .and_then(|store| find_named(&store.qualifiers, name))
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(namespace, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::run_conformance_suite;

    #[test]
    fn in_memory_repository_passes_conformance() {
        let report = run_conformance_suite(InMemoryRepository::new);
        assert_eq!(report.failed, 0, "{report}");
        assert!(report.total > 0);
    }

    #[test]
    fn namespaces_are_normalized() {
        let repo = InMemoryRepository::new();
        let class = crate::conformance::make_class("CIM_Foo", None);
        repo.define_class("/root/CIMV2", &class).unwrap();
        assert_eq!(repo.namespaces(), vec!["root/cimv2".to_string()]);
        assert_eq!(repo.classes("root/cimv2").len(), 1);
    }
}
