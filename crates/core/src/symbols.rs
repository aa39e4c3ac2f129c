//! Symbol & namespace table for one compilation unit.
//!
//! Qualifier declarations and classes are kept per namespace and looked up
//! case-insensitively, falling back to the repository. Instance aliases are
//! unit-wide. Classes and instances whose superclass or class is not known
//! yet are parked here until it is declared.

use std::collections::HashMap;

use mofc_repository::{Repository, RepositoryError};
use mofc_schema::{find_named, ClassDefinition, InstancePath, QualifierDeclaration};

use crate::ast::{Provenance, RawClass, RawInstance};

/// Outcome of declaring an element in the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declared {
    New,
    /// An identical element was already declared; nothing changed.
    Unchanged,
}

/// Result of looking up an alias before the unit is complete.
#[derive(Debug, Clone, PartialEq)]
pub enum AliasHandle {
    Resolved(InstancePath),
    /// Not (yet) known; resolved in phase two.
    Deferred(String),
}

#[derive(Debug, Clone)]
struct AliasEntry {
    path: Option<InstancePath>,
    prov: Provenance,
}

/// A production waiting for a class that is not declared yet.
#[derive(Debug, Clone)]
pub enum Waiting {
    Class(RawClass),
    Instance(RawInstance),
}

#[derive(Debug, Clone)]
pub struct Parked {
    pub namespace: String,
    /// The class the item waits for, as written.
    pub missing: String,
    pub item: Waiting,
}

pub(crate) fn namespace_key(namespace: &str) -> String {
    namespace.trim_matches('/').to_ascii_lowercase()
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    qualifiers: HashMap<String, Vec<QualifierDeclaration>>,
    classes: HashMap<String, Vec<ClassDefinition>>,
    aliases: HashMap<String, AliasEntry>,
    parked: Vec<Parked>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Qualifier declarations ──────────────────

    pub fn declare_qualifier(
        &mut self,
        namespace: &str,
        decl: &QualifierDeclaration,
    ) -> Result<Declared, String> {
        let decls = self.qualifiers.entry(namespace_key(namespace)).or_default();
        match find_named(decls, &decl.name) {
            Some(existing) if existing.same_signature(decl) => Ok(Declared::Unchanged),
            Some(existing) => Err(format!(
                "qualifier '{}' is already declared with a different signature ({})",
                decl.name, existing
            )),
            None => {
                decls.push(decl.clone());
                Ok(Declared::New)
            }
        }
    }

    pub fn unit_qualifier(&self, namespace: &str, name: &str) -> Option<&QualifierDeclaration> {
        self.qualifiers
            .get(&namespace_key(namespace))
            .and_then(|decls| find_named(decls, name))
    }

    /// The unit's declaration, else the repository's.
    pub fn lookup_qualifier(
        &self,
        repository: &dyn Repository,
        namespace: &str,
        name: &str,
    ) -> Result<Option<QualifierDeclaration>, RepositoryError> {
        if let Some(decl) = self.unit_qualifier(namespace, name) {
            return Ok(Some(decl.clone()));
        }
        not_found_as_none(repository.lookup_qualifier(namespace, name))
    }

    // ── Classes ─────────────────────────────────

    pub fn declare_class(
        &mut self,
        namespace: &str,
        class: &ClassDefinition,
    ) -> Result<Declared, String> {
        let classes = self.classes.entry(namespace_key(namespace)).or_default();
        match find_named(classes, &class.name) {
            Some(existing) if existing == class => Ok(Declared::Unchanged),
            Some(_) => Err(format!(
                "class '{}' is already defined with a different definition",
                class.name
            )),
            None => {
                classes.push(class.clone());
                Ok(Declared::New)
            }
        }
    }

    pub fn unit_class(&self, namespace: &str, name: &str) -> Option<&ClassDefinition> {
        self.classes
            .get(&namespace_key(namespace))
            .and_then(|classes| find_named(classes, name))
    }

    /// The unit's class, else the repository's.
    pub fn lookup_class(
        &self,
        repository: &dyn Repository,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ClassDefinition>, RepositoryError> {
        if let Some(class) = self.unit_class(namespace, name) {
            return Ok(Some(class.clone()));
        }
        not_found_as_none(repository.lookup_class(namespace, name))
    }

    // ── Aliases ─────────────────────────────────

    /// Register `$name`. Redefining it from the same source position (a
    /// recompiled include) updates the entry; anywhere else it is an error.
    pub fn define_alias(
        &mut self,
        name: &str,
        path: Option<InstancePath>,
        prov: &Provenance,
    ) -> Result<(), String> {
        let key = name.to_ascii_lowercase();
        match self.aliases.get_mut(&key) {
            Some(entry) if entry.prov == *prov => {
                if path.is_some() {
                    entry.path = path;
                }
                Ok(())
            }
            Some(entry) => Err(format!(
                "alias ${} is already defined at {}",
                name, entry.prov
            )),
            None => {
                self.aliases.insert(
                    key,
                    AliasEntry {
                        path,
                        prov: prov.clone(),
                    },
                );
                Ok(())
            }
        }
    }

    /// Record the path of an alias whose instance has just been completed.
    pub fn set_alias_path(&mut self, name: &str, path: InstancePath) {
        if let Some(entry) = self.aliases.get_mut(&name.to_ascii_lowercase()) {
            entry.path = Some(path);
        }
    }

    pub fn resolve_alias(&self, name: &str) -> AliasHandle {
        match self
            .aliases
            .get(&name.to_ascii_lowercase())
            .and_then(|e| e.path.as_ref())
        {
            Some(path) => AliasHandle::Resolved(path.clone()),
            None => AliasHandle::Deferred(name.to_owned()),
        }
    }

    pub fn is_alias_defined(&self, name: &str) -> bool {
        self.aliases.contains_key(&name.to_ascii_lowercase())
    }

    // ── Pending forward references ──────────────

    pub fn park(&mut self, namespace: &str, missing: &str, item: Waiting) {
        self.parked.push(Parked {
            namespace: namespace.to_owned(),
            missing: missing.to_owned(),
            item,
        });
    }

    /// Remove and return everything waiting on `class` in `namespace`, in
    /// the order it was parked.
    pub fn release(&mut self, namespace: &str, class: &str) -> Vec<Parked> {
        let ns = namespace_key(namespace);
        let (ready, waiting): (Vec<Parked>, Vec<Parked>) =
            std::mem::take(&mut self.parked).into_iter().partition(|p| {
                namespace_key(&p.namespace) == ns && p.missing.eq_ignore_ascii_case(class)
            });
        self.parked = waiting;
        ready
    }

    /// Drain everything still waiting at end of unit.
    pub fn take_parked(&mut self) -> Vec<Parked> {
        std::mem::take(&mut self.parked)
    }
}

fn not_found_as_none<T>(result: Result<T, RepositoryError>) -> Result<Option<T>, RepositoryError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mofc_repository::InMemoryRepository;
    use mofc_schema::{CimType, FlavorSet, Scope};

    fn decl(name: &str, cim_type: CimType) -> QualifierDeclaration {
        QualifierDeclaration {
            name: name.into(),
            cim_type,
            is_array: false,
            array_size: None,
            default: None,
            scopes: vec![Scope::Any],
            flavor: FlavorSet::default(),
        }
    }

    fn class(name: &str) -> ClassDefinition {
        ClassDefinition {
            name: name.into(),
            superclass: None,
            alias: None,
            qualifiers: vec![],
            properties: vec![],
            methods: vec![],
        }
    }

    fn prov(line: u32) -> Provenance {
        Provenance::new("a.mof", line, 1)
    }

    #[test]
    fn qualifier_redeclaration() {
        let mut t = SymbolTable::new();
        assert_eq!(t.declare_qualifier("root", &decl("Key", CimType::Boolean)), Ok(Declared::New));
        assert_eq!(
            t.declare_qualifier("ROOT", &decl("KEY", CimType::Boolean)),
            Ok(Declared::Unchanged)
        );
        assert!(t.declare_qualifier("root", &decl("key", CimType::String)).is_err());
        assert!(t.unit_qualifier("root/other", "Key").is_none());
    }

    #[test]
    fn class_lookup_falls_back_to_repository() {
        let repo = InMemoryRepository::new();
        repo.define_class("root", &class("CIM_Stored")).unwrap();
        let mut t = SymbolTable::new();
        t.declare_class("root", &class("CIM_Local")).unwrap();

        assert!(t.lookup_class(&repo, "root", "cim_local").unwrap().is_some());
        assert!(t.lookup_class(&repo, "root", "CIM_STORED").unwrap().is_some());
        assert!(t.lookup_class(&repo, "root", "CIM_Missing").unwrap().is_none());
    }

    #[test]
    fn aliases_are_unique_per_unit() {
        let mut t = SymbolTable::new();
        t.define_alias("Foo", None, &prov(1)).unwrap();
        assert_eq!(t.resolve_alias("foo"), AliasHandle::Deferred("foo".into()));
        assert!(t.define_alias("FOO", None, &prov(2)).is_err());

        let path = InstancePath {
            namespace: "root".into(),
            class_name: "CIM_Foo".into(),
            keybindings: vec![],
        };
        t.define_alias("Foo", Some(path.clone()), &prov(1)).unwrap();
        assert_eq!(t.resolve_alias("Foo"), AliasHandle::Resolved(path));
    }

    #[test]
    fn parked_items_are_released_by_class_name() {
        let mut t = SymbolTable::new();
        let raw = RawClass {
            qualifiers: vec![],
            name: "CIM_Sub".into(),
            alias: None,
            superclass: Some("CIM_Base".into()),
            properties: vec![],
            methods: vec![],
            prov: prov(1),
        };
        t.park("root", "CIM_Base", Waiting::Class(raw));
        assert!(t.release("root/other", "CIM_Base").is_empty());
        assert_eq!(t.release("root", "cim_base").len(), 1);
        assert!(t.take_parked().is_empty());
    }
}
