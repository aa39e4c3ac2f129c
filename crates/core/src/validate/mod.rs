//! Semantic validation of parsed productions.
//!
//! A [`Checker`] turns raw productions into schema elements against the
//! unit's symbol table and the repository. Each check either returns the
//! validated element or a `Semantic` [`CompileError`] naming the element,
//! the member, and the rule that failed.

mod class;
mod instance;
mod qualifier;

pub use instance::CheckedInstance;

use mofc_repository::Repository;
use mofc_schema::{ClassDefinition, QualifierDeclaration, Scope};

use crate::ast::Provenance;
use crate::error::CompileError;
use crate::sink;
use crate::symbols::SymbolTable;

/// Where a qualifier list is applied.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Site<'s> {
    pub kind: Scope,
    /// Kinds of the enclosing elements, innermost first.
    pub enclosing: &'s [Scope],
    pub element: &'s str,
    pub member: Option<&'s str>,
}

pub struct Checker<'a> {
    pub symbols: &'a SymbolTable,
    pub repository: &'a dyn Repository,
    pub namespace: &'a str,
    /// Only `any` and the element's own kind satisfy a qualifier scope.
    pub strict_scope: bool,
}

const MAX_DEPTH: usize = 256;

/// `Scope(class)` also covers associations and indications.
fn scope_covers(scope: Scope, kind: Scope) -> bool {
    scope == kind
        || (scope == Scope::Class && matches!(kind, Scope::Association | Scope::Indication))
}

impl<'a> Checker<'a> {
    fn in_scope(&self, decl: &QualifierDeclaration, site: &Site<'_>) -> bool {
        decl.scopes.iter().any(|s| {
            *s == Scope::Any
                || scope_covers(*s, site.kind)
                || (!self.strict_scope && site.enclosing.iter().any(|e| scope_covers(*s, *e)))
        })
    }

    fn lookup_qualifier(
        &self,
        name: &str,
        prov: &Provenance,
    ) -> Result<Option<QualifierDeclaration>, CompileError> {
        self.symbols
            .lookup_qualifier(self.repository, self.namespace, name)
            .map_err(|e| sink::lookup_error(e, prov))
    }

    fn lookup_class(
        &self,
        name: &str,
        prov: &Provenance,
    ) -> Result<Option<ClassDefinition>, CompileError> {
        self.symbols
            .lookup_class(self.repository, self.namespace, name)
            .map_err(|e| sink::lookup_error(e, prov))
    }

    /// Whether `class` is `ancestor` or inherits from it.
    fn is_subclass_of(
        &self,
        class: &str,
        ancestor: &str,
        prov: &Provenance,
    ) -> Result<bool, CompileError> {
        let mut current = class.to_owned();
        for _ in 0..MAX_DEPTH {
            if current.eq_ignore_ascii_case(ancestor) {
                return Ok(true);
            }
            match self.lookup_class(&current, prov)? {
                Some(ClassDefinition {
                    superclass: Some(parent),
                    ..
                }) => current = parent,
                _ => return Ok(false),
            }
        }
        Ok(false)
    }
}
