use mofc_schema::{
    find_named, CimValue, ClassDefinition, InstanceDefinition, InstancePath,
    PropertyValue, Scope,
};

use super::{Checker, Site};
use crate::ast::{Provenance, RawInstance};
use crate::error::CompileError;
use crate::symbols::{AliasHandle, SymbolTable};
use crate::value::{coerce, AliasRef, Target};

/// An alias reference inside one of the instance's property values.
#[derive(Debug, Clone)]
struct PendingRef {
    property: usize,
    target: AliasRef,
    prov: Provenance,
}

#[derive(Debug, Clone)]
enum KeyValue {
    /// Index into the instance's assigned properties.
    Assigned(usize),
    /// Key not assigned; the class default supplies the value.
    Default(CimValue),
}

#[derive(Debug, Clone)]
struct Key {
    name: String,
    value: KeyValue,
}

/// A validated instance whose reference values may still wait on aliases
/// that are defined later in the unit.
#[derive(Debug, Clone)]
pub struct CheckedInstance {
    pub instance: InstanceDefinition,
    pub namespace: String,
    pub prov: Provenance,
    pending: Vec<PendingRef>,
    keys: Vec<Key>,
}

impl CheckedInstance {
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Aliases this instance still waits on, with the position they are
    /// referenced at.
    pub fn unresolved(&self) -> impl Iterator<Item = (&str, &Provenance)> {
        self.pending.iter().map(|p| (p.target.alias.as_str(), &p.prov))
    }

    /// The instance path, once no key value waits on an alias.
    pub fn path(&self) -> Option<InstancePath> {
        let mut keybindings = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            let value = match &key.value {
                KeyValue::Assigned(i) => {
                    if self.pending.iter().any(|p| p.property == *i) {
                        return None;
                    }
                    self.instance.properties[*i].value.clone()?
                }
                KeyValue::Default(v) => v.clone(),
            };
            keybindings.push((key.name.clone(), value));
        }
        Some(InstancePath {
            namespace: self.namespace.clone(),
            class_name: self.instance.class_name.clone(),
            keybindings,
        })
    }

    /// Replace placeholders whose alias has a known path. Returns whether
    /// any placeholder was filled.
    pub fn fill(&mut self, symbols: &SymbolTable) -> bool {
        let before = self.pending.len();
        let properties = &mut self.instance.properties;
        self.pending.retain(|p| {
            let AliasHandle::Resolved(path) = symbols.resolve_alias(&p.target.alias) else {
                return true;
            };
            let reference = CimValue::Reference(path.to_string());
            match (&mut properties[p.property].value, p.target.index) {
                (Some(CimValue::Array(items)), Some(i)) if i < items.len() => items[i] = reference,
                (slot, None) => *slot = Some(reference),
                _ => return true,
            }
            false
        });
        self.pending.len() != before
    }

    /// The finished definition with its computed path.
    pub fn into_definition(mut self) -> Option<InstanceDefinition> {
        if !self.is_complete() {
            return None;
        }
        self.instance.path = self.path()?;
        Some(self.instance)
    }
}

impl<'a> Checker<'a> {
    /// Validate an instance against its resolved class.
    pub fn instance(
        &self,
        raw: &RawInstance,
        class: &ClassDefinition,
    ) -> Result<CheckedInstance, CompileError> {
        let kind = class.kind();
        let site = Site {
            kind,
            enclosing: &[],
            element: &class.name,
            member: None,
        };
        let qualifiers = self.qualifiers(&raw.qualifiers, site)?;
        let enclosing = [kind];

        let mut properties: Vec<PropertyValue> = Vec::with_capacity(raw.assignments.len());
        let mut pending = Vec::new();
        for a in &raw.assignments {
            let fail = |msg: String| CompileError::semantic(&a.prov, &class.name, Some(&a.name), msg);
            if find_named(&properties, &a.name).is_some() {
                return Err(fail(format!("property '{}' is assigned more than once", a.name)));
            }
            let Some(decl) = class.property(&a.name) else {
                return Err(fail(format!(
                    "class '{}' has no property '{}'",
                    class.name, a.name
                )));
            };
            let site = Site {
                kind: if decl.cim_type.is_reference() {
                    Scope::Reference
                } else {
                    Scope::Property
                },
                enclosing: &enclosing,
                element: &class.name,
                member: Some(&decl.name),
            };
            let prop_qualifiers = self.qualifiers(&a.qualifiers, site)?;

            let mut refs = Vec::new();
            let value = coerce(
                &a.value,
                Target {
                    cim_type: &decl.cim_type,
                    is_array: decl.is_array,
                    array_size: decl.array_size,
                },
                Some(&mut refs),
            )
            .map_err(|m| fail(format!("property '{}': {}", decl.name, m)))?;

            let index = properties.len();
            pending.extend(refs.into_iter().map(|target| PendingRef {
                property: index,
                target,
                prov: a.prov.clone(),
            }));
            properties.push(PropertyValue {
                name: decl.name.clone(),
                cim_type: decl.cim_type.clone(),
                is_array: decl.is_array,
                value,
                qualifiers: prop_qualifiers,
            });
        }

        let mut keys = Vec::new();
        for key in class.keys() {
            let value = match properties
                .iter()
                .position(|p| p.name.eq_ignore_ascii_case(&key.name))
            {
                Some(i) if properties[i].value.is_some() => KeyValue::Assigned(i),
                Some(_) => {
                    return Err(CompileError::semantic(
                        &raw.prov,
                        &class.name,
                        Some(&key.name),
                        format!("key property '{}' cannot be null", key.name),
                    ))
                }
                None => match &key.default {
                    Some(v) => KeyValue::Default(v.clone()),
                    None => {
                        return Err(CompileError::semantic(
                            &raw.prov,
                            &class.name,
                            Some(&key.name),
                            format!("key property '{}' has no value", key.name),
                        ))
                    }
                },
            };
            keys.push(Key {
                name: key.name.clone(),
                value,
            });
        }

        Ok(CheckedInstance {
            instance: InstanceDefinition {
                class_name: class.name.clone(),
                alias: raw.alias.clone(),
                qualifiers,
                properties,
                path: InstancePath {
                    namespace: self.namespace.to_owned(),
                    class_name: class.name.clone(),
                    keybindings: Vec::new(),
                },
            },
            namespace: self.namespace.to_owned(),
            prov: raw.prov.clone(),
            pending,
            keys,
        })
    }
}
