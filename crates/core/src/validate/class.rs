use mofc_schema::{position_named, CimType, ClassDefinition, Method, Parameter, Property, Scope};

use super::qualifier::{inherit_qualifiers, propagate};
use super::{Checker, Site};
use crate::ast::{
    Provenance, RawClass, RawMethod, RawParameter, RawProperty, RawQualifier, RawValue,
};
use crate::error::CompileError;
use crate::value::{coerce, Target};

/// The kind a class declares through its own `Association` or
/// `Indication` qualifier, if any.
fn declared_kind(qualifiers: &[RawQualifier]) -> Option<Scope> {
    let marks = |name: &str| {
        qualifiers.iter().any(|q| {
            q.name.eq_ignore_ascii_case(name)
                && matches!(q.value, None | Some(RawValue::Bool(true)))
        })
    };
    if marks("Association") {
        Some(Scope::Association)
    } else if marks("Indication") {
        Some(Scope::Indication)
    } else {
        None
    }
}

fn member_kind(cim_type: &CimType) -> Scope {
    if cim_type.is_reference() {
        Scope::Reference
    } else {
        Scope::Property
    }
}

fn inherit_property(p: &Property) -> Property {
    Property {
        qualifiers: propagate(&p.qualifiers),
        propagated: true,
        ..p.clone()
    }
}

fn inherit_method(m: &Method) -> Method {
    Method {
        qualifiers: propagate(&m.qualifiers),
        parameters: m
            .parameters
            .iter()
            .map(|p| Parameter {
                qualifiers: propagate(&p.qualifiers),
                ..p.clone()
            })
            .collect(),
        propagated: true,
        ..m.clone()
    }
}

fn shape(cim_type: &CimType, is_array: bool) -> String {
    if is_array {
        format!("{}[]", cim_type)
    } else {
        cim_type.to_string()
    }
}

impl<'a> Checker<'a> {
    /// Validate a class declaration against its (already resolved)
    /// superclass and build its effective definition.
    pub fn class(
        &self,
        raw: &RawClass,
        superclass: Option<&ClassDefinition>,
    ) -> Result<ClassDefinition, CompileError> {
        self.check_duplicate_features(raw)?;

        let kind = declared_kind(&raw.qualifiers)
            .or_else(|| superclass.map(ClassDefinition::kind))
            .unwrap_or(Scope::Class);
        let enclosing = [kind];
        let site = Site {
            kind,
            enclosing: &[],
            element: &raw.name,
            member: None,
        };
        let local = self.qualifiers(&raw.qualifiers, site)?;
        let qualifiers = match superclass {
            Some(sup) => inherit_qualifiers(local, &sup.qualifiers, site, &raw.prov)?,
            None => local,
        };

        let mut properties: Vec<Property> = superclass
            .map(|s| s.properties.iter().map(inherit_property).collect())
            .unwrap_or_default();
        for rp in &raw.properties {
            let inherited = position_named(&properties, &rp.name);
            let prop = self.property(
                raw,
                rp,
                inherited.and_then(|_| superclass.and_then(|s| s.property(&rp.name))),
                &enclosing,
            )?;
            match inherited {
                Some(i) => properties[i] = prop,
                None => properties.push(prop),
            }
        }

        let mut methods: Vec<Method> = superclass
            .map(|s| s.methods.iter().map(inherit_method).collect())
            .unwrap_or_default();
        for rm in &raw.methods {
            let inherited = position_named(&methods, &rm.name);
            let method = self.method(
                raw,
                rm,
                inherited.and_then(|_| superclass.and_then(|s| s.method(&rm.name))),
                &enclosing,
            )?;
            match inherited {
                Some(i) => methods[i] = method,
                None => methods.push(method),
            }
        }

        Ok(ClassDefinition {
            name: raw.name.clone(),
            superclass: superclass.map(|s| s.name.clone()),
            alias: raw.alias.clone(),
            qualifiers,
            properties,
            methods,
        })
    }

    fn check_duplicate_features(&self, raw: &RawClass) -> Result<(), CompileError> {
        let mut seen: Vec<&str> = Vec::new();
        let features = raw
            .properties
            .iter()
            .map(|p| (p.name.as_str(), &p.prov))
            .chain(raw.methods.iter().map(|m| (m.name.as_str(), &m.prov)));
        for (name, prov) in features {
            if seen.iter().any(|s| s.eq_ignore_ascii_case(name)) {
                return Err(CompileError::semantic(
                    prov,
                    &raw.name,
                    Some(name),
                    format!("feature '{}' is declared more than once", name),
                ));
            }
            seen.push(name);
        }
        for m in &raw.methods {
            for (i, p) in m.parameters.iter().enumerate() {
                if m.parameters[..i]
                    .iter()
                    .any(|q| q.name.eq_ignore_ascii_case(&p.name))
                {
                    return Err(CompileError::semantic(
                        &p.prov,
                        &raw.name,
                        Some(&m.name),
                        format!("parameter '{}' is declared more than once", p.name),
                    ));
                }
            }
        }
        Ok(())
    }

    fn property(
        &self,
        class: &RawClass,
        raw: &RawProperty,
        inherited: Option<&Property>,
        enclosing: &[Scope],
    ) -> Result<Property, CompileError> {
        let site = Site {
            kind: member_kind(&raw.cim_type),
            enclosing,
            element: &class.name,
            member: Some(&raw.name),
        };
        if let Some(base) = inherited {
            self.check_override_type(
                &base.cim_type,
                base.is_array,
                &raw.cim_type,
                raw.is_array,
                site,
                &raw.prov,
            )?;
        }

        let local = self.qualifiers(&raw.qualifiers, site)?;
        let qualifiers = match inherited {
            Some(base) => inherit_qualifiers(local, &base.qualifiers, site, &raw.prov)?,
            None => local,
        };
        let default = match &raw.default {
            Some(v) => coerce(
                v,
                Target {
                    cim_type: &raw.cim_type,
                    is_array: raw.is_array,
                    array_size: raw.array_size,
                },
                None,
            )
            .map_err(|m| {
                CompileError::semantic(
                    &raw.prov,
                    &class.name,
                    Some(&raw.name),
                    format!("default value: {}", m),
                )
            })?,
            None => inherited.and_then(|b| b.default.clone()),
        };

        Ok(Property {
            name: raw.name.clone(),
            cim_type: raw.cim_type.clone(),
            is_array: raw.is_array,
            array_size: raw.array_size,
            default,
            qualifiers,
            class_origin: class.name.clone(),
            propagated: false,
        })
    }

    fn method(
        &self,
        class: &RawClass,
        raw: &RawMethod,
        inherited: Option<&Method>,
        enclosing: &[Scope],
    ) -> Result<Method, CompileError> {
        let site = Site {
            kind: Scope::Method,
            enclosing,
            element: &class.name,
            member: Some(&raw.name),
        };
        if let Some(base) = inherited {
            if base.return_type != raw.return_type {
                return Err(CompileError::semantic(
                    &raw.prov,
                    &class.name,
                    Some(&raw.name),
                    format!(
                        "override of method '{}' changes the return type from {} to {}",
                        raw.name, base.return_type, raw.return_type
                    ),
                ));
            }
            if base.parameters.len() != raw.parameters.len() {
                return Err(CompileError::semantic(
                    &raw.prov,
                    &class.name,
                    Some(&raw.name),
                    format!(
                        "override of method '{}' has {} parameters, the inherited method has {}",
                        raw.name,
                        raw.parameters.len(),
                        base.parameters.len()
                    ),
                ));
            }
        }

        let local = self.qualifiers(&raw.qualifiers, site)?;
        let qualifiers = match inherited {
            Some(base) => inherit_qualifiers(local, &base.qualifiers, site, &raw.prov)?,
            None => local,
        };

        let mut param_enclosing = Vec::with_capacity(enclosing.len() + 1);
        param_enclosing.push(Scope::Method);
        param_enclosing.extend_from_slice(enclosing);
        let mut parameters = Vec::with_capacity(raw.parameters.len());
        for (i, rp) in raw.parameters.iter().enumerate() {
            let base = inherited.map(|m| &m.parameters[i]);
            parameters.push(self.parameter(class, raw, rp, base, &param_enclosing)?);
        }

        Ok(Method {
            name: raw.name.clone(),
            return_type: raw.return_type.clone(),
            parameters,
            qualifiers,
            class_origin: class.name.clone(),
            propagated: false,
        })
    }

    fn parameter(
        &self,
        class: &RawClass,
        method: &RawMethod,
        raw: &RawParameter,
        inherited: Option<&Parameter>,
        enclosing: &[Scope],
    ) -> Result<Parameter, CompileError> {
        let site = Site {
            kind: Scope::Parameter,
            enclosing,
            element: &class.name,
            member: Some(&method.name),
        };
        if let Some(base) = inherited {
            self.check_override_type(
                &base.cim_type,
                base.is_array,
                &raw.cim_type,
                raw.is_array,
                site,
                &raw.prov,
            )?;
        }
        let local = self.qualifiers(&raw.qualifiers, site)?;
        let qualifiers = match inherited {
            Some(base) => inherit_qualifiers(local, &base.qualifiers, site, &raw.prov)?,
            None => local,
        };
        Ok(Parameter {
            name: raw.name.clone(),
            cim_type: raw.cim_type.clone(),
            is_array: raw.is_array,
            array_size: raw.array_size,
            qualifiers,
        })
    }

    /// Same type and array-ness; a reference may narrow to a subclass of
    /// the inherited target.
    fn check_override_type(
        &self,
        base: &CimType,
        base_array: bool,
        own: &CimType,
        own_array: bool,
        site: Site<'_>,
        prov: &Provenance,
    ) -> Result<(), CompileError> {
        let compatible = base_array == own_array
            && match (base, own) {
                (CimType::Reference(to), CimType::Reference(narrowed)) => {
                    self.is_subclass_of(narrowed, to, prov)?
                }
                (a, b) => a == b,
            };
        if compatible {
            return Ok(());
        }
        Err(CompileError::semantic(
            prov,
            site.element,
            site.member,
            format!(
                "override changes the type from {} to {}",
                shape(base, base_array),
                shape(own, own_array)
            ),
        ))
    }
}
