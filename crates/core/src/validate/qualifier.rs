use mofc_schema::{CimType, CimValue, Flavor, FlavorSet, Qualifier, QualifierDeclaration};

use super::{Checker, Site};
use crate::ast::{Provenance, RawQualifier, RawQualifierDecl};
use crate::error::CompileError;
use crate::value::{coerce, Target};

fn contradiction(flavors: &[Flavor]) -> Option<(Flavor, Flavor)> {
    flavors.iter().find_map(|f| {
        f.opposite()
            .filter(|op| flavors.contains(op))
            .map(|op| (*f, op))
    })
}

impl<'a> Checker<'a> {
    pub fn qualifier_declaration(
        &self,
        raw: &RawQualifierDecl,
    ) -> Result<QualifierDeclaration, CompileError> {
        let fail = |msg: String| CompileError::semantic(&raw.prov, &raw.name, None, msg);
        if let Some((a, b)) = contradiction(&raw.flavors) {
            return Err(fail(format!("flavors {} and {} contradict each other", a, b)));
        }
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
            .map_err(|m| fail(format!("default value: {}", m)))?,
            None => None,
        };
        Ok(QualifierDeclaration {
            name: raw.name.clone(),
            cim_type: raw.cim_type.clone(),
            is_array: raw.is_array,
            array_size: raw.array_size,
            default,
            scopes: raw.scopes.clone(),
            flavor: FlavorSet::default().with(&raw.flavors),
        })
    }

    /// Resolve a written qualifier list against the declarations in scope.
    pub(crate) fn qualifiers(
        &self,
        raw: &[RawQualifier],
        site: Site<'_>,
    ) -> Result<Vec<Qualifier>, CompileError> {
        let mut out = Vec::with_capacity(raw.len());
        for (i, q) in raw.iter().enumerate() {
            let fail = |msg: String| CompileError::semantic(&q.prov, site.element, site.member, msg);

            if raw[..i].iter().any(|p| p.name.eq_ignore_ascii_case(&q.name)) {
                return Err(fail(format!("qualifier '{}' appears more than once", q.name)));
            }
            if let Some((a, b)) = contradiction(&q.flavors) {
                return Err(fail(format!(
                    "qualifier '{}': flavors {} and {} contradict each other",
                    q.name, a, b
                )));
            }
            let Some(decl) = self.lookup_qualifier(&q.name, &q.prov)? else {
                return Err(fail(format!("qualifier '{}' is not declared", q.name)));
            };
            if !self.in_scope(&decl, &site) {
                let scopes: Vec<&str> = decl.scopes.iter().map(|s| s.keyword()).collect();
                return Err(fail(format!(
                    "qualifier '{}' is not allowed on a {} (scope: {})",
                    q.name,
                    site.kind,
                    scopes.join(", ")
                )));
            }

            let value = match &q.value {
                None if decl.cim_type == CimType::Boolean && !decl.is_array => {
                    Some(CimValue::Boolean(true))
                }
                None => decl.default.clone(),
                Some(v) => coerce(
                    v,
                    Target {
                        cim_type: &decl.cim_type,
                        is_array: decl.is_array,
                        array_size: decl.array_size,
                    },
                    None,
                )
                .map_err(|m| fail(format!("qualifier '{}': {}", q.name, m)))?,
            };
            out.push(Qualifier {
                name: q.name.clone(),
                value,
                flavor: decl.flavor.with(&q.flavors),
                flavors: q.flavors.clone(),
                propagated: false,
            });
        }
        Ok(out)
    }
}

/// Combine locally written qualifiers with those inherited from the
/// overridden element. ToSubclass qualifiers not written locally are
/// appended as propagated; a local value may not differ from an inherited
/// DisableOverride one.
pub(crate) fn inherit_qualifiers(
    mut local: Vec<Qualifier>,
    inherited: &[Qualifier],
    site: Site<'_>,
    prov: &Provenance,
) -> Result<Vec<Qualifier>, CompileError> {
    let mut propagated = Vec::new();
    for parent in inherited.iter().filter(|q| q.flavor.to_subclass) {
        match local.iter().find(|q| q.name.eq_ignore_ascii_case(&parent.name)) {
            Some(own) if !parent.flavor.overridable && own.value != parent.value => {
                return Err(CompileError::semantic(
                    prov,
                    site.element,
                    site.member,
                    format!(
                        "qualifier '{}' is DisableOverride and cannot be changed from {} to {}",
                        parent.name,
                        show(&parent.value),
                        show(&own.value)
                    ),
                ));
            }
            Some(_) => {}
            None => propagated.push(Qualifier {
                propagated: true,
                ..parent.clone()
            }),
        }
    }
    local.extend(propagated);
    Ok(local)
}

/// Copies of the qualifiers that flow to a subclass.
pub(crate) fn propagate(qualifiers: &[Qualifier]) -> Vec<Qualifier> {
    qualifiers
        .iter()
        .filter(|q| q.flavor.to_subclass)
        .map(|q| Qualifier {
            propagated: true,
            ..q.clone()
        })
        .collect()
}

fn show(value: &Option<CimValue>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    }
}
