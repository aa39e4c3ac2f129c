use crate::types::CimType;
use crate::value::CimValue;
use crate::Named;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A flavor keyword as written in MOF source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    EnableOverride,
    DisableOverride,
    ToSubclass,
    Restricted,
    Translatable,
}

impl Flavor {
    pub fn keyword(&self) -> &'static str {
        match self {
            Flavor::EnableOverride => "EnableOverride",
            Flavor::DisableOverride => "DisableOverride",
            Flavor::ToSubclass => "ToSubclass",
            Flavor::Restricted => "Restricted",
            Flavor::Translatable => "Translatable",
        }
    }

    /// The flavor that cannot appear together with this one.
    pub fn opposite(&self) -> Option<Flavor> {
        match self {
            Flavor::EnableOverride => Some(Flavor::DisableOverride),
            Flavor::DisableOverride => Some(Flavor::EnableOverride),
            Flavor::ToSubclass => Some(Flavor::Restricted),
            Flavor::Restricted => Some(Flavor::ToSubclass),
            Flavor::Translatable => None,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The effective flavor of a qualifier.
///
/// Defaults follow the DMTF rules: overridable, propagated to subclasses,
/// not translatable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorSet {
    pub overridable: bool,
    pub to_subclass: bool,
    pub translatable: bool,
}

impl Default for FlavorSet {
    fn default() -> Self {
        FlavorSet {
            overridable: true,
            to_subclass: true,
            translatable: false,
        }
    }
}

impl FlavorSet {
    pub fn apply(&mut self, flavor: Flavor) {
        match flavor {
            Flavor::EnableOverride => self.overridable = true,
            Flavor::DisableOverride => self.overridable = false,
            Flavor::ToSubclass => self.to_subclass = true,
            Flavor::Restricted => self.to_subclass = false,
            Flavor::Translatable => self.translatable = true,
        }
    }

    /// `self` overlaid with the explicitly written flavors.
    pub fn with(mut self, flavors: &[Flavor]) -> Self {
        for f in flavors {
            self.apply(*f);
        }
        self
    }

    /// Flavor keywords that express this set relative to the defaults.
    pub fn keywords(&self) -> Vec<Flavor> {
        let mut out = Vec::new();
        if !self.overridable {
            out.push(Flavor::DisableOverride);
        }
        if !self.to_subclass {
            out.push(Flavor::Restricted);
        }
        if self.translatable {
            out.push(Flavor::Translatable);
        }
        out
    }
}

/// Schema element kinds a qualifier declaration may apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Schema,
    Class,
    Association,
    Indication,
    Qualifier,
    Property,
    Reference,
    Method,
    Parameter,
    Any,
}

impl Scope {
    pub fn keyword(&self) -> &'static str {
        match self {
            Scope::Schema => "schema",
            Scope::Class => "class",
            Scope::Association => "association",
            Scope::Indication => "indication",
            Scope::Qualifier => "qualifier",
            Scope::Property => "property",
            Scope::Reference => "reference",
            Scope::Method => "method",
            Scope::Parameter => "parameter",
            Scope::Any => "any",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A `qualifier Name : type = default, Scope(...), Flavor(...);` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifierDeclaration {
    pub name: String,
    pub cim_type: CimType,
    pub is_array: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_size: Option<u32>,
    pub default: Option<CimValue>,
    pub scopes: Vec<Scope>,
    pub flavor: FlavorSet,
}

impl QualifierDeclaration {
    /// Two declarations describe the same qualifier (name compared
    /// case-insensitively, everything else exactly).
    pub fn same_signature(&self, other: &QualifierDeclaration) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.cim_type == other.cim_type
            && self.is_array == other.is_array
            && self.array_size == other.array_size
            && self.default == other.default
            && self.flavor == other.flavor
            && self.scopes.len() == other.scopes.len()
            && self.scopes.iter().all(|s| other.scopes.contains(s))
    }
}

impl Named for QualifierDeclaration {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A qualifier applied to an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualifier {
    pub name: String,
    pub value: Option<CimValue>,
    /// Effective flavor: the declaration's flavor overlaid with `flavors`.
    pub flavor: FlavorSet,
    /// Flavor keywords written at the point of use.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flavors: Vec<Flavor>,
    /// Inherited from the superclass rather than written locally.
    #[serde(default)]
    pub propagated: bool,
}

impl Named for Qualifier {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Qualifier {
    /// Whether this qualifier is set to boolean `true`.
    pub fn is_true(&self) -> bool {
        self.value.as_ref().and_then(CimValue::as_bool).unwrap_or(false)
    }
}
