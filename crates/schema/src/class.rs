use crate::qualifier::{Qualifier, Scope};
use crate::types::CimType;
use crate::value::CimValue;
use crate::{find_named, Named};
use serde::{Deserialize, Serialize};

/// A validated CIM class.
///
/// `properties` and `methods` hold the effective member set: members
/// inherited from the superclass (`propagated == true`) in superclass
/// order, with overrides replacing them in place, followed by members
/// introduced by this class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub name: String,
    pub superclass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub qualifiers: Vec<Qualifier>,
    pub properties: Vec<Property>,
    pub methods: Vec<Method>,
}

impl ClassDefinition {
    pub fn property(&self, name: &str) -> Option<&Property> {
        find_named(&self.properties, name)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        find_named(&self.methods, name)
    }

    pub fn qualifier(&self, name: &str) -> Option<&Qualifier> {
        find_named(&self.qualifiers, name)
    }

    /// The scope kind of this class: association and indication classes are
    /// marked by the qualifier of the same name.
    pub fn kind(&self) -> Scope {
        if self.qualifier("Association").is_some_and(Qualifier::is_true) {
            Scope::Association
        } else if self.qualifier("Indication").is_some_and(Qualifier::is_true) {
            Scope::Indication
        } else {
            Scope::Class
        }
    }

    /// Properties qualified `Key`, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.is_key())
    }
}

impl Named for ClassDefinition {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub cim_type: CimType,
    pub is_array: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_size: Option<u32>,
    pub default: Option<CimValue>,
    pub qualifiers: Vec<Qualifier>,
    /// Class that introduced or last overrode this property.
    pub class_origin: String,
    pub propagated: bool,
}

impl Property {
    pub fn qualifier(&self, name: &str) -> Option<&Qualifier> {
        find_named(&self.qualifiers, name)
    }

    pub fn is_key(&self) -> bool {
        self.qualifier("Key").is_some_and(Qualifier::is_true)
    }
}

impl Named for Property {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub return_type: CimType,
    pub parameters: Vec<Parameter>,
    pub qualifiers: Vec<Qualifier>,
    pub class_origin: String,
    pub propagated: bool,
}

impl Method {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        find_named(&self.parameters, name)
    }
}

impl Named for Method {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub cim_type: CimType,
    pub is_array: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_size: Option<u32>,
    pub qualifiers: Vec<Qualifier>,
}

impl Named for Parameter {
    fn name(&self) -> &str {
        &self.name
    }
}
