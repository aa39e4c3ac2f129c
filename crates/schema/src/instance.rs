use crate::qualifier::Qualifier;
use crate::types::CimType;
use crate::value::{write_mof_string, CimValue};
use crate::{find_named, Named};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated `instance of` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDefinition {
    pub class_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub qualifiers: Vec<Qualifier>,
    /// Assigned property values, in source order.
    pub properties: Vec<PropertyValue>,
    pub path: InstancePath,
}

impl InstanceDefinition {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        find_named(&self.properties, name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub name: String,
    pub cim_type: CimType,
    pub is_array: bool,
    pub value: Option<CimValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
}

impl Named for PropertyValue {
    fn name(&self) -> &str {
        &self.name
    }
}

/// The object path identifying an instance: namespace, class, and the
/// values of its key properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstancePath {
    pub namespace: String,
    pub class_name: String,
    pub keybindings: Vec<(String, CimValue)>,
}

impl InstancePath {
    /// Paths compare case-insensitively on namespace, class and key names.
    pub fn same_as(&self, other: &InstancePath) -> bool {
        self.namespace.eq_ignore_ascii_case(&other.namespace)
            && self.class_name.eq_ignore_ascii_case(&other.class_name)
            && self.keybindings.len() == other.keybindings.len()
            && self
                .keybindings
                .iter()
                .zip(&other.keybindings)
                .all(|((ka, va), (kb, vb))| ka.eq_ignore_ascii_case(kb) && va == vb)
    }
}

/// WBEM URI form without host: `ns:Class.Key="v",Other=1`.
impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.class_name)?;
        for (i, (key, value)) in self.keybindings.iter().enumerate() {
            f.write_str(if i == 0 { "." } else { "," })?;
            write!(f, "{}=", key)?;
            match value {
                CimValue::String(s) | CimValue::DateTime(s) | CimValue::Reference(s) => {
                    write_mof_string(f, s)?
                }
                CimValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" })?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}
