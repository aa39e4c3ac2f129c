//! MOF rendering of schema elements.
//!
//! Only locally written information is emitted: propagated members and
//! propagated qualifiers are skipped, so the output recompiles to the same
//! element against the same superclass.

use crate::class::{ClassDefinition, Method, Parameter, Property};
use crate::instance::InstanceDefinition;
use crate::qualifier::{Qualifier, QualifierDeclaration};
use crate::types::CimType;
use crate::value::CimValue;
use std::fmt;

fn write_qualifiers(f: &mut fmt::Formatter<'_>, qualifiers: &[Qualifier]) -> fmt::Result {
    let local: Vec<&Qualifier> = qualifiers.iter().filter(|q| !q.propagated).collect();
    if local.is_empty() {
        return Ok(());
    }
    f.write_str("[")?;
    for (i, q) in local.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(&q.name)?;
        match &q.value {
            Some(CimValue::Boolean(true)) => {}
            Some(v @ CimValue::Array(_)) => write!(f, " {}", v)?,
            Some(v) => write!(f, "({})", v)?,
            None => f.write_str("(null)")?,
        }
        if !q.flavors.is_empty() {
            f.write_str(" :")?;
            for flavor in &q.flavors {
                write!(f, " {}", flavor)?;
            }
        }
    }
    f.write_str("] ")
}

fn write_array(f: &mut fmt::Formatter<'_>, is_array: bool, size: Option<u32>) -> fmt::Result {
    match (is_array, size) {
        (false, _) => Ok(()),
        (true, None) => f.write_str("[]"),
        (true, Some(n)) => write!(f, "[{}]", n),
    }
}

fn write_typed_name(f: &mut fmt::Formatter<'_>, cim_type: &CimType, name: &str) -> fmt::Result {
    write!(f, "{} {}", cim_type, name)
}

impl fmt::Display for QualifierDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "qualifier {} : {}", self.name, self.cim_type)?;
        write_array(f, self.is_array, self.array_size)?;
        if let Some(default) = &self.default {
            write!(f, " = {}", default)?;
        }
        f.write_str(", Scope(")?;
        for (i, scope) in self.scopes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", scope)?;
        }
        f.write_str(")")?;
        let flavors = self.flavor.keywords();
        if !flavors.is_empty() {
            f.write_str(", Flavor(")?;
            for (i, flavor) in flavors.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", flavor)?;
            }
            f.write_str(")")?;
        }
        f.write_str(";")
    }
}

fn write_property(f: &mut fmt::Formatter<'_>, p: &Property) -> fmt::Result {
    f.write_str("    ")?;
    write_qualifiers(f, &p.qualifiers)?;
    write_typed_name(f, &p.cim_type, &p.name)?;
    write_array(f, p.is_array, p.array_size)?;
    if let Some(default) = &p.default {
        write!(f, " = {}", default)?;
    }
    f.write_str(";\n")
}

fn write_parameter(f: &mut fmt::Formatter<'_>, p: &Parameter) -> fmt::Result {
    write_qualifiers(f, &p.qualifiers)?;
    write_typed_name(f, &p.cim_type, &p.name)?;
    write_array(f, p.is_array, p.array_size)
}

fn write_method(f: &mut fmt::Formatter<'_>, m: &Method) -> fmt::Result {
    f.write_str("    ")?;
    write_qualifiers(f, &m.qualifiers)?;
    write_typed_name(f, &m.return_type, &m.name)?;
    f.write_str("(")?;
    for (i, p) in m.parameters.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_parameter(f, p)?;
    }
    f.write_str(");\n")
}

impl fmt::Display for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_qualifiers(f, &self.qualifiers)?;
        write!(f, "class {}", self.name)?;
        if let Some(alias) = &self.alias {
            write!(f, " as ${}", alias)?;
        }
        if let Some(superclass) = &self.superclass {
            write!(f, " : {}", superclass)?;
        }
        f.write_str(" {\n")?;
        for p in self.properties.iter().filter(|p| !p.propagated) {
            write_property(f, p)?;
        }
        for m in self.methods.iter().filter(|m| !m.propagated) {
            write_method(f, m)?;
        }
        f.write_str("};")
    }
}

impl fmt::Display for InstanceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_qualifiers(f, &self.qualifiers)?;
        write!(f, "instance of {}", self.class_name)?;
        if let Some(alias) = &self.alias {
            write!(f, " as ${}", alias)?;
        }
        f.write_str(" {\n")?;
        for p in &self.properties {
            f.write_str("    ")?;
            write_qualifiers(f, &p.qualifiers)?;
            match &p.value {
                Some(v) => writeln!(f, "{} = {};", p.name, v)?,
                None => writeln!(f, "{} = null;", p.name)?,
            }
        }
        f.write_str("};")
    }
}
