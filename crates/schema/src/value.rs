use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed CIM value. `NULL` is modelled as `Option::None` by the owner;
/// an empty array is `Array(vec![])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CimValue {
    Boolean(bool),
    Char16(char),
    String(String),
    DateTime(String),
    UInt(u64),
    SInt(i64),
    Real(f64),
    /// Object path of the referenced instance or class.
    Reference(String),
    Array(Vec<CimValue>),
}

impl CimValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CimValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Write `s` as a MOF string literal.
pub(crate) fn write_mof_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        write_escaped(f, c, '"')?;
    }
    f.write_str("\"")
}

fn write_escaped(f: &mut fmt::Formatter<'_>, c: char, quote: char) -> fmt::Result {
    match c {
        '\\' => f.write_str("\\\\"),
        '\n' => f.write_str("\\n"),
        '\t' => f.write_str("\\t"),
        '\r' => f.write_str("\\r"),
        '\u{8}' => f.write_str("\\b"),
        '\u{c}' => f.write_str("\\f"),
        c if c == quote => write!(f, "\\{}", c),
        c if (c as u32) < 0x20 || c as u32 == 0x7f => write!(f, "\\x{:04X}", c as u32),
        c => write!(f, "{}", c),
    }
}

/// Reals always render with a fractional part so they lex back as reals.
fn write_real(f: &mut fmt::Formatter<'_>, r: f64) -> fmt::Result {
    let s = format!("{:?}", r);
    match s.find(['e', 'E']) {
        Some(pos) if !s[..pos].contains('.') => write!(f, "{}.0{}", &s[..pos], &s[pos..]),
        _ => f.write_str(&s),
    }
}

/// Renders the value as a MOF initializer.
impl fmt::Display for CimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CimValue::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            CimValue::Char16(c) => {
                f.write_str("'")?;
                write_escaped(f, *c, '\'')?;
                f.write_str("'")
            }
            CimValue::String(s) | CimValue::DateTime(s) | CimValue::Reference(s) => {
                write_mof_string(f, s)
            }
            CimValue::UInt(n) => write!(f, "{}", n),
            CimValue::SInt(n) => write!(f, "{}", n),
            CimValue::Real(r) => write_real(f, *r),
            CimValue::Array(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("}")
            }
        }
    }
}
