//! Raw AST produced by the parser, one top-level production at a time.
//!
//! Nothing here is resolved or type checked: literal values keep their
//! lexemes until the validator coerces them against a declared type.

use std::fmt;

use mofc_schema::{CimType, Flavor, Scope};

use crate::lexer::NumberKind;

// ──────────────────────────────────────────────
// Provenance
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provenance {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Provenance {
    pub fn new(file: &str, line: u32, column: u32) -> Self {
        Provenance {
            file: file.to_owned(),
            line,
            column,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ──────────────────────────────────────────────
// Values
// ──────────────────────────────────────────────

/// An initializer as written.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    /// Integer literal; `text` includes the sign and any radix marker.
    Int {
        text: String,
        kind: NumberKind,
    },
    Real(String),
    Char(char),
    /// Adjacent string literals are already concatenated.
    Str(String),
    /// `$name` reference to an instance alias.
    Alias(String),
    Array(Vec<RawValue>),
}

// ──────────────────────────────────────────────
// Declarations
// ──────────────────────────────────────────────

/// A qualifier applied inside `[...]`.
#[derive(Debug, Clone)]
pub struct RawQualifier {
    pub name: String,
    /// `None` when the qualifier is written without a value.
    pub value: Option<RawValue>,
    pub flavors: Vec<Flavor>,
    pub prov: Provenance,
}

#[derive(Debug, Clone)]
pub struct RawQualifierDecl {
    pub name: String,
    pub cim_type: CimType,
    pub is_array: bool,
    pub array_size: Option<u32>,
    pub default: Option<RawValue>,
    pub scopes: Vec<Scope>,
    pub flavors: Vec<Flavor>,
    pub prov: Provenance,
}

#[derive(Debug, Clone)]
pub struct RawProperty {
    pub qualifiers: Vec<RawQualifier>,
    pub name: String,
    pub cim_type: CimType,
    pub is_array: bool,
    pub array_size: Option<u32>,
    pub default: Option<RawValue>,
    pub prov: Provenance,
}

#[derive(Debug, Clone)]
pub struct RawParameter {
    pub qualifiers: Vec<RawQualifier>,
    pub name: String,
    pub cim_type: CimType,
    pub is_array: bool,
    pub array_size: Option<u32>,
    pub prov: Provenance,
}

#[derive(Debug, Clone)]
pub struct RawMethod {
    pub qualifiers: Vec<RawQualifier>,
    pub name: String,
    pub return_type: CimType,
    pub parameters: Vec<RawParameter>,
    pub prov: Provenance,
}

#[derive(Debug, Clone)]
pub struct RawClass {
    pub qualifiers: Vec<RawQualifier>,
    pub name: String,
    pub alias: Option<String>,
    pub superclass: Option<String>,
    pub properties: Vec<RawProperty>,
    pub methods: Vec<RawMethod>,
    pub prov: Provenance,
}

/// `Name = value;` inside an instance body.
#[derive(Debug, Clone)]
pub struct RawAssignment {
    pub qualifiers: Vec<RawQualifier>,
    pub name: String,
    pub value: RawValue,
    pub prov: Provenance,
}

#[derive(Debug, Clone)]
pub struct RawInstance {
    pub qualifiers: Vec<RawQualifier>,
    pub class_name: String,
    pub alias: Option<String>,
    pub assignments: Vec<RawAssignment>,
    pub prov: Provenance,
}

/// `#pragma name(args)`; each argument is a concatenated string.
#[derive(Debug, Clone)]
pub struct RawPragma {
    pub name: String,
    pub args: Vec<String>,
    pub prov: Provenance,
}

/// One completed top-level production.
#[derive(Debug, Clone)]
pub enum Production {
    Pragma(RawPragma),
    QualifierDecl(RawQualifierDecl),
    Class(RawClass),
    Instance(RawInstance),
}

impl Production {
    pub fn prov(&self) -> &Provenance {
        match self {
            Production::Pragma(p) => &p.prov,
            Production::QualifierDecl(q) => &q.prov,
            Production::Class(c) => &c.prov,
            Production::Instance(i) => &i.prov,
        }
    }
}
