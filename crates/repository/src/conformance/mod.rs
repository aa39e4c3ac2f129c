//! Conformance test suite for `Repository` implementations.
//!
//! A backend-agnostic suite any `Repository` implementation can run to
//! verify the define/lookup contract:
//!
//! - **Qualifiers**: declare, look up, idempotent redeclaration, conflicts
//! - **Classes**: define, case-insensitive lookup, superclass dependency,
//!   conflicts, namespace isolation
//! - **Instances**: class dependency, identity by path, conflicts
//!
//! # Usage
//!
//! ```ignore
//! use mofc_repository::conformance::run_conformance_suite;
//!
//! #[test]
//! fn my_backend_conformance() {
//!     let report = run_conformance_suite(|| MyBackend::connect_fresh());
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod class;
mod instance;
mod qualifier;

use std::fmt;

use mofc_schema::{
    CimType, CimValue, ClassDefinition, FlavorSet, InstanceDefinition, InstancePath, Property,
    PropertyValue, Qualifier, QualifierDeclaration, Scope,
};

use crate::Repository;

/// Namespace used by every conformance test.
pub(crate) const NS: &str = "root/conformance";

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "qualifier", "class", "instance").
    pub category: String,
    /// Test name (e.g. "define_then_lookup_class").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a repository backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// repository, ensuring test isolation.
pub fn run_conformance_suite<R, F>(factory: F) -> ConformanceReport
where
    R: Repository,
    F: Fn() -> R,
{
    let mut results = Vec::new();

    results.extend(qualifier::run_qualifier_tests(&factory));
    results.extend(class::run_class_tests(&factory));
    results.extend(instance::run_instance_tests(&factory));

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: element constructors with sensible defaults ─────────────────────

pub(crate) fn make_qualifier_decl(name: &str, cim_type: CimType) -> QualifierDeclaration {
    QualifierDeclaration {
        name: name.to_string(),
        cim_type,
        is_array: false,
        array_size: None,
        default: None,
        scopes: vec![Scope::Any],
        flavor: FlavorSet::default(),
    }
}

pub(crate) fn make_class(name: &str, superclass: Option<&str>) -> ClassDefinition {
    ClassDefinition {
        name: name.to_string(),
        superclass: superclass.map(str::to_string),
        alias: None,
        qualifiers: vec![],
        properties: vec![Property {
            name: "Name".to_string(),
            cim_type: CimType::String,
            is_array: false,
            array_size: None,
            default: None,
            qualifiers: vec![Qualifier {
                name: "Key".to_string(),
                value: Some(CimValue::Boolean(true)),
                flavor: FlavorSet::default(),
                flavors: vec![],
                propagated: false,
            }],
            class_origin: name.to_string(),
            propagated: false,
        }],
        methods: vec![],
    }
}

pub(crate) fn make_instance(class_name: &str, key: &str) -> InstanceDefinition {
    InstanceDefinition {
        class_name: class_name.to_string(),
        alias: None,
        qualifiers: vec![],
        properties: vec![PropertyValue {
            name: "Name".to_string(),
            cim_type: CimType::String,
            is_array: false,
            value: Some(CimValue::String(key.to_string())),
            qualifiers: vec![],
        }],
        path: InstancePath {
            namespace: NS.to_string(),
            class_name: class_name.to_string(),
            keybindings: vec![("Name".to_string(), CimValue::String(key.to_string()))],
        },
    }
}
