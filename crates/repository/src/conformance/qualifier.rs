use mofc_schema::{CimType, CimValue};

use super::{make_qualifier_decl, TestResult, NS};
use crate::{Repository, RepositoryError};

pub(super) fn run_qualifier_tests<R, F>(factory: &F) -> Vec<TestResult>
where
    R: Repository,
    F: Fn() -> R,
{
    vec![
        TestResult::from_result(
            "qualifier",
            "define_then_lookup_qualifier",
            define_then_lookup_qualifier(factory),
        ),
        TestResult::from_result(
            "qualifier",
            "lookup_qualifier_is_case_insensitive",
            lookup_qualifier_is_case_insensitive(factory),
        ),
        TestResult::from_result(
            "qualifier",
            "identical_redeclaration_is_idempotent",
            identical_redeclaration_is_idempotent(factory),
        ),
        TestResult::from_result(
            "qualifier",
            "incompatible_redeclaration_conflicts",
            incompatible_redeclaration_conflicts(factory),
        ),
        TestResult::from_result(
            "qualifier",
            "lookup_missing_qualifier_not_found",
            lookup_missing_qualifier_not_found(factory),
        ),
    ]
}

fn define_then_lookup_qualifier<R: Repository, F: Fn() -> R>(factory: &F) -> Result<(), String> {
    let r = factory();
    let decl = make_qualifier_decl("Description", CimType::String);
    r.define_qualifier_declaration(NS, &decl)
        .map_err(|e| format!("define failed: {}", e))?;
    let found = r
        .lookup_qualifier(NS, "Description")
        .map_err(|e| format!("lookup failed: {}", e))?;
    if found != decl {
        return Err(format!("lookup returned {:?}, expected {:?}", found, decl));
    }
    Ok(())
}

fn lookup_qualifier_is_case_insensitive<R: Repository, F: Fn() -> R>(
    factory: &F,
) -> Result<(), String> {
    let r = factory();
    r.define_qualifier_declaration(NS, &make_qualifier_decl("Key", CimType::Boolean))
        .map_err(|e| format!("define failed: {}", e))?;
    let found = r
        .lookup_qualifier(NS, "KEY")
        .map_err(|e| format!("lookup failed: {}", e))?;
    if found.name != "Key" {
        return Err(format!("expected declared spelling 'Key', got '{}'", found.name));
    }
    Ok(())
}

fn identical_redeclaration_is_idempotent<R: Repository, F: Fn() -> R>(
    factory: &F,
) -> Result<(), String> {
    let r = factory();
    let decl = make_qualifier_decl("Version", CimType::String);
    r.define_qualifier_declaration(NS, &decl)
        .map_err(|e| format!("first define failed: {}", e))?;
    r.define_qualifier_declaration(NS, &decl)
        .map_err(|e| format!("second identical define failed: {}", e))
}

fn incompatible_redeclaration_conflicts<R: Repository, F: Fn() -> R>(
    factory: &F,
) -> Result<(), String> {
    let r = factory();
    r.define_qualifier_declaration(NS, &make_qualifier_decl("MaxLen", CimType::UInt32))
        .map_err(|e| format!("define failed: {}", e))?;
    let mut other = make_qualifier_decl("MaxLen", CimType::UInt32);
    other.default = Some(CimValue::UInt(10));
    match r.define_qualifier_declaration(NS, &other) {
        Err(RepositoryError::Conflict { .. }) => Ok(()),
        other => Err(format!("expected Conflict, got {:?}", other)),
    }
}

fn lookup_missing_qualifier_not_found<R: Repository, F: Fn() -> R>(
    factory: &F,
) -> Result<(), String> {
    let r = factory();
    match r.lookup_qualifier(NS, "Nope") {
        Err(RepositoryError::NotFound { name, .. }) if name == "Nope" => Ok(()),
        other => Err(format!("expected NotFound for 'Nope', got {:?}", other)),
    }
}
