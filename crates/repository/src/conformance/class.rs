use super::{make_class, TestResult, NS};
use crate::{Repository, RepositoryError};

pub(super) fn run_class_tests<R, F>(factory: &F) -> Vec<TestResult>
where
    R: Repository,
    F: Fn() -> R,
{
    vec![
        TestResult::from_result(
            "class",
            "define_then_lookup_class",
            define_then_lookup_class(factory),
        ),
        TestResult::from_result(
            "class",
            "lookup_class_is_case_insensitive",
            lookup_class_is_case_insensitive(factory),
        ),
        TestResult::from_result(
            "class",
            "identical_class_define_is_idempotent",
            identical_class_define_is_idempotent(factory),
        ),
        TestResult::from_result(
            "class",
            "different_class_define_conflicts",
            different_class_define_conflicts(factory),
        ),
        TestResult::from_result(
            "class",
            "subclass_requires_stored_superclass",
            subclass_requires_stored_superclass(factory),
        ),
        TestResult::from_result(
            "class",
            "namespaces_are_isolated",
            namespaces_are_isolated(factory),
        ),
    ]
}

fn define_then_lookup_class<R: Repository, F: Fn() -> R>(factory: &F) -> Result<(), String> {
    let r = factory();
    let class = make_class("CIM_Base", None);
    r.define_class(NS, &class)
        .map_err(|e| format!("define failed: {}", e))?;
    let found = r
        .lookup_class(NS, "CIM_Base")
        .map_err(|e| format!("lookup failed: {}", e))?;
    if found != class {
        return Err(format!("lookup returned {:?}", found));
    }
    Ok(())
}

fn lookup_class_is_case_insensitive<R: Repository, F: Fn() -> R>(
    factory: &F,
) -> Result<(), String> {
    let r = factory();
    r.define_class(NS, &make_class("CIM_Foo", None))
        .map_err(|e| format!("define failed: {}", e))?;
    let found = r
        .lookup_class(NS, "cim_foo")
        .map_err(|e| format!("lookup failed: {}", e))?;
    if found.name != "CIM_Foo" {
        return Err(format!("expected spelling 'CIM_Foo', got '{}'", found.name));
    }
    Ok(())
}

fn identical_class_define_is_idempotent<R: Repository, F: Fn() -> R>(
    factory: &F,
) -> Result<(), String> {
    let r = factory();
    let class = make_class("CIM_Base", None);
    r.define_class(NS, &class)
        .map_err(|e| format!("first define failed: {}", e))?;
    r.define_class(NS, &class)
        .map_err(|e| format!("second identical define failed: {}", e))
}

fn different_class_define_conflicts<R: Repository, F: Fn() -> R>(
    factory: &F,
) -> Result<(), String> {
    let r = factory();
    r.define_class(NS, &make_class("CIM_Base", None))
        .map_err(|e| format!("define failed: {}", e))?;
    let mut changed = make_class("CIM_Base", None);
    changed.properties.clear();
    match r.define_class(NS, &changed) {
        Err(RepositoryError::Conflict { .. }) => Ok(()),
        other => Err(format!("expected Conflict, got {:?}", other)),
    }
}

fn subclass_requires_stored_superclass<R: Repository, F: Fn() -> R>(
    factory: &F,
) -> Result<(), String> {
    let r = factory();
    match r.define_class(NS, &make_class("CIM_Sub", Some("CIM_Missing"))) {
        Err(RepositoryError::NotFound { name, .. }) if name == "CIM_Missing" => Ok(()),
        other => Err(format!("expected NotFound for 'CIM_Missing', got {:?}", other)),
    }
}

fn namespaces_are_isolated<R: Repository, F: Fn() -> R>(factory: &F) -> Result<(), String> {
    let r = factory();
    r.define_class(NS, &make_class("CIM_Base", None))
        .map_err(|e| format!("define failed: {}", e))?;
    match r.lookup_class("root/other", "CIM_Base") {
        Err(RepositoryError::NotFound { .. }) => Ok(()),
        other => Err(format!(
            "class leaked into another namespace: {:?}",
            other.map(|c| c.name)
        )),
    }
}
