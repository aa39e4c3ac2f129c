use mofc_schema::CimValue;

use super::{make_class, make_instance, TestResult, NS};
use crate::{Repository, RepositoryError};

pub(super) fn run_instance_tests<R, F>(factory: &F) -> Vec<TestResult>
where
    R: Repository,
    F: Fn() -> R,
{
    vec![
        TestResult::from_result(
            "instance",
            "instance_requires_stored_class",
            instance_requires_stored_class(factory),
        ),
        TestResult::from_result(
            "instance",
            "identical_instance_define_is_idempotent",
            identical_instance_define_is_idempotent(factory),
        ),
        TestResult::from_result(
            "instance",
            "same_path_different_values_conflicts",
            same_path_different_values_conflicts(factory),
        ),
        TestResult::from_result(
            "instance",
            "distinct_paths_coexist",
            distinct_paths_coexist(factory),
        ),
    ]
}

fn instance_requires_stored_class<R: Repository, F: Fn() -> R>(
    factory: &F,
) -> Result<(), String> {
    let r = factory();
    match r.define_instance(NS, &make_instance("CIM_Missing", "a")) {
        Err(RepositoryError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound, got {:?}", other)),
    }
}

fn identical_instance_define_is_idempotent<R: Repository, F: Fn() -> R>(
    factory: &F,
) -> Result<(), String> {
    let r = factory();
    r.define_class(NS, &make_class("CIM_Foo", None))
        .map_err(|e| format!("class define failed: {}", e))?;
    let inst = make_instance("CIM_Foo", "a");
    r.define_instance(NS, &inst)
        .map_err(|e| format!("first define failed: {}", e))?;
    r.define_instance(NS, &inst)
        .map_err(|e| format!("second identical define failed: {}", e))
}

fn same_path_different_values_conflicts<R: Repository, F: Fn() -> R>(
    factory: &F,
) -> Result<(), String> {
    let r = factory();
    r.define_class(NS, &make_class("CIM_Foo", None))
        .map_err(|e| format!("class define failed: {}", e))?;
    r.define_instance(NS, &make_instance("CIM_Foo", "a"))
        .map_err(|e| format!("first define failed: {}", e))?;
    let mut changed = make_instance("CIM_Foo", "a");
    changed.properties[0].value = Some(CimValue::String("A".to_string()));
    match r.define_instance(NS, &changed) {
        Err(RepositoryError::Conflict { .. }) => Ok(()),
        other => Err(format!("expected Conflict, got {:?}", other)),
    }
}

fn distinct_paths_coexist<R: Repository, F: Fn() -> R>(factory: &F) -> Result<(), String> {
    let r = factory();
    r.define_class(NS, &make_class("CIM_Foo", None))
        .map_err(|e| format!("class define failed: {}", e))?;
    r.define_instance(NS, &make_instance("CIM_Foo", "a"))
        .map_err(|e| format!("define a failed: {}", e))?;
    r.define_instance(NS, &make_instance("CIM_Foo", "b"))
        .map_err(|e| format!("define b failed: {}", e))
}
