//! Per-unit reporting in text and JSON form.

use std::path::Path;

use mofc_core::{CompilationResult, CompileError};
use serde_json::{json, Value};

/// The outcome of compiling one file.
pub(crate) struct Unit {
    file: String,
    outcome: Result<CompilationResult, CompileError>,
}

impl Unit {
    pub(crate) fn new(file: &Path, outcome: Result<CompilationResult, CompileError>) -> Self {
        Unit {
            file: file.display().to_string(),
            outcome,
        }
    }

    pub(crate) fn succeeded(&self) -> bool {
        matches!(&self.outcome, Ok(result) if result.is_clean())
    }

    fn errors(&self) -> Vec<&CompileError> {
        match &self.outcome {
            Ok(result) => result.errors.iter().collect(),
            Err(e) => vec![e],
        }
    }

    fn to_json_value(&self) -> Value {
        let errors: Vec<Value> = self.errors().iter().map(|e| e.to_json_value()).collect();
        let status = if self.succeeded() { "ok" } else { "error" };
        match &self.outcome {
            Ok(result) => json!({
                "file": self.file,
                "status": status,
                "qualifiers": to_value(&result.defined_qualifiers),
                "classes": to_value(&result.defined_classes),
                "instances": to_value(&result.defined_instances),
                "errors": errors,
            }),
            Err(_) => json!({
                "file": self.file,
                "status": status,
                "errors": errors,
            }),
        }
    }
}

fn to_value<T: serde::Serialize>(items: &T) -> Value {
    serde_json::to_value(items).unwrap_or_else(|e| json!({ "serialization_error": e.to_string() }))
}

pub(crate) fn json(units: &[Unit]) {
    let report = Value::Array(units.iter().map(Unit::to_json_value).collect());
    let pretty = serde_json::to_string_pretty(&report)
        .unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}

pub(crate) fn text(units: &[Unit], emit_mof: bool, quiet: bool) {
    for unit in units {
        for e in unit.errors() {
            eprintln!("{}", e);
        }
        let Ok(result) = &unit.outcome else {
            continue;
        };
        if emit_mof {
            for class in &result.defined_classes {
                println!("{}\n", class.element);
            }
        }
        if !quiet {
            println!(
                "{}: {} qualifier(s), {} class(es), {} instance(s), {} error(s)",
                unit.file,
                result.defined_qualifiers.len(),
                result.defined_classes.len(),
                result.defined_instances.len(),
                result.errors.len()
            );
        }
    }
}
