//! Phase two: resolve deferred alias references once the unit's alias
//! table is complete, and report everything still waiting.

use tracing::debug;

use crate::error::CompileError;
use crate::symbols::{AliasHandle, Parked, SymbolTable, Waiting};
use crate::validate::CheckedInstance;

/// Fill queued instances until no placeholder can be resolved any more.
///
/// Instances are returned in the order they became complete. Completing an
/// instance may give its own alias a path, which in turn unblocks others.
pub fn resolve_aliases(
    symbols: &mut SymbolTable,
    mut queued: Vec<CheckedInstance>,
) -> Result<Vec<CheckedInstance>, CompileError> {
    let mut ready = Vec::with_capacity(queued.len());
    loop {
        let mut progress = false;
        let mut waiting = Vec::with_capacity(queued.len());
        for mut checked in queued {
            progress |= checked.fill(symbols);
            if let (Some(alias), Some(path)) = (&checked.instance.alias, checked.path()) {
                if !matches!(symbols.resolve_alias(alias), AliasHandle::Resolved(_)) {
                    debug!(alias = %alias, path = %path, "alias resolved");
                    symbols.set_alias_path(alias, path);
                    progress = true;
                }
            }
            if checked.is_complete() {
                ready.push(checked);
            } else {
                waiting.push(checked);
            }
        }
        queued = waiting;
        if queued.is_empty() || !progress {
            break;
        }
    }

    match queued.first() {
        None => Ok(ready),
        Some(stuck) => Err(unresolved_alias(symbols, stuck)),
    }
}

fn unresolved_alias(symbols: &SymbolTable, stuck: &CheckedInstance) -> CompileError {
    let class = &stuck.instance.class_name;
    match stuck.unresolved().next() {
        Some((alias, prov)) if !symbols.is_alias_defined(alias) => {
            CompileError::incomplete(prov, class, format!("unresolved alias ${}", alias))
        }
        Some((alias, prov)) => CompileError::incomplete(
            prov,
            class,
            format!(
                "alias ${} cannot be resolved: its instance path depends on a reference cycle",
                alias
            ),
        ),
        None => CompileError::incomplete(&stuck.prov, class, "instance has unresolved references"),
    }
}

/// The error for an item still parked at end of unit.
pub fn unresolved_class(parked: &Parked) -> CompileError {
    match &parked.item {
        Waiting::Class(raw) => CompileError::incomplete(
            &raw.prov,
            &raw.name,
            format!(
                "superclass '{}' of class '{}' is not defined in namespace {}",
                parked.missing, raw.name, parked.namespace
            ),
        ),
        Waiting::Instance(raw) => CompileError::incomplete(
            &raw.prov,
            &raw.class_name,
            format!(
                "class '{}' of instance is not defined in namespace {}",
                parked.missing, parked.namespace
            ),
        ),
    }
}
