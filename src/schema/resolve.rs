//! Effective-value resolution.
//!
//! Given the raw input for one attribute, its definition, and the whole raw
//! input map, [`resolve`] computes the value that will actually be stored:
//! default application first, then the definition's freeze mode.

use crate::schema::def::{AttributeDef, DefaultRule, FreezeMode};
use crate::value::{AttrMap, Value, ValueKind};

/// Resolve the effective value for one attribute.
///
/// A present, non-nil input wins over literal and generator defaults.
/// Transformer defaults always run, receiving the raw input (`Nil` when
/// absent) — and, for the two-argument shape, the whole raw input map, never
/// partially-resolved siblings.
///
/// Exception: when the definition's validation accepts the `Callable` kind,
/// the attribute holds functions *as data*, so a function default must not be
/// invoked as a transformer — the input is used unresolved, and an absent
/// input falls back to the default materialized as a data callable.
pub(crate) fn resolve(input: Option<&Value>, def: &AttributeDef, full_input: &AttrMap) -> Value {
    let value = resolve_default(input, def, full_input);
    apply_freeze(value, def.freeze())
}

fn resolve_default(input: Option<&Value>, def: &AttributeDef, full_input: &AttrMap) -> Value {
    let keeps_callables = def
        .validation()
        .is_some_and(|v| v.accepts_kind(ValueKind::Callable));

    if keeps_callables && def.default().is_some_and(DefaultRule::is_callable) {
        return match present(input) {
            Some(value) => value.clone(),
            None => def.default().map(DefaultRule::as_literal).unwrap_or_else(Value::nil),
        };
    }

    let nil = Value::nil();
    match def.default() {
        None => present(input).cloned().unwrap_or_else(Value::nil),
        Some(DefaultRule::Literal(default)) => match present(input) {
            Some(value) => value.clone(),
            None => default.clone(),
        },
        Some(DefaultRule::Generate(f)) => match present(input) {
            Some(value) => value.clone(),
            None => f(),
        },
        Some(DefaultRule::Transform(f)) => f(input.unwrap_or(&nil)),
        Some(DefaultRule::TransformWithInput(f)) => f(input.unwrap_or(&nil), full_input),
    }
}

fn present(input: Option<&Value>) -> Option<&Value> {
    input.filter(|value| !value.is_nil())
}

fn apply_freeze(value: Value, mode: FreezeMode) -> Value {
    match mode {
        FreezeMode::None => value,
        FreezeMode::InPlace => value.freeze(),
        FreezeMode::AfterDup => value.dup().freeze(),
        FreezeMode::AfterClone => value.deep_clone().freeze(),
    }
}
