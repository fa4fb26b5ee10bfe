//! Record materialization.
//!
//! One materialization is a strictly sequential pipeline over the raw input
//! map: normalize keys, check required names, resolve and assign every
//! declared attribute (validating as it goes), run the external-validations
//! hook, then fail or finish. Nothing here mutates anything but the record
//! being built.

use crate::error::{AttrError, Result};
use crate::features::Feature;
use crate::key;
use crate::record::Record;
use crate::schema::{resolve, Schema};
use crate::value::AttrMap;

pub(crate) fn materialize(schema: &Schema, input: AttrMap) -> Result<Record> {
    let input = normalized_keys(schema, input);
    check_required(schema, &input)?;

    let (stored, snapshot, mut errors) = assign_attributes(schema, &input);

    run_external_validations(schema, &stored, &mut errors);

    if schema.features().has(Feature::AcceptStrict) && !errors.is_empty() {
        return Err(AttrError::Rejected(errors));
    }

    Ok(Record::assemble(schema.clone(), stored, snapshot, errors))
}

/// Canonicalize input keys under the schema's policy; keys the policy rejects
/// cannot address any declared attribute and simply drop out.
fn normalized_keys(schema: &Schema, input: AttrMap) -> AttrMap {
    let policy = schema.key_policy();
    input
        .into_iter()
        .filter_map(|(raw, value)| key::normalize_input(&raw, policy).map(|key| (key, value)))
        .collect()
}

/// Required names must be present *as keys* — a default never satisfies an
/// explicitly required attribute, so this runs before any resolution.
fn check_required(schema: &Schema, input: &AttrMap) -> Result<()> {
    let missing: Vec<String> = schema
        .required_names()
        .into_iter()
        .filter(|name| !input.contains_key(*name))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AttrError::MissingAttributes(missing))
    }
}

type Assigned = (AttrMap, AttrMap, Vec<(String, String)>);

fn assign_attributes(schema: &Schema, input: &AttrMap) -> Assigned {
    let validating = schema.features().enables(Feature::Accept);

    let mut stored = AttrMap::new();
    let mut snapshot = AttrMap::new();
    let mut errors = Vec::new();

    for def in schema.definitions() {
        let value = resolve::resolve(input.get(def.name()), def, input);

        if validating {
            if let Some(validation) = def.validation() {
                if let Some(message) = validation.run(def.name(), &value) {
                    errors.push((def.name().to_string(), message));
                }
            }
        }

        if def.is_public() {
            snapshot.insert(def.name().to_string(), value.clone());
        }
        stored.insert(def.name().to_string(), value);
    }

    (stored, snapshot, errors)
}

fn run_external_validations(schema: &Schema, stored: &AttrMap, errors: &mut Vec<(String, String)>) {
    if !schema.features().has(Feature::ExternalValidations) {
        return;
    }
    // No collaborator attached: the integration degrades to a no-op.
    let Some(external) = schema.external() else {
        return;
    };

    for (name, message) in external.run(stored) {
        if !errors.iter().any(|(errored, _)| *errored == name) {
            errors.push((name, message));
        }
    }
}
