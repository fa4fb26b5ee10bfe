//! Dynamic option-map parsing.
//!
//! Schemas are usually declared through the typed [`AttrOptions`] builder, but
//! data-driven callers (schema definitions loaded from JSON, for example) hand
//! over a plain option map instead. [`AttrOptions::from_map`] validates such a
//! map against the exact declaration vocabulary and rejects anything outside
//! it with an error naming the valid set.

use crate::error::{AttrError, Result};
use crate::schema::def::{AttrOptions, DefaultRule, FreezeMode};
use crate::validate::{Predicate, Rule};
use crate::value::{AttrMap, Value, ValueKind};

/// The permitted option keys, in declaration-vocabulary order.
pub const OPTION_KEYS: &[&str] = &[
    "default",
    "required",
    "freeze",
    "private",
    "protected",
    "validate",
    "validates",
    "accept",
    "reject",
    "allow_nil",
    "rejection_message",
];

impl AttrOptions {
    /// Parse a dynamic option map.
    ///
    /// Every key must belong to [`OPTION_KEYS`]; payloads must have the shape
    /// the option expects. Defaults coming through this path are always
    /// literals (a callable value becomes callable *data*, never a
    /// transformer).
    pub fn from_map(map: &AttrMap) -> Result<AttrOptions> {
        for key in map.keys() {
            if !OPTION_KEYS.contains(&key.as_str()) {
                return Err(AttrError::UnknownOption(key.clone()));
            }
        }

        if map.contains_key("accept") && map.contains_key("reject") {
            return Err(AttrError::InvalidOption {
                key: "reject".into(),
                reason: "cannot be combined with `accept`".into(),
            });
        }

        let mut opts = AttrOptions::new();

        if let Some(value) = map.get("default") {
            opts = opts.set_default_rule(DefaultRule::Literal(value.clone()));
        }

        if bool_option(map, "required")? {
            opts = opts.required();
        }

        if let Some(value) = map.get("freeze") {
            opts = opts.freeze_mode(parse_freeze(value)?);
        }

        let private = bool_option(map, "private")?;
        let protected = bool_option(map, "protected")?;
        if private && protected {
            return Err(AttrError::InvalidOption {
                key: "protected".into(),
                reason: "cannot be combined with `private`".into(),
            });
        }
        if private {
            opts = opts.private();
        } else if protected {
            opts = opts.protected();
        }

        if let Some(value) = map.get("accept") {
            opts = opts.accept(parse_rule("accept", value)?);
        }
        if let Some(value) = map.get("reject") {
            opts = opts.reject(parse_rule("reject", value)?);
        }

        if bool_option(map, "allow_nil")? {
            opts = opts.allow_nil();
        }

        if let Some(value) = map.get("rejection_message") {
            let text = value.as_str().ok_or_else(|| AttrError::InvalidOption {
                key: "rejection_message".into(),
                reason: format!("expected a string, got {}", value.kind()),
            })?;
            opts = opts.rejection_message(text);
        }

        for key in ["validate", "validates"] {
            if let Some(value) = map.get(key) {
                for rule in parse_rule_names(key, value)? {
                    opts = opts.validates(rule);
                }
            }
        }

        Ok(opts)
    }
}

fn bool_option(map: &AttrMap, key: &str) -> Result<bool> {
    match map.get(key) {
        None => Ok(false),
        Some(value) => value.as_bool().ok_or_else(|| AttrError::InvalidOption {
            key: key.into(),
            reason: format!("expected a bool, got {}", value.kind()),
        }),
    }
}

fn parse_freeze(value: &Value) -> Result<FreezeMode> {
    if let Some(flag) = value.as_bool() {
        return Ok(if flag { FreezeMode::InPlace } else { FreezeMode::None });
    }
    match value.as_str() {
        Some("in_place") => Ok(FreezeMode::InPlace),
        Some("after_dup") => Ok(FreezeMode::AfterDup),
        Some("after_clone") => Ok(FreezeMode::AfterClone),
        _ => Err(AttrError::InvalidOption {
            key: "freeze".into(),
            reason: format!(
                "expected true, false, \"in_place\", \"after_dup\", or \"after_clone\", got {}",
                describe(value)
            ),
        }),
    }
}

/// An accept/reject payload: a kind name, a `predicate?` name, or a callable.
fn parse_rule(key: &str, value: &Value) -> Result<Rule> {
    if let Some(name) = value.as_str() {
        if name.ends_with('?') {
            return Predicate::named(name)
                .map(Rule::Predicate)
                .ok_or_else(|| AttrError::InvalidOption {
                    key: key.into(),
                    reason: format!("unknown predicate `{}`", name),
                });
        }
        return ValueKind::named(name)
            .map(Rule::Kind)
            .ok_or_else(|| AttrError::InvalidOption {
                key: key.into(),
                reason: format!("unknown kind `{}`", name),
            });
    }

    if let Some(callable) = value.as_callable() {
        let callable = callable.clone();
        return Ok(Rule::test(move |v| callable.call(&[v.clone()]).truthy()));
    }

    Err(AttrError::InvalidOption {
        key: key.into(),
        reason: format!(
            "expected a kind name, a predicate name, or a callable, got {}",
            describe(value)
        ),
    })
}

fn parse_rule_names(key: &str, value: &Value) -> Result<Vec<String>> {
    if let Some(name) = value.as_str() {
        return Ok(vec![name.to_string()]);
    }
    if let Some(items) = value.as_list() {
        return items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| AttrError::InvalidOption {
                        key: key.into(),
                        reason: format!("expected a list of strings, got {}", item.kind()),
                    })
            })
            .collect();
    }
    Err(AttrError::InvalidOption {
        key: key.into(),
        reason: format!("expected a string or list of strings, got {}", value.kind()),
    })
}

fn describe(value: &Value) -> String {
    value.kind().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr_map;
    use crate::schema::def::Visibility;

    #[test]
    fn unknown_option_keys_are_rejected_with_the_valid_set() {
        let map = attr_map! { "defaults" => 1 };

        let err = AttrOptions::from_map(&map).unwrap_err();
        let message = err.to_string();

        assert!(message.contains("unknown attribute option `defaults`"));
        for key in OPTION_KEYS {
            assert!(message.contains(key), "missing {} in {}", key, message);
        }
    }

    #[test]
    fn parses_the_full_vocabulary() {
        let map = attr_map! {
            "default" => 2,
            "required" => true,
            "freeze" => "after_dup",
            "private" => true,
            "accept" => "int",
            "allow_nil" => true,
            "rejection_message" => "must be an int",
            "validates" => "presence",
        };

        let def = AttrOptions::from_map(&map).unwrap().into_def("n".into());

        assert!(def.required());
        assert_eq!(def.freeze(), FreezeMode::AfterDup);
        assert_eq!(def.visibility(), Visibility::Private);
        assert_eq!(def.external_rules(), ["presence"]);
        assert_eq!(def.default().unwrap().as_literal(), Value::from(2));

        let validation = def.validation().unwrap();
        assert_eq!(validation.run("n", &Value::nil()), None);
        assert_eq!(
            validation.run("n", &Value::str("2")),
            Some("must be an int".to_string())
        );
    }

    #[test]
    fn predicate_rules_parse_by_their_question_mark_names() {
        let map = attr_map! { "reject" => "empty?" };
        let def = AttrOptions::from_map(&map).unwrap().into_def("name".into());

        assert_eq!(
            def.validation().unwrap().run("name", &Value::str("")),
            Some("expected to not be empty?".to_string())
        );
    }

    #[test]
    fn callable_rules_parse_as_custom_tests() {
        let map = attr_map! {
            "accept" => Value::callable(|args| {
                Value::from(args.first().is_some_and(|v| v.as_int().is_some()))
            }),
        };
        let def = AttrOptions::from_map(&map).unwrap().into_def("n".into());

        assert_eq!(def.validation().unwrap().run("n", &Value::from(1)), None);
        assert_eq!(
            def.validation().unwrap().run("n", &Value::str("1")),
            Some("is invalid".to_string())
        );
    }

    #[test]
    fn bad_payload_shapes_are_reported_per_option() {
        let required = attr_map! { "required" => "yes" };
        let err = AttrOptions::from_map(&required).unwrap_err();
        assert!(err.to_string().contains("`required`"));

        let freeze = attr_map! { "freeze" => 3 };
        let err = AttrOptions::from_map(&freeze).unwrap_err();
        assert!(err.to_string().contains("`freeze`"));

        let rule = attr_map! { "accept" => "integer" };
        let err = AttrOptions::from_map(&rule).unwrap_err();
        assert!(err.to_string().contains("unknown kind `integer`"));
    }

    #[test]
    fn accept_and_reject_cannot_be_combined() {
        let map = attr_map! { "accept" => "int", "reject" => "str" };

        let err = AttrOptions::from_map(&map).unwrap_err();
        assert!(err.to_string().contains("cannot be combined"));
    }

    #[test]
    fn private_and_protected_cannot_be_combined() {
        let map = attr_map! { "private" => true, "protected" => true };

        assert!(AttrOptions::from_map(&map).is_err());
    }
}
