//! Error types.
//!
//! Every fallible operation in the crate returns [`AttrError`] through the
//! [`Result`] alias. Declaration errors (bad keys, unknown options, unknown
//! feature names) are programmer errors and surface at schema-build time;
//! construction errors surface from [`crate::Schema::materialize`]; query and
//! diff errors surface from the [`crate::Record`] accessors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttrError {
    /// An attribute key that cannot be used under the schema's key policy.
    #[error("invalid attribute key `{key}`: {reason}")]
    InvalidKey { key: String, reason: String },

    /// An option map contained a key outside the declaration vocabulary.
    #[error("unknown attribute option `{0}` (valid options: {valid})", valid = crate::schema::OPTION_KEYS.join(", "))]
    UnknownOption(String),

    /// A known option key carried a payload of the wrong shape.
    #[error("invalid value for attribute option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },

    /// The overwrite path was given nothing to overwrite.
    #[error("expected one or more attributes to overwrite, got none")]
    EmptyOverwrite,

    /// A feature name outside the known axes.
    #[error("invalid feature name `{0}` (available options: {valid})", valid = crate::features::FEATURE_NAMES.join(", "))]
    UnknownFeature(String),

    /// A feature request with no names at all.
    #[error("expected at least one feature name")]
    EmptyFeatureRequest,

    /// The JSON construction path was handed something other than an object.
    #[error("construction argument must be a map, got {0}")]
    NotAMap(&'static str),

    /// Required attributes absent from the construction input.
    #[error("{}", format_missing(.0))]
    MissingAttributes(Vec<String>),

    /// Aggregate validation failure raised by the strict-accept axis.
    #[error("{}", format_rejected(.0))]
    Rejected(Vec<(String, String)>),

    /// Lookup of a name the schema never declared.
    #[error("undefined attribute `{0}`")]
    UndefinedAttribute(String),

    /// Strict lookup of a declared but private attribute.
    #[error("tried to access a private attribute `{0}`")]
    PrivateAttribute(String),

    /// Strict lookup of a declared but protected attribute.
    #[error("tried to access a protected attribute `{0}`")]
    ProtectedAttribute(String),

    /// Diffing against a record built from a different schema.
    #[error("expected an instance of `{0}`")]
    SchemaMismatch(String),

    /// A surface gated off by the schema's feature bundle.
    #[error("the `{0}` feature is not enabled for this schema")]
    FeatureDisabled(&'static str),

    /// A value with no JSON representation (callables).
    #[error("{0} values cannot be serialized")]
    UnserializableValue(&'static str),
}

pub type Result<T> = std::result::Result<T, AttrError>;

fn format_missing(names: &[String]) -> String {
    let label = if names.len() == 1 {
        "missing required attribute"
    } else {
        "missing required attributes"
    };
    let list = names
        .iter()
        .map(|name| format!("`{}`", name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}: {}", label, list)
}

fn format_rejected(errors: &[(String, String)]) -> String {
    let lines = errors
        .iter()
        .map(|(name, message)| format!("* `{}` {}", name, message))
        .collect::<Vec<_>>()
        .join("\n");
    format!("One or more attributes were rejected. Errors:\n{}", lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_attributes_message_is_pluralized() {
        let one = AttrError::MissingAttributes(vec!["a".into()]);
        assert_eq!(one.to_string(), "missing required attribute: `a`");

        let two = AttrError::MissingAttributes(vec!["a".into(), "b".into()]);
        assert_eq!(two.to_string(), "missing required attributes: `a`, `b`");
    }

    #[test]
    fn rejected_message_enumerates_every_error() {
        let err = AttrError::Rejected(vec![
            ("a".into(), "expected to be a kind of Int".into()),
            ("operator".into(), "expected to not be a kind of Int".into()),
        ]);

        assert_eq!(
            err.to_string(),
            "One or more attributes were rejected. Errors:\n\
             * `a` expected to be a kind of Int\n\
             * `operator` expected to not be a kind of Int"
        );
    }

    #[test]
    fn undefined_and_visibility_errors_are_distinct() {
        assert_eq!(
            AttrError::UndefinedAttribute("x".into()).to_string(),
            "undefined attribute `x`"
        );
        assert_eq!(
            AttrError::PrivateAttribute("x".into()).to_string(),
            "tried to access a private attribute `x`"
        );
        assert_eq!(
            AttrError::ProtectedAttribute("x".into()).to_string(),
            "tried to access a protected attribute `x`"
        );
    }
}
