//! Attribute definitions and the declaration builder.
//!
//! [`AttributeDef`] is one entry in a schema's registry: name, default,
//! requiredness, validation, freeze mode, and visibility. Definitions are
//! assembled from [`AttrOptions`], the chainable option set passed to
//! [`crate::SchemaBuilder::attribute`].

use std::fmt;
use std::sync::Arc;

use crate::validate::{Polarity, RejectionMessage, Rule, Validation};
use crate::value::{AttrMap, Value};

/// How an attribute computes its effective value when the input lacks one.
#[derive(Clone)]
pub enum DefaultRule {
    /// A plain value, used as-is.
    Literal(Value),
    /// A zero-argument generator, invoked fresh on every materialization.
    Generate(Arc<dyn Fn() -> Value + Send + Sync>),
    /// A transformer over the raw input value (`Nil` when absent).
    Transform(Arc<dyn Fn(&Value) -> Value + Send + Sync>),
    /// A transformer over the raw input value and the whole raw input map.
    TransformWithInput(Arc<dyn Fn(&Value, &AttrMap) -> Value + Send + Sync>),
}

impl DefaultRule {
    pub(crate) fn is_callable(&self) -> bool {
        !matches!(self, DefaultRule::Literal(_))
    }

    /// Materialize the default *as data* without invoking it as a transformer.
    ///
    /// Used for attributes whose accepted kind is `Callable`: a function
    /// default is meant to be stored, so it is wrapped into a [`Value`]
    /// callable instead of being applied.
    pub(crate) fn as_literal(&self) -> Value {
        match self {
            DefaultRule::Literal(value) => value.clone(),
            DefaultRule::Generate(f) => {
                let f = Arc::clone(f);
                Value::callable(move |_args| f())
            }
            DefaultRule::Transform(f) => {
                let f = Arc::clone(f);
                Value::callable(move |args| {
                    let nil = Value::nil();
                    f(args.first().unwrap_or(&nil))
                })
            }
            DefaultRule::TransformWithInput(f) => {
                let f = Arc::clone(f);
                Value::callable(move |args| {
                    let nil = Value::nil();
                    f(args.first().unwrap_or(&nil), &AttrMap::new())
                })
            }
        }
    }
}

impl fmt::Debug for DefaultRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultRule::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultRule::Generate(_) => f.write_str("Generate(..)"),
            DefaultRule::Transform(_) => f.write_str("Transform(..)"),
            DefaultRule::TransformWithInput(_) => f.write_str("TransformWithInput(..)"),
        }
    }
}

/// What happens to a resolved value before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FreezeMode {
    /// Store as resolved.
    #[default]
    None,
    /// Freeze in place: same storage, frozen flag set.
    InPlace,
    /// Copy into fresh storage, dropping annotations, then freeze the copy.
    AfterDup,
    /// Copy into fresh storage, keeping annotations, then freeze the copy.
    AfterClone,
}

/// Whether the attribute appears in the externally visible snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

/// One entry in a schema's registry.
#[derive(Debug, Clone)]
pub struct AttributeDef {
    name: String,
    default: Option<DefaultRule>,
    required: bool,
    validation: Option<Validation>,
    external_rules: Vec<String>,
    freeze: FreezeMode,
    visibility: Visibility,
}

impl AttributeDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(&self) -> Option<&DefaultRule> {
        self.default.as_ref()
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn validation(&self) -> Option<&Validation> {
        self.validation.as_ref()
    }

    pub fn external_rules(&self) -> &[String] {
        &self.external_rules
    }

    pub fn freeze(&self) -> FreezeMode {
        self.freeze
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// The option set accepted by attribute declarations.
///
/// Mirrors the declaration vocabulary: `default`, `required`, `freeze`,
/// `private`/`protected`, `accept`/`reject` (+ `allow_nil`,
/// `rejection_message`), and `validate`/`validates` external rule names.
///
/// ```
/// use attrkit::{AttrOptions, Rule, ValueKind};
///
/// let opts = AttrOptions::new()
///     .default(2)
///     .accept(Rule::Kind(ValueKind::Int))
///     .allow_nil();
/// # let _ = opts;
/// ```
#[derive(Debug, Clone, Default)]
pub struct AttrOptions {
    default: Option<DefaultRule>,
    required: bool,
    freeze: FreezeMode,
    visibility: Visibility,
    rule: Option<(Polarity, Rule)>,
    allow_nil: bool,
    message: Option<RejectionMessage>,
    external_rules: Vec<String>,
}

impl AttrOptions {
    pub fn new() -> Self {
        <AttrOptions as Default>::default()
    }

    /// A literal default value.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultRule::Literal(value.into()));
        self
    }

    /// A zero-argument generator default, run fresh per materialization.
    pub fn default_with(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultRule::Generate(Arc::new(f)));
        self
    }

    /// A one-argument transformer default over the raw input value.
    pub fn transform(mut self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultRule::Transform(Arc::new(f)));
        self
    }

    /// A two-argument transformer default over the raw input value and the
    /// whole raw input map.
    pub fn transform_with_input(
        mut self,
        f: impl Fn(&Value, &AttrMap) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.default = Some(DefaultRule::TransformWithInput(Arc::new(f)));
        self
    }

    /// Require the attribute to be present in construction input, even when a
    /// default exists.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Freeze the resolved value in place.
    pub fn freeze(self) -> Self {
        self.freeze_mode(FreezeMode::InPlace)
    }

    pub fn freeze_mode(mut self, mode: FreezeMode) -> Self {
        self.freeze = mode;
        self
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn protected(mut self) -> Self {
        self.visibility = Visibility::Protected;
        self
    }

    /// The value must satisfy the rule.
    pub fn accept(mut self, rule: Rule) -> Self {
        self.rule = Some((Polarity::Accept, rule));
        self
    }

    /// The value must not satisfy the rule.
    pub fn reject(mut self, rule: Rule) -> Self {
        self.rule = Some((Polarity::Reject, rule));
        self
    }

    /// Skip the accept/reject rule for `Nil` values.
    pub fn allow_nil(mut self) -> Self {
        self.allow_nil = true;
        self
    }

    /// Override the rejection message with a literal string.
    pub fn rejection_message(mut self, text: impl Into<String>) -> Self {
        self.message = Some(RejectionMessage::Text(text.into()));
        self
    }

    /// Override the rejection message with a generator over the attribute name.
    pub fn rejection_message_with(
        mut self,
        f: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.message = Some(RejectionMessage::Lazy(Arc::new(f)));
        self
    }

    /// Declare an external validation rule by name, to be registered with the
    /// schema's collaborator.
    pub fn validates(mut self, rule: impl Into<String>) -> Self {
        self.external_rules.push(rule.into());
        self
    }

    pub(crate) fn set_default_rule(mut self, rule: DefaultRule) -> Self {
        self.default = Some(rule);
        self
    }

    pub(crate) fn into_def(self, name: String) -> AttributeDef {
        let validation = self.rule.map(|(polarity, rule)| {
            let mut validation = match polarity {
                Polarity::Accept => Validation::accept(rule),
                Polarity::Reject => Validation::reject(rule),
            };
            if self.allow_nil {
                validation = validation.allow_nil();
            }
            if let Some(message) = self.message {
                validation = validation.with_message(message);
            }
            validation
        });

        AttributeDef {
            name,
            default: self.default,
            required: self.required,
            validation,
            external_rules: self.external_rules,
            freeze: self.freeze,
            visibility: self.visibility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    #[test]
    fn options_assemble_a_definition() {
        let def = AttrOptions::new()
            .default(2)
            .required()
            .freeze()
            .private()
            .accept(Rule::Kind(ValueKind::Int))
            .allow_nil()
            .into_def("count".into());

        assert_eq!(def.name(), "count");
        assert!(def.required());
        assert_eq!(def.freeze(), FreezeMode::InPlace);
        assert_eq!(def.visibility(), Visibility::Private);
        assert!(!def.is_public());
        assert!(matches!(def.default(), Some(DefaultRule::Literal(_))));

        let validation = def.validation().unwrap();
        assert_eq!(validation.run("count", &Value::nil()), None);
        assert!(validation.run("count", &Value::str("2")).is_some());
    }

    #[test]
    fn bare_options_make_a_plain_public_definition() {
        let def = AttrOptions::new().into_def("note".into());

        assert!(def.default().is_none());
        assert!(!def.required());
        assert!(def.validation().is_none());
        assert_eq!(def.freeze(), FreezeMode::None);
        assert!(def.is_public());
        assert!(def.external_rules().is_empty());
    }

    #[test]
    fn callable_defaults_materialize_as_data() {
        let generate = AttrOptions::new()
            .default_with(|| Value::from(7))
            .into_def("gen".into());

        let as_data = generate.default().unwrap().as_literal();
        let callable = as_data.as_callable().expect("expected a callable value");
        assert_eq!(callable.call(&[]), Value::from(7));

        let literal = AttrOptions::new().default("x").into_def("lit".into());
        assert_eq!(literal.default().unwrap().as_literal(), Value::str("x"));
    }

    #[test]
    fn external_rules_accumulate() {
        let def = AttrOptions::new()
            .validates("presence")
            .validates("format")
            .into_def("email".into());

        assert_eq!(def.external_rules(), ["presence", "format"]);
    }
}
