//! Per-attribute acceptance and rejection rules.
//!
//! A [`Validation`] pairs a [`Rule`] with a polarity: `accept` means the rule
//! must hold, `reject` means it must not. Rules are picked at schema-build
//! time as an explicit sum — a structural kind check, a built-in predicate, or
//! a custom test function — so no shape sniffing happens per value.

use std::fmt;
use std::sync::Arc;

use crate::value::{Data, Value, ValueKind};

/// Which way a rule cuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Accept,
    Reject,
}

/// Built-in zero-argument predicates usable as validation rules.
///
/// Names render with their trailing `?` in error messages
/// (`expected to be empty?`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Nil,
    Empty,
    Zero,
    Positive,
    Negative,
    Truthy,
    Frozen,
}

impl Predicate {
    pub const ALL: &'static [Predicate] = &[
        Predicate::Nil,
        Predicate::Empty,
        Predicate::Zero,
        Predicate::Positive,
        Predicate::Negative,
        Predicate::Truthy,
        Predicate::Frozen,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Predicate::Nil => "nil?",
            Predicate::Empty => "empty?",
            Predicate::Zero => "zero?",
            Predicate::Positive => "positive?",
            Predicate::Negative => "negative?",
            Predicate::Truthy => "truthy?",
            Predicate::Frozen => "frozen?",
        }
    }

    /// Look a predicate up by its `name?` spelling.
    pub fn named(name: &str) -> Option<Predicate> {
        Predicate::ALL.iter().copied().find(|p| p.name() == name)
    }

    pub fn eval(&self, value: &Value) -> bool {
        match self {
            Predicate::Nil => value.is_nil(),
            Predicate::Empty => match value.data() {
                Data::Str(s) => s.is_empty(),
                Data::List(items) => items.is_empty(),
                Data::Map(entries) => entries.is_empty(),
                _ => false,
            },
            Predicate::Zero => {
                value.as_int() == Some(0) || value.as_float() == Some(0.0)
            }
            Predicate::Positive => value.as_float().is_some_and(|x| x > 0.0),
            Predicate::Negative => value.as_float().is_some_and(|x| x < 0.0),
            Predicate::Truthy => value.truthy(),
            Predicate::Frozen => value.is_frozen(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validation rule, tagged at schema-build time.
#[derive(Clone)]
pub enum Rule {
    /// Structural check: is the value of this kind?
    Kind(ValueKind),
    /// One of the built-in predicates.
    Predicate(Predicate),
    /// A custom test function.
    Test(Arc<dyn Fn(&Value) -> bool + Send + Sync>),
}

impl Rule {
    pub fn test(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Rule {
        Rule::Test(Arc::new(f))
    }

    fn holds(&self, value: &Value) -> bool {
        match self {
            Rule::Kind(kind) => value.kind() == *kind,
            Rule::Predicate(predicate) => predicate.eval(value),
            Rule::Test(f) => f(value),
        }
    }

    /// The default message for a failed `accept` / tripped `reject`.
    fn message(&self, polarity: Polarity) -> String {
        match (self, polarity) {
            (Rule::Kind(kind), Polarity::Accept) => {
                format!("expected to be a kind of {}", kind)
            }
            (Rule::Kind(kind), Polarity::Reject) => {
                format!("expected to not be a kind of {}", kind)
            }
            (Rule::Predicate(predicate), Polarity::Accept) => {
                format!("expected to be {}", predicate)
            }
            (Rule::Predicate(predicate), Polarity::Reject) => {
                format!("expected to not be {}", predicate)
            }
            (Rule::Test(_), _) => "is invalid".to_string(),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            Rule::Predicate(predicate) => f.debug_tuple("Predicate").field(predicate).finish(),
            Rule::Test(_) => f.write_str("Test(..)"),
        }
    }
}

/// A custom rejection message: literal, or generated from the attribute name.
#[derive(Clone)]
pub enum RejectionMessage {
    Text(String),
    Lazy(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl RejectionMessage {
    fn render(&self, name: &str) -> String {
        match self {
            RejectionMessage::Text(text) => text.clone(),
            RejectionMessage::Lazy(f) => f(name),
        }
    }
}

impl fmt::Debug for RejectionMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionMessage::Text(text) => f.debug_tuple("Text").field(text).finish(),
            RejectionMessage::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// A complete per-attribute validation spec.
#[derive(Debug, Clone)]
pub struct Validation {
    polarity: Polarity,
    rule: Rule,
    allow_nil: bool,
    message: Option<RejectionMessage>,
}

impl Validation {
    pub fn accept(rule: Rule) -> Validation {
        Validation {
            polarity: Polarity::Accept,
            rule,
            allow_nil: false,
            message: None,
        }
    }

    pub fn reject(rule: Rule) -> Validation {
        Validation {
            polarity: Polarity::Reject,
            rule,
            allow_nil: false,
            message: None,
        }
    }

    pub fn allow_nil(mut self) -> Validation {
        self.allow_nil = true;
        self
    }

    pub fn rejection_message(mut self, text: impl Into<String>) -> Validation {
        self.message = Some(RejectionMessage::Text(text.into()));
        self
    }

    pub fn rejection_message_with(
        mut self,
        f: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Validation {
        self.message = Some(RejectionMessage::Lazy(Arc::new(f)));
        self
    }

    pub(crate) fn with_message(mut self, message: RejectionMessage) -> Validation {
        self.message = Some(message);
        self
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Whether this validation accepts values of the given kind, i.e. the rule
    /// is `accept` + `Kind(kind)`. The resolver uses this to spot attributes
    /// that hold callables as data.
    pub fn accepts_kind(&self, kind: ValueKind) -> bool {
        self.polarity == Polarity::Accept && matches!(self.rule, Rule::Kind(k) if k == kind)
    }

    /// Run the validation; `Some(message)` on failure.
    pub fn run(&self, name: &str, value: &Value) -> Option<String> {
        if self.allow_nil && value.is_nil() {
            return None;
        }

        let holds = self.rule.holds(value);
        let failed = match self.polarity {
            Polarity::Accept => !holds,
            Polarity::Reject => holds,
        };

        if !failed {
            return None;
        }

        Some(match &self.message {
            Some(message) => message.render(name),
            None => self.rule.message(self.polarity),
        })
    }
}
