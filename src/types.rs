//! Core types for mapping validator rules onto schema constraints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON type tag for string schemas.
pub const TYPE_STRING: &str = "string";

/// JSON type tag for array schemas.
pub const TYPE_ARRAY: &str = "array";

/// JSON type tag that marks a 2020-12 `type` list as nullable.
pub const TYPE_NULL: &str = "null";

/// Options for one schema generation pass.
///
/// Read-only once the pass starts. Every option defaults to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaGenerationOptions {
    /// Clear `nullable` when a length or item-count minimum above zero is set.
    pub set_not_nullable_if_min_length_greater_then_zero: bool,
    /// Clear `nullable` when a numeric minimum above zero is set.
    pub set_not_nullable_if_minimum_greater_then_zero: bool,
    /// Keep every pattern in `allOf` instead of overwriting `pattern`.
    pub use_all_of_for_multiple_rules: bool,
    /// Fall back to ancestor-type validators when a type has none of its own.
    pub search_base_type_validators: bool,
}

impl SchemaGenerationOptions {
    pub fn not_nullable_if_min_length(mut self, enabled: bool) -> Self {
        self.set_not_nullable_if_min_length_greater_then_zero = enabled;
        self
    }

    pub fn not_nullable_if_minimum(mut self, enabled: bool) -> Self {
        self.set_not_nullable_if_minimum_greater_then_zero = enabled;
        self
    }

    pub fn use_all_of(mut self, enabled: bool) -> Self {
        self.use_all_of_for_multiple_rules = enabled;
        self
    }

    pub fn search_base_types(mut self, enabled: bool) -> Self {
        self.search_base_type_validators = enabled;
        self
    }
}

/// Comparison operator of a comparison rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Comparison {
    /// True for `>` and `<`.
    pub fn is_strict(&self) -> bool {
        matches!(self, Comparison::GreaterThan | Comparison::LessThan)
    }

    /// True for `>` and `>=`.
    pub fn is_lower_bound(&self) -> bool {
        matches!(
            self,
            Comparison::GreaterThan | Comparison::GreaterThanOrEqual
        )
    }
}

/// The kind of constraint a single declared rule encodes.
///
/// Catalogue entries dispatch on this discriminant, never on the rule's
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Value must not be null.
    NotNull,
    /// Value must not be null, empty, or default.
    NotEmpty,
    /// Length or item-count bounds. Zero means unbounded on that side.
    Length {
        #[serde(default)]
        min: u64,
        #[serde(default)]
        max: u64,
    },
    /// Regular-expression constraint.
    Matches { pattern: String },
    /// Email address. Regex-backed email rules carry their expression.
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    /// Comparison against a constant operand.
    Comparison { op: Comparison, value: Value },
    /// Range check, inclusive unless `exclusive` is set.
    Between {
        from: Value,
        to: Value,
        #[serde(default)]
        exclusive: bool,
    },
    /// Nested validator attached to an object-valued property.
    Child { validator: String },
    /// Rule kind outside the built-in catalogue.
    Custom {
        name: String,
        #[serde(default)]
        params: Value,
    },
}

impl RuleKind {
    pub fn length(min: u64, max: u64) -> Self {
        RuleKind::Length { min, max }
    }

    pub fn matches(pattern: impl Into<String>) -> Self {
        RuleKind::Matches {
            pattern: pattern.into(),
        }
    }

    pub fn email() -> Self {
        RuleKind::Email { pattern: None }
    }

    pub fn email_regex(pattern: impl Into<String>) -> Self {
        RuleKind::Email {
            pattern: Some(pattern.into()),
        }
    }

    pub fn compare(op: Comparison, value: impl Into<Value>) -> Self {
        RuleKind::Comparison {
            op,
            value: value.into(),
        }
    }

    pub fn inclusive_between(from: impl Into<Value>, to: impl Into<Value>) -> Self {
        RuleKind::Between {
            from: from.into(),
            to: to.into(),
            exclusive: false,
        }
    }

    pub fn exclusive_between(from: impl Into<Value>, to: impl Into<Value>) -> Self {
        RuleKind::Between {
            from: from.into(),
            to: to.into(),
            exclusive: true,
        }
    }

    pub fn child(validator: impl Into<String>) -> Self {
        RuleKind::Child {
            validator: validator.into(),
        }
    }

    /// The regex carried by this rule, if any.
    pub fn pattern(&self) -> Option<&str> {
        match self {
            RuleKind::Matches { pattern } => Some(pattern),
            RuleKind::Email { pattern } => pattern.as_deref(),
            _ => None,
        }
    }
}

/// Runtime predicate wrapper on a rule.
///
/// Only its presence matters: schemas are static, so the predicate is never
/// evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    When,
    Unless,
    WhenAsync,
    UnlessAsync,
}

/// Whether a rule targets the property itself or each collection item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RuleScope {
    #[default]
    Property,
    Item,
}

/// Read a JSON operand as a number. Non-numeric operands yield `None`.
pub fn numeric_operand(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// Compare property names ignoring case, `_` and `-`.
///
/// `BlogId`, `blogId`, `blog_id` and `blog-id` all match.
pub fn names_match(left: &str, right: &str) -> bool {
    let normalize = |s: &str| -> String {
        s.chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect()
    };
    left == right || normalize(left) == normalize(right)
}
