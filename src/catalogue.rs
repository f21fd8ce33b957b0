//! The rule catalogue: named (applies-to, apply) pairs.
//!
//! | Entry | Fires on | Effect |
//! |-------|----------|--------|
//! | `Required` | `NotNull`, `NotEmpty` | add to owner's `required`, clear `nullable` |
//! | `NotEmpty` | `NotEmpty` | `minLength = 1` on strings, `minItems = 1` on arrays |
//! | `Length` | `Length` | `minItems`/`maxItems` on arrays, else `minLength`/`maxLength` |
//! | `Pattern` | `Matches`, regex `Email` | `pattern`, or `allOf` when composing |
//! | `EMail` | `Email` | `format = "email"` |
//! | `Comparison` | `Comparison` | `minimum`/`maximum` (+ exclusive flag) |
//! | `Between` | `Between` | `minimum` and `maximum` |

use std::fmt;

use tracing::trace;

use crate::error::RuleError;
use crate::merge;
use crate::schema::SchemaNode;
use crate::types::{numeric_operand, RuleKind, SchemaGenerationOptions};

/// Everything one rule application may read or write.
pub struct ApplicationContext<'a> {
    /// Schema key of the constrained property.
    pub property_key: &'a str,
    pub rule: &'a RuleKind,
    /// The property node, or the item node for item-scope rules.
    pub node: &'a mut SchemaNode,
    /// Required set of the owning object. `None` for item-scope rules.
    pub required: Option<&'a mut Vec<String>>,
    pub options: &'a SchemaGenerationOptions,
}

type AppliesTo = dyn Fn(&RuleKind) -> bool + Send + Sync;
type Apply = dyn Fn(&mut ApplicationContext<'_>) -> Result<(), RuleError> + Send + Sync;

/// A named constraint rule. Immutable once built.
pub struct ConstraintRule {
    name: String,
    applies_to: Box<AppliesTo>,
    apply: Box<Apply>,
}

impl ConstraintRule {
    /// Create a rule that matches nothing and does nothing.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            applies_to: Box::new(|_| false),
            apply: Box::new(|_| Ok(())),
        }
    }

    pub fn with_condition<F>(mut self, applies_to: F) -> Self
    where
        F: Fn(&RuleKind) -> bool + Send + Sync + 'static,
    {
        self.applies_to = Box::new(applies_to);
        self
    }

    pub fn with_apply<F>(mut self, apply: F) -> Self
    where
        F: Fn(&mut ApplicationContext<'_>) -> Result<(), RuleError> + Send + Sync + 'static,
    {
        self.apply = Box::new(apply);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn applies_to(&self, kind: &RuleKind) -> bool {
        (self.applies_to)(kind)
    }

    pub fn apply(&self, context: &mut ApplicationContext<'_>) -> Result<(), RuleError> {
        trace!(rule = %self.name, property = context.property_key, "applying");
        (self.apply)(context)
    }
}

impl fmt::Debug for ConstraintRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The built-in catalogue, in application order.
pub fn default_rules() -> Vec<ConstraintRule> {
    vec![
        ConstraintRule::new("Required")
            .with_condition(|kind| matches!(kind, RuleKind::NotNull | RuleKind::NotEmpty))
            .with_apply(apply_required),
        ConstraintRule::new("NotEmpty")
            .with_condition(|kind| matches!(kind, RuleKind::NotEmpty))
            .with_apply(apply_not_empty),
        ConstraintRule::new("Length")
            .with_condition(|kind| matches!(kind, RuleKind::Length { .. }))
            .with_apply(apply_length),
        ConstraintRule::new("Pattern")
            .with_condition(|kind| kind.pattern().is_some())
            .with_apply(apply_pattern),
        ConstraintRule::new("EMail")
            .with_condition(|kind| matches!(kind, RuleKind::Email { .. }))
            .with_apply(apply_email),
        ConstraintRule::new("Comparison")
            .with_condition(|kind| matches!(kind, RuleKind::Comparison { .. }))
            .with_apply(apply_comparison),
        ConstraintRule::new("Between")
            .with_condition(|kind| matches!(kind, RuleKind::Between { .. }))
            .with_apply(apply_between),
    ]
}

fn apply_required(ctx: &mut ApplicationContext<'_>) -> Result<(), RuleError> {
    if let Some(required) = ctx.required.as_deref_mut() {
        if !required.iter().any(|name| name == ctx.property_key) {
            required.push(ctx.property_key.to_string());
        }
    }
    ctx.node.clear_nullable();
    Ok(())
}

fn apply_not_empty(ctx: &mut ApplicationContext<'_>) -> Result<(), RuleError> {
    let clear_nullable = ctx.options.set_not_nullable_if_min_length_greater_then_zero;
    if ctx.node.is_string() {
        merge::set_min_length(ctx.node, 1, clear_nullable);
    } else if ctx.node.is_array() {
        merge::set_min_items(ctx.node, 1, clear_nullable);
    }
    Ok(())
}

fn apply_length(ctx: &mut ApplicationContext<'_>) -> Result<(), RuleError> {
    let RuleKind::Length { min, max } = *ctx.rule else {
        return Ok(());
    };
    let clear_nullable = ctx.options.set_not_nullable_if_min_length_greater_then_zero;

    if ctx.node.is_array() {
        if max > 0 {
            merge::set_max_items(ctx.node, max);
        }
        if min > 0 {
            merge::set_min_items(ctx.node, min, clear_nullable);
        }
    } else {
        if max > 0 {
            merge::set_max_length(ctx.node, max);
        }
        if min > 0 {
            merge::set_min_length(ctx.node, min, clear_nullable);
        }
    }
    Ok(())
}

fn apply_pattern(ctx: &mut ApplicationContext<'_>) -> Result<(), RuleError> {
    if let Some(pattern) = ctx.rule.pattern() {
        merge::set_pattern(ctx.node, pattern, ctx.options.use_all_of_for_multiple_rules);
    }
    Ok(())
}

fn apply_email(ctx: &mut ApplicationContext<'_>) -> Result<(), RuleError> {
    ctx.node.format = Some("email".to_string());
    Ok(())
}

fn apply_comparison(ctx: &mut ApplicationContext<'_>) -> Result<(), RuleError> {
    let RuleKind::Comparison { op, value } = ctx.rule else {
        return Ok(());
    };
    let Some(operand) = numeric_operand(value) else {
        return Ok(());
    };

    if op.is_lower_bound() {
        merge::set_minimum(
            ctx.node,
            operand,
            op.is_strict(),
            ctx.options.set_not_nullable_if_minimum_greater_then_zero,
        );
    } else {
        merge::set_maximum(ctx.node, operand, op.is_strict());
    }
    Ok(())
}

fn apply_between(ctx: &mut ApplicationContext<'_>) -> Result<(), RuleError> {
    let RuleKind::Between {
        from,
        to,
        exclusive,
    } = ctx.rule
    else {
        return Ok(());
    };

    // Range bounds only apply to numbers; date-time ranges have no schema form.
    if let Some(from) = numeric_operand(from) {
        merge::set_minimum(
            ctx.node,
            from,
            *exclusive,
            ctx.options.set_not_nullable_if_minimum_greater_then_zero,
        );
    }
    if let Some(to) = numeric_operand(to) {
        merge::set_maximum(ctx.node, to, *exclusive);
    }
    Ok(())
}
