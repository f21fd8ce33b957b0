//! Rule engine: decides which constraints a property's schema node receives.
//!
//! For one property the engine
//!
//! 1. enumerates rule descriptors from the validators and, recursively,
//!    their includes, in encounter order;
//! 2. drops every conditional rule (its predicate is never evaluated);
//! 3. applies each catalogue entry whose `applies_to` matches the
//!    descriptor's kind, in catalogue order.
//!
//! Item-scope rules target the array's `items` node instead of the array.

use std::sync::Arc;

use tracing::debug;

use crate::catalogue::{default_rules, ApplicationContext, ConstraintRule};
use crate::error::RuleError;
use crate::schema::{Schema, SchemaNode};
use crate::types::{names_match, RuleKind, RuleScope, SchemaGenerationOptions};
use crate::validator::Validator;

/// Rule metadata extracted for one property during one traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyRuleDescriptor<'a> {
    /// Name of the validator that declared the rule.
    pub validator: &'a str,
    /// Property name the rule reports against.
    pub property: &'a str,
    pub kind: &'a RuleKind,
    pub scope: RuleScope,
    /// True when the rule sits behind a `When`/`Unless` predicate.
    pub conditional: bool,
}

impl PropertyRuleDescriptor<'_> {
    /// Conditional rules never reach the schema.
    pub fn is_active(&self) -> bool {
        !self.conditional
    }
}

/// Enumerate descriptors for `property_key` across `validators`.
///
/// Direct rules of a validator come before the rules of its includes. A
/// validator reached twice (diamond includes) contributes once.
pub fn descriptors<'a>(
    validators: &'a [Arc<Validator>],
    property_key: &str,
) -> Vec<PropertyRuleDescriptor<'a>> {
    let mut seen: Vec<*const Validator> = Vec::new();
    let mut out = Vec::new();
    for validator in validators {
        collect(validator, property_key, &mut seen, &mut out);
    }
    out
}

fn collect<'a>(
    validator: &'a Arc<Validator>,
    property_key: &str,
    seen: &mut Vec<*const Validator>,
    out: &mut Vec<PropertyRuleDescriptor<'a>>,
) {
    let ptr = Arc::as_ptr(validator);
    if seen.contains(&ptr) {
        return;
    }
    seen.push(ptr);

    for rule in &validator.rules {
        if names_match(&rule.property, property_key) {
            out.push(PropertyRuleDescriptor {
                validator: &validator.name,
                property: rule.display_name(),
                kind: &rule.kind,
                scope: rule.scope,
                conditional: rule.is_conditional(),
            });
        }
    }

    for include in &validator.includes {
        collect(include, property_key, seen, out);
    }
}

/// Applies validator rules to schema nodes using an ordered catalogue.
///
/// Holds no per-pass state: one engine can serve concurrent passes.
#[derive(Debug)]
pub struct RuleEngine {
    rules: Vec<ConstraintRule>,
    options: SchemaGenerationOptions,
}

impl RuleEngine {
    /// Engine with the built-in catalogue.
    pub fn new(options: SchemaGenerationOptions) -> Self {
        Self::with_rules(options, default_rules())
    }

    /// Engine with an explicit catalogue.
    pub fn with_rules(options: SchemaGenerationOptions, rules: Vec<ConstraintRule>) -> Self {
        Self { rules, options }
    }

    /// Append a catalogue entry, e.g. for a custom rule kind.
    pub fn extend(mut self, rule: ConstraintRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn options(&self) -> &SchemaGenerationOptions {
        &self.options
    }

    pub fn rules(&self) -> &[ConstraintRule] {
        &self.rules
    }

    /// Apply every applicable rule to each property of `object`.
    pub fn apply_object(
        &self,
        validators: &[Arc<Validator>],
        object: &mut SchemaNode,
    ) -> Result<(), RuleError> {
        if validators.is_empty() {
            return Ok(());
        }
        let keys: Vec<String> = object.properties.keys().cloned().collect();
        for key in &keys {
            self.apply_property(validators, object, key)?;
        }
        Ok(())
    }

    /// Apply every applicable rule to the property `property_key` of `object`.
    ///
    /// `object` owns both the property node and the required set. A missing
    /// property is not an error; nothing happens.
    pub fn apply_property(
        &self,
        validators: &[Arc<Validator>],
        object: &mut SchemaNode,
        property_key: &str,
    ) -> Result<(), RuleError> {
        let SchemaNode {
            properties,
            required,
            ..
        } = object;
        let Some(entry) = properties.get_mut(property_key) else {
            return Ok(());
        };
        let found = descriptors(validators, property_key);
        if found.is_empty() {
            return Ok(());
        }
        let boolean = matches!(entry, Schema::Bool(_));
        // `false` admits no value; there is nothing to constrain.
        let Some(property) = entry.materialize() else {
            return Ok(());
        };

        for descriptor in found {
            if !descriptor.is_active() {
                debug!(
                    validator = descriptor.validator,
                    property = descriptor.property,
                    "skipping conditional rule"
                );
                continue;
            }

            match descriptor.scope {
                RuleScope::Property => {
                    self.apply_descriptor(
                        &descriptor,
                        property_key,
                        property,
                        Some(&mut *required),
                    )?;
                }
                RuleScope::Item => {
                    if !property.is_array() {
                        continue;
                    }
                    let Some(items) = property.items.as_deref_mut().and_then(Schema::materialize)
                    else {
                        continue;
                    };
                    self.apply_descriptor(&descriptor, property_key, items, None)?;
                }
            }
        }

        if boolean && *property == SchemaNode::default() {
            *entry = Schema::Bool(true);
        }
        Ok(())
    }

    fn apply_descriptor(
        &self,
        descriptor: &PropertyRuleDescriptor<'_>,
        property_key: &str,
        node: &mut SchemaNode,
        mut required: Option<&mut Vec<String>>,
    ) -> Result<(), RuleError> {
        for rule in self.rules.iter().filter(|r| r.applies_to(descriptor.kind)) {
            let mut context = ApplicationContext {
                property_key,
                rule: descriptor.kind,
                node: &mut *node,
                required: required.as_deref_mut(),
                options: &self.options,
            };
            rule.apply(&mut context)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Condition;
    use crate::validator::PropertyRule;

    #[test]
    fn descriptors_follow_includes_in_order() {
        let address = Arc::new(
            Validator::new("CustomerAddressValidator", "Customer")
                .rule_for("Address", [RuleKind::length(20, 250)]),
        );
        let customer = Arc::new(
            Validator::new("CustomerValidator", "Customer")
                .rule_for("Address", [RuleKind::NotNull])
                .include(address),
        );
        let validators = [customer];
        let found = descriptors(&validators, "address");
        let kinds: Vec<&RuleKind> = found.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, [&RuleKind::NotNull, &RuleKind::length(20, 250)]);
        assert_eq!(found[1].validator, "CustomerAddressValidator");
    }

    #[test]
    fn diamond_include_counts_once() {
        let shared = Arc::new(
            Validator::new("Shared", "T").rule_for("Code", [RuleKind::matches("^[A-Z]+$")]),
        );
        let left = Arc::new(Validator::new("Left", "T").include(Arc::clone(&shared)));
        let right = Arc::new(Validator::new("Right", "T").include(shared));
        let root = Arc::new(Validator::new("Root", "T").include(left).include(right));
        assert_eq!(descriptors(&[root], "Code").len(), 1);
    }

    #[test]
    fn conditional_flag_extracted() {
        let validator = Arc::new(
            Validator::new("V", "T").rule(
                PropertyRule::new("Discount", RuleKind::NotEmpty)
                    .with_condition(Condition::UnlessAsync),
            ),
        );
        let found = descriptors(std::slice::from_ref(&validator), "Discount");
        assert_eq!(found.len(), 1);
        assert!(found[0].conditional);
        assert!(!found[0].is_active());
    }

    #[test]
    fn missing_property_is_noop() {
        let engine = RuleEngine::new(SchemaGenerationOptions::default());
        let validators = [Arc::new(
            Validator::new("V", "T").rule_for("Ghost", [RuleKind::NotNull]),
        )];
        let mut object = SchemaNode::object([("Name", SchemaNode::of_type("string"))]);
        engine
            .apply_property(&validators, &mut object, "Ghost")
            .unwrap();
        assert!(object.required.is_empty());
    }

    #[test]
    fn custom_rule_failure_propagates() {
        let engine = RuleEngine::new(SchemaGenerationOptions::default()).extend(
            ConstraintRule::new("Luhn")
                .with_condition(|kind| matches!(kind, RuleKind::Custom { name, .. } if name == "luhn"))
                .with_apply(|ctx| {
                    Err(RuleError::Failed {
                        rule: "Luhn".into(),
                        property: ctx.property_key.to_string(),
                        message: "no schema form".into(),
                    })
                }),
        );
        let validators = [Arc::new(Validator::new("V", "T").rule_for(
            "Card",
            [RuleKind::Custom {
                name: "luhn".into(),
                params: serde_json::Value::Null,
            }],
        ))];
        let mut object = SchemaNode::object([("Card", SchemaNode::of_type("string"))]);
        let result = engine.apply_object(&validators, &mut object);
        assert!(matches!(result, Err(RuleError::Failed { property, .. }) if property == "Card"));
    }

    #[test]
    fn item_rule_on_non_array_is_skipped() {
        let engine = RuleEngine::new(SchemaGenerationOptions::default());
        let validators = [Arc::new(
            Validator::new("V", "T").rule_for_each("Name", [RuleKind::email()]),
        )];
        let mut object = SchemaNode::object([("Name", SchemaNode::of_type("string"))]);
        engine.apply_object(&validators, &mut object).unwrap();
        assert_eq!(object.property("Name").unwrap().format, None);
    }
}
