//! Declarative validators: per-property rules, inclusions and conditions.

use std::sync::Arc;

use crate::types::{Condition, RuleKind, RuleScope};

/// One rule declared on one property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRule {
    /// Property the rule was declared for.
    pub property: String,
    /// Property name the rule reports against, when overridden.
    pub override_name: Option<String>,
    pub kind: RuleKind,
    pub scope: RuleScope,
    pub condition: Option<Condition>,
}

impl PropertyRule {
    /// A rule on the property value (`RuleFor`).
    pub fn new(property: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            property: property.into(),
            override_name: None,
            kind,
            scope: RuleScope::Property,
            condition: None,
        }
    }

    /// A rule on each collection item (`RuleForEach`).
    pub fn for_each(property: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            scope: RuleScope::Item,
            ..Self::new(property, kind)
        }
    }

    /// Attach a runtime condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn when(self) -> Self {
        self.with_condition(Condition::When)
    }

    pub fn unless(self) -> Self {
        self.with_condition(Condition::Unless)
    }

    /// Report the rule against another property name.
    pub fn override_property_name(mut self, name: impl Into<String>) -> Self {
        self.override_name = Some(name.into());
        self
    }

    /// Name the rule reports against. Schema matching always uses
    /// `property`, so an override never moves the rule onto another key.
    pub fn display_name(&self) -> &str {
        self.override_name.as_deref().unwrap_or(&self.property)
    }

    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }
}

/// A named set of rules for one type.
#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    pub name: String,
    /// Type the validator was declared for.
    pub target_type: String,
    pub rules: Vec<PropertyRule>,
    /// Validators whose rules are merged in (`Include`), in declaration order.
    pub includes: Vec<Arc<Validator>>,
}

impl Validator {
    pub fn new(name: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_type: target_type.into(),
            rules: Vec::new(),
            includes: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: PropertyRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add several rules to one property, in order.
    pub fn rule_for<I>(mut self, property: &str, kinds: I) -> Self
    where
        I: IntoIterator<Item = RuleKind>,
    {
        self.rules.extend(
            kinds
                .into_iter()
                .map(|kind| PropertyRule::new(property, kind)),
        );
        self
    }

    /// Add several item rules to one collection property, in order.
    pub fn rule_for_each<I>(mut self, property: &str, kinds: I) -> Self
    where
        I: IntoIterator<Item = RuleKind>,
    {
        self.rules.extend(
            kinds
                .into_iter()
                .map(|kind| PropertyRule::for_each(property, kind)),
        );
        self
    }

    /// Add rules under a shared condition (`When(..., () => { ... })`).
    pub fn conditional<I>(mut self, condition: Condition, rules: I) -> Self
    where
        I: IntoIterator<Item = PropertyRule>,
    {
        self.rules.extend(
            rules
                .into_iter()
                .map(|rule| rule.with_condition(condition)),
        );
        self
    }

    pub fn include(mut self, validator: Arc<Validator>) -> Self {
        self.includes.push(validator);
        self
    }

    /// Names of child validators attached through `Child` rules, recursively
    /// through includes.
    pub fn child_validators(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_children(self, &mut names);
        names
    }
}

fn collect_children<'a>(validator: &'a Validator, names: &mut Vec<&'a str>) {
    for rule in &validator.rules {
        if let RuleKind::Child { validator } = &rule.kind {
            if !names.contains(&validator.as_str()) {
                names.push(validator);
            }
        }
    }
    for include in &validator.includes {
        collect_children(include, names);
    }
}
