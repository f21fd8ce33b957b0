//! Validator definition documents.
//!
//! ```json
//! {
//!   "types": { "InstitutionModel": ["AbstractInstitutionModel"] },
//!   "validators": [
//!     {
//!       "name": "CustomerValidator",
//!       "type": "Customer",
//!       "include": ["CustomerAddressValidator"],
//!       "rules": [
//!         { "property": "Surname", "kind": "not_empty" },
//!         { "property": "Discount", "kind": "not_empty", "condition": "when" },
//!         { "property": "Emails", "each": true, "kind": "email" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Includes are resolved by name into shared validator trees. Validators
//! with `"registered": false` are only reachable through includes or child
//! references.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LoadError;
use crate::registry::ValidatorRegistry;
use crate::types::{Condition, RuleKind, RuleScope};
use crate::validator::{PropertyRule, Validator};

/// Top-level definition document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Definitions {
    /// Ancestor chains per type, nearest first.
    #[serde(default)]
    pub types: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub validators: Vec<ValidatorDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(default = "default_registered")]
    pub registered: bool,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

fn default_registered() -> bool {
    true
}

/// Rule keys outside the flattened `RuleKind`.
const RULE_FIELDS: [&str; 4] = ["property", "each", "condition", "override_name"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub property: String,
    /// Apply to each collection item.
    #[serde(default)]
    pub each: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_name: Option<String>,
    #[serde(flatten)]
    pub kind: RuleKind,
}

impl RuleDefinition {
    fn to_rule(&self) -> PropertyRule {
        PropertyRule {
            property: self.property.clone(),
            override_name: self.override_name.clone(),
            kind: self.kind.clone(),
            scope: if self.each {
                RuleScope::Item
            } else {
                RuleScope::Property
            },
            condition: self.condition,
        }
    }
}

impl Definitions {
    /// Parse a definition document.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidDefinitions` if the document doesn't match
    /// the definition format, and `LoadError::UnknownRuleField` if a rule
    /// carries a key its kind doesn't define.
    pub fn from_value(value: Value) -> Result<Self, LoadError> {
        let definitions: Definitions = serde_json::from_value(value.clone())
            .map_err(|source| LoadError::InvalidDefinitions { source })?;
        definitions.check_rule_fields(&value)?;
        Ok(definitions)
    }

    /// The flattened rule kind swallows unknown keys, so compare each raw
    /// rule object against the fields its parsed kind writes back.
    fn check_rule_fields(&self, raw: &Value) -> Result<(), LoadError> {
        let raw_validators = raw.get("validators").and_then(Value::as_array);
        for (index, def) in self.validators.iter().enumerate() {
            let raw_rules = raw_validators
                .and_then(|validators| validators.get(index))
                .and_then(|validator| validator.get("rules"))
                .and_then(Value::as_array);
            for (rule, raw_rule) in def.rules.iter().zip(raw_rules.into_iter().flatten()) {
                let Some(fields) = raw_rule.as_object() else {
                    continue;
                };
                let kind = serde_json::to_value(&rule.kind)
                    .map_err(|source| LoadError::InvalidDefinitions { source })?;
                let unknown = fields.keys().find(|field| {
                    !RULE_FIELDS.contains(&field.as_str())
                        && kind.get(field.as_str()).is_none()
                });
                if let Some(field) = unknown {
                    return Err(LoadError::UnknownRuleField {
                        validator: def.name.clone(),
                        property: rule.property.clone(),
                        field: field.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolve includes and child references and build a registry.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` for duplicate names, unknown include or child
    /// names, and include cycles.
    pub fn into_registry(self) -> Result<ValidatorRegistry, LoadError> {
        let mut by_name: HashMap<&str, &ValidatorDefinition> = HashMap::new();
        for def in &self.validators {
            if by_name.insert(def.name.as_str(), def).is_some() {
                return Err(LoadError::DuplicateValidator {
                    name: def.name.clone(),
                });
            }
        }

        let mut built: HashMap<String, Arc<Validator>> = HashMap::new();
        for def in &self.validators {
            build(&def.name, &by_name, &mut built, &mut Vec::new())?;
        }

        let mut registry = ValidatorRegistry::new();
        for (type_name, ancestors) in &self.types {
            registry.declare_ancestors(type_name.clone(), ancestors.iter().cloned());
        }

        let mut pending: Vec<Arc<Validator>> = Vec::new();
        for def in self.validators.iter().filter(|d| d.registered) {
            let validator = Arc::clone(&built[&def.name]);
            registry.register(Arc::clone(&validator));
            pending.push(validator);
        }

        // Child validators are registered for their own type unless that
        // type already has validators.
        while let Some(validator) = pending.pop() {
            for child in validator.child_validators() {
                let child_validator =
                    built
                        .get(child)
                        .ok_or_else(|| LoadError::UnknownChild {
                            validator: validator.name.clone(),
                            child: child.to_string(),
                        })?;
                if registry.get(child).is_none()
                    && !registry.has_validators(&child_validator.target_type)
                {
                    registry.register(Arc::clone(child_validator));
                    pending.push(Arc::clone(child_validator));
                }
            }
        }

        Ok(registry)
    }
}

fn build(
    name: &str,
    by_name: &HashMap<&str, &ValidatorDefinition>,
    built: &mut HashMap<String, Arc<Validator>>,
    stack: &mut Vec<String>,
) -> Result<Arc<Validator>, LoadError> {
    if let Some(validator) = built.get(name) {
        return Ok(Arc::clone(validator));
    }
    if let Some(start) = stack.iter().position(|n| n == name) {
        let mut chain = stack[start..].to_vec();
        chain.push(name.to_string());
        return Err(LoadError::IncludeCycle { chain });
    }

    let Some(def) = by_name.get(name) else {
        return Err(LoadError::UnknownInclude {
            validator: stack.last().cloned().unwrap_or_default(),
            include: name.to_string(),
        });
    };

    stack.push(name.to_string());
    let mut validator = Validator::new(&def.name, &def.target_type);
    validator.rules = def.rules.iter().map(RuleDefinition::to_rule).collect();
    for include in &def.include {
        if !by_name.contains_key(include.as_str()) {
            return Err(LoadError::UnknownInclude {
                validator: def.name.clone(),
                include: include.clone(),
            });
        }
        validator
            .includes
            .push(build(include, by_name, built, stack)?);
    }
    stack.pop();

    let validator = Arc::new(validator);
    built.insert(name.to_string(), Arc::clone(&validator));
    Ok(validator)
}
