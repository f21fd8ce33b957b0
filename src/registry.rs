//! Validator lookup by type, with optional fallback to ancestor types.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::types::SchemaGenerationOptions;
use crate::validator::Validator;

/// Validators registered per type, plus each type's ancestor chain.
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    by_type: HashMap<String, Vec<Arc<Validator>>>,
    by_name: HashMap<String, Arc<Validator>>,
    /// Ancestors per type, nearest first.
    ancestors: HashMap<String, Vec<String>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validator for its target type.
    pub fn register(&mut self, validator: Arc<Validator>) {
        self.by_name
            .insert(validator.name.clone(), Arc::clone(&validator));
        self.by_type
            .entry(validator.target_type.clone())
            .or_default()
            .push(validator);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, validator: Validator) -> Self {
        self.register(Arc::new(validator));
        self
    }

    /// Declare the ancestor chain of a type, nearest ancestor first.
    pub fn declare_ancestors<I, S>(&mut self, type_name: impl Into<String>, ancestors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ancestors.insert(
            type_name.into(),
            ancestors.into_iter().map(Into::into).collect(),
        );
    }

    pub fn with_ancestors<I, S>(mut self, type_name: impl Into<String>, ancestors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare_ancestors(type_name, ancestors);
        self
    }

    pub fn has_validators(&self, type_name: &str) -> bool {
        self.by_type
            .get(type_name)
            .is_some_and(|validators| !validators.is_empty())
    }

    /// Look up a registered validator by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Validator>> {
        self.by_name.get(name)
    }

    /// Validators that apply to `type_name`.
    ///
    /// Validators registered for the type itself win. Otherwise, when
    /// `search_base_type_validators` is on, the ancestor chain is walked in
    /// order and the first ancestor with validators supplies them.
    pub fn validators_for(
        &self,
        type_name: &str,
        options: &SchemaGenerationOptions,
    ) -> Vec<Arc<Validator>> {
        if let Some(validators) = self.by_type.get(type_name) {
            if !validators.is_empty() {
                return validators.clone();
            }
        }

        if !options.search_base_type_validators {
            return Vec::new();
        }

        let ancestors = self.ancestors.get(type_name).map(Vec::as_slice);
        for ancestor in ancestors.unwrap_or_default() {
            if let Some(validators) = self.by_type.get(ancestor) {
                if !validators.is_empty() {
                    debug!(
                        type_name,
                        ancestor = %ancestor,
                        "using base type validators"
                    );
                    return validators.clone();
                }
            }
        }

        Vec::new()
    }
}
