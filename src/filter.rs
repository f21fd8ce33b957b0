//! Host adapter: the schema-filter extension point.
//!
//! The host owns the engine and passes it in through [`Services`]. If the
//! host never registered one, the filter builds its own and logs a warning
//! instead of failing generation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::RuleEngine;
use crate::error::RuleError;
use crate::registry::ValidatorRegistry;
use crate::schema::SchemaNode;
use crate::types::SchemaGenerationOptions;

/// What the host knows about the schema being generated.
#[derive(Debug, Clone, Copy)]
pub struct SchemaFilterContext<'a> {
    /// Name of the type the schema describes.
    pub type_name: &'a str,
    pub registry: &'a ValidatorRegistry,
}

/// Extension point invoked once per generated type schema.
pub trait SchemaFilter {
    /// Whether the filter has anything to do for `context.type_name`.
    /// Schemas it doesn't apply to are never parsed.
    fn applies_to(&self, _context: &SchemaFilterContext<'_>) -> bool {
        true
    }

    /// Mutate `schema` in place.
    fn apply(
        &self,
        schema: &mut SchemaNode,
        context: &SchemaFilterContext<'_>,
    ) -> Result<(), RuleError>;
}

/// Shared services the host hands to its filters.
#[derive(Debug, Clone, Default)]
pub struct Services {
    engine: Option<Arc<RuleEngine>>,
    options: SchemaGenerationOptions,
}

impl Services {
    pub fn new(options: SchemaGenerationOptions) -> Self {
        Self {
            engine: None,
            options,
        }
    }

    /// Register the engine instance filters should share.
    pub fn with_engine(mut self, engine: Arc<RuleEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn engine(&self) -> Option<&Arc<RuleEngine>> {
        self.engine.as_ref()
    }

    pub fn options(&self) -> &SchemaGenerationOptions {
        &self.options
    }
}

/// Counts generation scopes so a host can check every pass released its own.
#[derive(Debug, Clone, Default)]
pub struct ScopeTracker {
    active: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
}

impl ScopeTracker {
    /// Open a scope for one generation pass. Released on drop.
    pub fn enter(&self, type_name: &str) -> GenerationScope {
        self.active.fetch_add(1, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
        debug!(type_name, "generation scope opened");
        GenerationScope {
            tracker: self.clone(),
            type_name: type_name.to_string(),
        }
    }

    /// Scopes currently open.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Scopes opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

/// Scoped resource for one generation pass.
#[derive(Debug)]
pub struct GenerationScope {
    tracker: ScopeTracker,
    type_name: String,
}

impl GenerationScope {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl Drop for GenerationScope {
    fn drop(&mut self) {
        self.tracker.active.fetch_sub(1, Ordering::SeqCst);
        debug!(type_name = %self.type_name, "generation scope released");
    }
}

/// Applies registered validator rules to every property of a type schema.
#[derive(Debug, Clone)]
pub struct ValidationRulesFilter {
    engine: Arc<RuleEngine>,
    scopes: ScopeTracker,
}

impl ValidationRulesFilter {
    pub fn new(engine: Arc<RuleEngine>) -> Self {
        Self {
            engine,
            scopes: ScopeTracker::default(),
        }
    }

    /// Build the filter from host services.
    ///
    /// Falls back to a fresh engine built from the services' options when
    /// none was registered. A registered engine keeps its own options.
    pub fn from_services(services: &Services) -> Self {
        let engine = match services.engine() {
            Some(engine) => {
                if engine.options() != services.options() {
                    warn!(
                        engine = ?engine.options(),
                        services = ?services.options(),
                        "registered rule engine options differ from the service options; using the engine's"
                    );
                }
                Arc::clone(engine)
            }
            None => {
                warn!(
                    "no rule engine registered in services; constructing one from the configured options"
                );
                Arc::new(RuleEngine::new(*services.options()))
            }
        };
        Self::new(engine)
    }

    pub fn engine(&self) -> &Arc<RuleEngine> {
        &self.engine
    }

    pub fn scopes(&self) -> &ScopeTracker {
        &self.scopes
    }
}

impl SchemaFilter for ValidationRulesFilter {
    fn applies_to(&self, context: &SchemaFilterContext<'_>) -> bool {
        !context
            .registry
            .validators_for(context.type_name, self.engine.options())
            .is_empty()
    }

    fn apply(
        &self,
        schema: &mut SchemaNode,
        context: &SchemaFilterContext<'_>,
    ) -> Result<(), RuleError> {
        let _scope = self.scopes.enter(context.type_name);
        let validators = context
            .registry
            .validators_for(context.type_name, self.engine.options());
        self.engine.apply_object(&validators, schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::ConstraintRule;
    use crate::types::RuleKind;
    use crate::validator::Validator;

    fn registry() -> ValidatorRegistry {
        ValidatorRegistry::new().with(
            Validator::new("PersonValidator", "Person").rule_for("Name", [RuleKind::NotNull]),
        )
    }

    #[test]
    fn registered_engine_is_shared() {
        let engine = Arc::new(RuleEngine::new(SchemaGenerationOptions::default()));
        let services = Services::default().with_engine(Arc::clone(&engine));
        let filter = ValidationRulesFilter::from_services(&services);
        assert!(Arc::ptr_eq(filter.engine(), &engine));
    }

    #[test]
    fn registered_engine_options_win_over_services() {
        let engine = Arc::new(RuleEngine::new(
            SchemaGenerationOptions::default().search_base_types(true),
        ));
        let services = Services::new(SchemaGenerationOptions::default().use_all_of(true))
            .with_engine(Arc::clone(&engine));
        let filter = ValidationRulesFilter::from_services(&services);
        assert!(filter.engine().options().search_base_type_validators);
        assert!(!filter.engine().options().use_all_of_for_multiple_rules);
    }

    #[test]
    fn applies_only_to_types_with_validators() {
        let filter = ValidationRulesFilter::from_services(&Services::default());
        let registry = registry().with_ancestors("Employee", ["Person"]);
        let context = |type_name| SchemaFilterContext {
            type_name,
            registry: &registry,
        };
        assert!(filter.applies_to(&context("Person")));
        assert!(!filter.applies_to(&context("Other")));
        // base types are only searched when enabled
        assert!(!filter.applies_to(&context("Employee")));
    }

    #[test]
    fn missing_engine_falls_back_to_options() {
        let options = SchemaGenerationOptions::default().use_all_of(true);
        let filter = ValidationRulesFilter::from_services(&Services::new(options));
        assert_eq!(*filter.engine().options(), options);
    }

    #[test]
    fn apply_uses_registry_for_type() {
        let filter = ValidationRulesFilter::from_services(&Services::default());
        let registry = registry();
        let mut schema = SchemaNode::object([("Name", SchemaNode::of_type("string").nullable())]);
        let context = SchemaFilterContext {
            type_name: "Person",
            registry: &registry,
        };
        filter.apply(&mut schema, &context).unwrap();
        assert_eq!(schema.required, ["Name"]);
        assert!(!schema.property("Name").unwrap().nullable);
        assert_eq!(filter.scopes().opened(), 1);
        assert_eq!(filter.scopes().active(), 0);
    }

    #[test]
    fn scope_released_when_rule_fails() {
        let engine = RuleEngine::new(SchemaGenerationOptions::default()).extend(
            ConstraintRule::new("Failing")
                .with_condition(|kind| matches!(kind, RuleKind::NotNull))
                .with_apply(|ctx| {
                    Err(RuleError::Failed {
                        rule: "Failing".into(),
                        property: ctx.property_key.to_string(),
                        message: "boom".into(),
                    })
                }),
        );
        let filter = ValidationRulesFilter::new(Arc::new(engine));
        let registry = registry();
        let mut schema = SchemaNode::object([("Name", SchemaNode::of_type("string"))]);
        let context = SchemaFilterContext {
            type_name: "Person",
            registry: &registry,
        };

        assert!(filter.apply(&mut schema, &context).is_err());
        assert_eq!(filter.scopes().opened(), 1);
        assert_eq!(filter.scopes().active(), 0);
    }

    #[test]
    fn scope_reports_type_name() {
        let tracker = ScopeTracker::default();
        let scope = tracker.enter("Person");
        assert_eq!(scope.type_name(), "Person");
        assert_eq!(tracker.active(), 1);
        drop(scope);
        assert_eq!(tracker.active(), 0);
    }
}
