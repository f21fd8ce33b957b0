//! Validator Schema
//!
//! Maps declarative validator rules onto OpenAPI 3.0 schema constraints.
//!
//! Validators declare rules per property (`NotEmpty`, `Length`, `Matches`,
//! comparisons, ranges, ...). For every generated type schema, the engine
//! finds the validators registered for that type and translates each
//! unconditional rule into the equivalent schema keywords (`required`,
//! `minLength`, `pattern`, `minimum`, ...), tightening bounds rather than
//! overwriting them when several rules hit the same property.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use validator_schema::{
//!     apply_to_document, Comparison, RuleKind, Services, ValidationRulesFilter, Validator,
//!     ValidatorRegistry,
//! };
//!
//! let registry = ValidatorRegistry::new().with(
//!     Validator::new("CustomerValidator", "Customer")
//!         .rule_for("Surname", [RuleKind::NotEmpty, RuleKind::length(0, 250)])
//!         .rule_for("Discount", [RuleKind::compare(Comparison::GreaterThan, 0)]),
//! );
//!
//! let mut document = json!({
//!     "components": { "schemas": { "Customer": {
//!         "type": "object",
//!         "properties": {
//!             "Surname": { "type": "string", "nullable": true },
//!             "Discount": { "type": "number" }
//!         }
//!     }}}
//! });
//!
//! let filter = ValidationRulesFilter::from_services(&Services::default());
//! apply_to_document(&mut document, &filter, &registry).unwrap();
//!
//! let customer = &document["components"]["schemas"]["Customer"];
//! assert_eq!(customer["required"], json!(["Surname"]));
//! assert_eq!(customer["properties"]["Surname"]["minLength"], 1);
//! assert_eq!(customer["properties"]["Surname"]["maxLength"], 250);
//! assert_eq!(customer["properties"]["Discount"]["minimum"], 0);
//! assert_eq!(customer["properties"]["Discount"]["exclusiveMinimum"], true);
//! ```
//!
//! # Rule Catalogue
//!
//! | Rule | Schema effect |
//! |------|---------------|
//! | `NotNull` | property added to `required`, `nullable` cleared |
//! | `NotEmpty` | as `NotNull`, plus `minLength: 1` (strings) or `minItems: 1` (arrays) |
//! | `Length` | `minLength`/`maxLength`, or `minItems`/`maxItems` on arrays |
//! | `Matches` | `pattern`, or `allOf` entries when composing |
//! | `Email` | `format: email` (and `pattern` when regex-backed) |
//! | `Comparison` | `minimum`/`maximum` with exclusive flags for strict operators |
//! | `Between` | `minimum` and `maximum` |
//!
//! Rules behind a `When`/`Unless` condition are never applied.

mod catalogue;
mod definitions;
mod engine;
mod error;
mod filter;
mod loader;
mod merge;
mod pipeline;
mod registry;
mod schema;
mod types;
mod validator;

pub use catalogue::{default_rules, ApplicationContext, ConstraintRule};
pub use definitions::{Definitions, RuleDefinition, ValidatorDefinition};
pub use engine::{descriptors, PropertyRuleDescriptor, RuleEngine};
pub use error::{GenerateError, LoadError, RuleError};
pub use filter::{
    GenerationScope, SchemaFilter, SchemaFilterContext, ScopeTracker, Services,
    ValidationRulesFilter,
};
pub use loader::{
    is_url, load_document, load_document_auto, load_document_str, load_options, load_validators,
};
pub use pipeline::{apply_to_document, schema_section, SCHEMA_SECTIONS};
pub use registry::ValidatorRegistry;
pub use schema::{ExclusiveBound, Schema, SchemaNode, SchemaType};
pub use types::{
    names_match, Comparison, Condition, RuleKind, RuleScope, SchemaGenerationOptions,
};
pub use validator::{PropertyRule, Validator};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
