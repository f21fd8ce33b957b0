//! Document-level generation: run a schema filter over every type schema in
//! an OpenAPI or JSON Schema document.

use serde_json::Value;
use tracing::debug;

use crate::error::GenerateError;
use crate::filter::{SchemaFilter, SchemaFilterContext};
use crate::registry::ValidatorRegistry;
use crate::schema::SchemaNode;

/// Locations of the type schema map, in lookup order.
pub const SCHEMA_SECTIONS: [&str; 3] = ["/components/schemas", "/definitions", "/$defs"];

/// JSON Pointer of the first schema section present in `document`.
pub fn schema_section(document: &Value) -> Option<&'static str> {
    SCHEMA_SECTIONS
        .iter()
        .copied()
        .find(|pointer| document.pointer(pointer).is_some_and(Value::is_object))
}

/// Apply `filter` to each type schema of `document`, keyed by type name.
///
/// Schemas the filter doesn't apply to are skipped without being parsed, and
/// schemas it leaves unchanged are written back untouched. A changed schema
/// is re-serialized with its typed keywords (`type`, `properties`, bounds)
/// first and the remaining keys (`$ref`, `description`, `x-*`, ...) after
/// them, so its key order can differ from the input. Returns the number of
/// schemas that changed.
///
/// # Errors
///
/// Returns `GenerateError::InvalidDocument` if the document has no schema
/// section, `GenerateError::InvalidSchema` if a schema can't be read as a
/// schema object, and `GenerateError::Rule` if a rule fails.
pub fn apply_to_document(
    document: &mut Value,
    filter: &dyn SchemaFilter,
    registry: &ValidatorRegistry,
) -> Result<usize, GenerateError> {
    let pointer = schema_section(document).ok_or_else(|| GenerateError::InvalidDocument {
        message: format!(
            "no schema section found (expected one of {})",
            SCHEMA_SECTIONS.join(", ")
        ),
    })?;
    let Some(Value::Object(schemas)) = document.pointer_mut(pointer) else {
        return Err(GenerateError::InvalidDocument {
            message: format!("{pointer} is not an object"),
        });
    };

    let mut changed = 0;
    for (type_name, value) in schemas.iter_mut() {
        // Boolean schemas carry no properties.
        if !value.is_object() {
            continue;
        }

        let context = SchemaFilterContext {
            type_name,
            registry,
        };
        if !filter.applies_to(&context) {
            continue;
        }

        let original: SchemaNode = serde_json::from_value(value.clone()).map_err(|source| {
            GenerateError::InvalidSchema {
                type_name: type_name.clone(),
                source,
            }
        })?;
        let mut node = original.clone();
        filter
            .apply(&mut node, &context)
            .map_err(|source| GenerateError::Rule {
                type_name: type_name.clone(),
                source,
            })?;

        if node != original {
            *value = serde_json::to_value(&node).map_err(|source| GenerateError::InvalidSchema {
                type_name: type_name.clone(),
                source,
            })?;
            changed += 1;
        }
    }

    debug!(section = pointer, changed, "applied validator rules to document");
    Ok(changed)
}
