//! Typed view of an OpenAPI 3.0 schema node.
//!
//! Only the fields constraint rules read or write are typed. Everything else
//! (`$ref`, `description`, `enum`, vendor extensions, ...) is carried through
//! `extra` untouched, so a node survives a deserialize/serialize round trip.
//!
//! Both OpenAPI 3.0 and JSON Schema 2020-12 spellings are accepted: `type`
//! may be a list, `exclusiveMinimum`/`exclusiveMaximum` may be a flag or a
//! number, and sub-schemas may be `true`/`false`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::types::{TYPE_ARRAY, TYPE_NULL, TYPE_STRING};

/// The mutable constraint surface of one property, array item or object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,

    /// Required property names. Only meaningful on object nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_bound"
    )]
    pub minimum: Option<f64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_bound"
    )]
    pub maximum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<ExclusiveBound>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<ExclusiveBound>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `type` as a single name or a 2020-12 list such as `["string", "null"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Union(Vec<String>),
}

impl SchemaType {
    pub fn includes(&self, name: &str) -> bool {
        match self {
            SchemaType::Single(single) => single == name,
            SchemaType::Union(names) => names.iter().any(|n| n == name),
        }
    }

    /// Drop `"null"` from a union. A single remaining name collapses the list.
    fn without_null(self) -> Self {
        match self {
            SchemaType::Union(names) => {
                let mut names: Vec<String> =
                    names.into_iter().filter(|n| n != TYPE_NULL).collect();
                if names.len() == 1 {
                    SchemaType::Single(names.remove(0))
                } else {
                    SchemaType::Union(names)
                }
            }
            single => single,
        }
    }
}

/// `exclusiveMinimum`/`exclusiveMaximum`: an OpenAPI 3.0 flag on the sibling
/// bound, or a 2020-12 bound value of its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExclusiveBound {
    Flag(bool),
    Value(#[serde(serialize_with = "serialize_number")] f64),
}

/// A sub-schema: a schema object or a boolean schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schema {
    Bool(bool),
    Node(SchemaNode),
}

impl Schema {
    pub fn as_node(&self) -> Option<&SchemaNode> {
        match self {
            Schema::Node(node) => Some(node),
            Schema::Bool(_) => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut SchemaNode> {
        match self {
            Schema::Node(node) => Some(node),
            Schema::Bool(_) => None,
        }
    }

    /// Node rules can write to. `true` becomes the equivalent empty node;
    /// `false` admits nothing and yields `None`.
    pub fn materialize(&mut self) -> Option<&mut SchemaNode> {
        if let Schema::Bool(true) = self {
            *self = Schema::Node(SchemaNode::default());
        }
        self.as_node_mut()
    }
}

impl From<SchemaNode> for Schema {
    fn from(node: SchemaNode) -> Self {
        Schema::Node(node)
    }
}

impl SchemaNode {
    /// Create a node with the given type tag.
    pub fn of_type(schema_type: impl Into<String>) -> Self {
        Self {
            schema_type: Some(SchemaType::Single(schema_type.into())),
            ..Self::default()
        }
    }

    /// Create an object node with the given properties.
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaNode)>,
        K: Into<String>,
    {
        Self {
            schema_type: Some(SchemaType::Single("object".to_string())),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), Schema::Node(v)))
                .collect(),
            ..Self::default()
        }
    }

    /// Create an array node with the given item schema.
    pub fn array_of(items: SchemaNode) -> Self {
        Self {
            schema_type: Some(SchemaType::Single(TYPE_ARRAY.to_string())),
            items: Some(Box::new(Schema::Node(items))),
            ..Self::default()
        }
    }

    /// Mark the node nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn is_string(&self) -> bool {
        self.has_type(TYPE_STRING)
    }

    pub fn is_array(&self) -> bool {
        self.has_type(TYPE_ARRAY)
    }

    fn has_type(&self, name: &str) -> bool {
        self.schema_type.as_ref().is_some_and(|t| t.includes(name))
    }

    /// Clear `nullable`, and `"null"` from a `type` list.
    pub fn clear_nullable(&mut self) {
        self.nullable = false;
        self.schema_type = self.schema_type.take().map(SchemaType::without_null);
    }

    /// Property sub-schema as a node, if it is one.
    pub fn property(&self, key: &str) -> Option<&SchemaNode> {
        self.properties.get(key).and_then(Schema::as_node)
    }

    /// Effective lower bound as `(value, exclusive)`, the tighter of
    /// `minimum` and a numeric `exclusiveMinimum`.
    pub fn lower_bound(&self) -> Option<(f64, bool)> {
        let inclusive = self.minimum.map(|minimum| {
            (
                minimum,
                self.exclusive_minimum == Some(ExclusiveBound::Flag(true)),
            )
        });
        let exclusive = match self.exclusive_minimum {
            Some(ExclusiveBound::Value(value)) => Some((value, true)),
            _ => None,
        };
        match (inclusive, exclusive) {
            (Some(a), Some(b)) => Some(if b.0 >= a.0 { b } else { a }),
            (a, b) => a.or(b),
        }
    }

    /// Effective upper bound as `(value, exclusive)`, the tighter of
    /// `maximum` and a numeric `exclusiveMaximum`.
    pub fn upper_bound(&self) -> Option<(f64, bool)> {
        let inclusive = self.maximum.map(|maximum| {
            (
                maximum,
                self.exclusive_maximum == Some(ExclusiveBound::Flag(true)),
            )
        });
        let exclusive = match self.exclusive_maximum {
            Some(ExclusiveBound::Value(value)) => Some((value, true)),
            _ => None,
        };
        match (inclusive, exclusive) {
            (Some(a), Some(b)) => Some(if b.0 <= a.0 { b } else { a }),
            (a, b) => a.or(b),
        }
    }

    /// True if this node carries no constraint a rule could have written.
    pub fn is_unconstrained(&self) -> bool {
        self.required.is_empty()
            && self.all_of.is_empty()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.min_items.is_none()
            && self.max_items.is_none()
            && self.minimum.is_none()
            && self.maximum.is_none()
            && self.exclusive_minimum.is_none()
            && self.exclusive_maximum.is_none()
            && self.pattern.is_none()
    }

    /// Patterns held in `allOf` sub-schemas.
    pub fn all_of_patterns(&self) -> impl Iterator<Item = &str> {
        self.all_of
            .iter()
            .filter_map(|s| s.as_node()?.pattern.as_deref())
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Write integral bounds as JSON integers (`5`, not `5.0`).
fn serialize_bound<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serialize_number(v, serializer),
        None => serializer.serialize_none(),
    }
}

fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
