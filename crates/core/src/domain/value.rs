// Return Value Model
//
// Sealed set of categories the converter chain knows how to tag:
// scalars, plain arrays, entities, typed collections and records.

use super::entity::Entity;
use indexmap::IndexMap;
use std::fmt;

/// Pseudo-tag for untyped lists and maps
pub const ARRAY_TAG: &str = "Array";

/// Pseudo-tag for anything that is neither an object nor an array
pub const SCALAR_TAG: &str = "ScalarItem";

/// Primitive value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Null => serde_json::Value::Null,
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
            Scalar::Int(i) => serde_json::Value::from(*i),
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Scalar::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Lossy conversion from a stored JSON column; nested structures are kept as their JSON text
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Scalar::Null,
            serde_json::Value::Bool(b) => Scalar::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => Scalar::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Scalar::Text(s.clone()),
            other => Scalar::Text(other.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// Named list type (e.g. `DataList`, `ArrayList`)
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    type_name: String,
    items: Vec<Value>,
}

impl Collection {
    pub fn new(type_name: impl Into<String>, items: Vec<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            items,
        }
    }

    /// Query-result list of entities
    pub fn data_list(entities: Vec<Entity>) -> Self {
        Self::new(
            super::types::DATA_LIST,
            entities.into_iter().map(Value::Entity).collect(),
        )
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Structured object that is not an entity (`stdClass` and friends)
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn std_class() -> Self {
        Self::new(super::types::STD_CLASS)
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }
}

/// Anything a service method can return
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Entity(Entity),
    Collection(Collection),
    Record(Record),
}

impl Value {
    pub fn null() -> Self {
        Value::Scalar(Scalar::Null)
    }

    /// Converter lookup key: concrete type name for objects, `Array` or `ScalarItem` otherwise
    pub fn type_tag(&self) -> &str {
        match self {
            Value::Entity(e) => e.type_name(),
            Value::Collection(c) => c.type_name(),
            Value::Record(r) => r.type_name(),
            Value::List(_) | Value::Map(_) => ARRAY_TAG,
            Value::Scalar(_) => SCALAR_TAG,
        }
    }

    /// Whether the tag names a real type (and may have ancestors)
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            Value::Entity(_) | Value::Collection(_) | Value::Record(_)
        )
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(e) => Some(e),
            _ => None,
        }
    }
}

/// Plain textual rendition, used when no converter claims a value
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => s.fmt(f),
            other => f.write_str(other.type_tag()),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s.into())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(i.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(b.into())
    }
}

impl From<Entity> for Value {
    fn from(e: Entity) -> Self {
        Value::Entity(e)
    }
}

impl From<Collection> for Value {
    fn from(c: Collection) -> Self {
        Value::Collection(c)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or_else(Value::null)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
            scalar => Value::Scalar(Scalar::from_json(scalar)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_tags() {
        assert_eq!(Value::from("x").type_tag(), SCALAR_TAG);
        assert_eq!(Value::null().type_tag(), SCALAR_TAG);
        assert_eq!(Value::List(vec![]).type_tag(), ARRAY_TAG);
        assert_eq!(Value::Map(IndexMap::new()).type_tag(), ARRAY_TAG);
        assert_eq!(Value::from(Entity::new("Gadget", 5)).type_tag(), "Gadget");
        assert_eq!(Value::from(Collection::data_list(vec![])).type_tag(), "DataList");
        assert_eq!(Value::from(Record::std_class()).type_tag(), "stdClass");
    }

    #[test]
    fn test_objects_render_as_type_name() {
        assert_eq!(Value::from(Entity::new("Gadget", 1)).to_string(), "Gadget");
        assert_eq!(Value::List(vec![]).to_string(), "Array");
        assert_eq!(Value::from(42i64).to_string(), "42");
        assert_eq!(Value::null().to_string(), "");
    }

    #[test]
    fn test_from_json_keeps_structure() {
        let value = Value::from(&json!({"a": [1, "two"], "b": null}));
        let Value::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(
            map["a"],
            Value::List(vec![Value::from(1i64), Value::from("two")])
        );
        assert_eq!(map["b"], Value::null());
    }

    #[test]
    fn test_scalar_from_json_nested_kept_as_text() {
        assert_eq!(
            Scalar::from_json(&json!({"x": 1})),
            Scalar::Text("{\"x\":1}".to_string())
        );
        assert_eq!(Scalar::from_json(&json!(1.5)), Scalar::Float(1.5));
    }
}
