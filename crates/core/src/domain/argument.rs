// Argument Model
//
// ArgValue: raw request data keyed by name (query, form, JSON body, path pairs).
// Argument: a value bound to a declared parameter position.

use super::entity::Entity;
use super::method::ScalarKind;
use crate::error::{DispatchError, Result};
use bytes::Bytes;
use std::collections::HashMap;

/// Raw value as it arrived with the request
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Text(String),
    Blob(Bytes),
    /// Non-string member of a decoded JSON body
    Structured(serde_json::Value),
}

impl ArgValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => ArgValue::Text(s),
            other => ArgValue::Structured(other),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Text(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Text(s)
    }
}

/// Merged request arguments, keyed by parameter name
pub type ArgumentMap = HashMap<String, ArgValue>;

/// A value bound to one parameter position
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Bytes),
    Structured(serde_json::Value),
    Entity(Entity),
}

impl Argument {
    /// Coerce to a declared scalar kind. Null passes through untouched.
    pub fn coerce(self, kind: ScalarKind) -> std::result::Result<Argument, Argument> {
        match (kind, self) {
            (_, Argument::Null) => Ok(Argument::Null),
            (ScalarKind::Text, Argument::Text(s)) => Ok(Argument::Text(s)),
            (ScalarKind::Text, Argument::Int(i)) => Ok(Argument::Text(i.to_string())),
            (ScalarKind::Text, Argument::Float(x)) => Ok(Argument::Text(x.to_string())),
            (ScalarKind::Text, Argument::Bool(b)) => {
                Ok(Argument::Text(if b { "1" } else { "" }.to_string()))
            }
            (ScalarKind::Text, Argument::Blob(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(s) => Ok(Argument::Text(s.to_string())),
                Err(_) => Err(Argument::Blob(bytes)),
            },
            (ScalarKind::Text, Argument::Structured(v)) => match v {
                serde_json::Value::Number(n) => Ok(Argument::Text(n.to_string())),
                serde_json::Value::Bool(b) => {
                    Ok(Argument::Text(if b { "1" } else { "" }.to_string()))
                }
                other => Err(Argument::Structured(other)),
            },

            (ScalarKind::Int, Argument::Int(i)) => Ok(Argument::Int(i)),
            (ScalarKind::Int, Argument::Bool(b)) => Ok(Argument::Int(b as i64)),
            (ScalarKind::Int, Argument::Float(x)) if x.fract() == 0.0 => {
                Ok(Argument::Int(x as i64))
            }
            (ScalarKind::Int, Argument::Text(s)) => {
                s.trim().parse().map(Argument::Int).map_err(|_| Argument::Text(s))
            }
            (ScalarKind::Int, Argument::Structured(v)) => {
                v.as_i64().map(Argument::Int).ok_or(Argument::Structured(v))
            }

            (ScalarKind::Float, Argument::Float(x)) => Ok(Argument::Float(x)),
            (ScalarKind::Float, Argument::Int(i)) => Ok(Argument::Float(i as f64)),
            (ScalarKind::Float, Argument::Text(s)) => {
                s.trim().parse().map(Argument::Float).map_err(|_| Argument::Text(s))
            }
            (ScalarKind::Float, Argument::Structured(v)) => {
                v.as_f64().map(Argument::Float).ok_or(Argument::Structured(v))
            }

            (ScalarKind::Bool, Argument::Bool(b)) => Ok(Argument::Bool(b)),
            (ScalarKind::Bool, Argument::Int(i)) => Ok(Argument::Bool(i != 0)),
            (ScalarKind::Bool, Argument::Text(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" | "on" | "yes" => Ok(Argument::Bool(true)),
                    "0" | "false" | "off" | "no" | "" => Ok(Argument::Bool(false)),
                    _ => Err(Argument::Text(s)),
                }
            }
            (ScalarKind::Bool, Argument::Structured(v)) => {
                v.as_bool().map(Argument::Bool).ok_or(Argument::Structured(v))
            }

            (_, other) => Err(other),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Argument::Null => "null",
            Argument::Bool(_) => "bool",
            Argument::Int(_) => "int",
            Argument::Float(_) => "float",
            Argument::Text(_) => "string",
            Argument::Blob(_) => "binary",
            Argument::Structured(_) => "structure",
            Argument::Entity(_) => "entity",
        }
    }
}

impl From<ArgValue> for Argument {
    fn from(raw: ArgValue) -> Self {
        match raw {
            ArgValue::Text(s) => Argument::Text(s),
            ArgValue::Blob(b) => Argument::Blob(b),
            ArgValue::Structured(v) => Argument::Structured(v),
        }
    }
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        Argument::Text(s.to_string())
    }
}

impl From<String> for Argument {
    fn from(s: String) -> Self {
        Argument::Text(s)
    }
}

impl From<i64> for Argument {
    fn from(i: i64) -> Self {
        Argument::Int(i)
    }
}

impl From<f64> for Argument {
    fn from(x: f64) -> Self {
        Argument::Float(x)
    }
}

impl From<bool> for Argument {
    fn from(b: bool) -> Self {
        Argument::Bool(b)
    }
}

impl From<Entity> for Argument {
    fn from(e: Entity) -> Self {
        Argument::Entity(e)
    }
}

/// Positional arguments handed to a service method
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    args: Vec<Argument>,
}

impl BoundArgs {
    pub fn new(args: Vec<Argument>) -> Self {
        Self { args }
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.args.get(index)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn into_inner(self) -> Vec<Argument> {
        self.args
    }

    fn expect_at(&self, index: usize) -> Result<&Argument> {
        self.args
            .get(index)
            .ok_or_else(|| DispatchError::internal(format!("missing argument at position {}", index)))
    }

    fn mismatch(index: usize, wanted: &str, got: &Argument) -> DispatchError {
        DispatchError::internal(format!(
            "argument {} should be {}, got {}",
            index,
            wanted,
            got.kind_name()
        ))
    }

    pub fn text(&self, index: usize) -> Result<&str> {
        match self.expect_at(index)? {
            Argument::Text(s) => Ok(s),
            other => Err(Self::mismatch(index, "string", other)),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64> {
        match self.expect_at(index)? {
            Argument::Int(i) => Ok(*i),
            other => Err(Self::mismatch(index, "int", other)),
        }
    }

    pub fn float(&self, index: usize) -> Result<f64> {
        match self.expect_at(index)? {
            Argument::Float(x) => Ok(*x),
            other => Err(Self::mismatch(index, "float", other)),
        }
    }

    pub fn bool(&self, index: usize) -> Result<bool> {
        match self.expect_at(index)? {
            Argument::Bool(b) => Ok(*b),
            other => Err(Self::mismatch(index, "bool", other)),
        }
    }

    pub fn blob(&self, index: usize) -> Result<&Bytes> {
        match self.expect_at(index)? {
            Argument::Blob(b) => Ok(b),
            other => Err(Self::mismatch(index, "binary", other)),
        }
    }

    /// Entity at `index`, or `None` when the parameter fell back to a null default
    pub fn entity(&self, index: usize) -> Result<Option<&Entity>> {
        match self.expect_at(index)? {
            Argument::Entity(e) => Ok(Some(e)),
            Argument::Null => Ok(None),
            other => Err(Self::mismatch(index, "entity", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_text_to_int() {
        assert_eq!(
            Argument::from(" 42 ").coerce(ScalarKind::Int),
            Ok(Argument::Int(42))
        );
        assert_eq!(
            Argument::from("abc").coerce(ScalarKind::Int),
            Err(Argument::from("abc"))
        );
    }

    #[test]
    fn test_coerce_structured_numbers() {
        assert_eq!(
            Argument::Structured(json!(7)).coerce(ScalarKind::Int),
            Ok(Argument::Int(7))
        );
        assert_eq!(
            Argument::Structured(json!(7)).coerce(ScalarKind::Text),
            Ok(Argument::from("7"))
        );
        assert!(Argument::Structured(json!([1]))
            .coerce(ScalarKind::Text)
            .is_err());
    }

    #[test]
    fn test_coerce_bool_spellings() {
        assert_eq!(Argument::from("on").coerce(ScalarKind::Bool), Ok(Argument::Bool(true)));
        assert_eq!(Argument::from("0").coerce(ScalarKind::Bool), Ok(Argument::Bool(false)));
        assert!(Argument::from("maybe").coerce(ScalarKind::Bool).is_err());
    }

    #[test]
    fn test_null_passes_through() {
        assert_eq!(Argument::Null.coerce(ScalarKind::Int), Ok(Argument::Null));
    }

    #[test]
    fn test_entity_never_coerces_to_scalar() {
        let e = Argument::Entity(Entity::new("Widget", 1));
        assert!(e.coerce(ScalarKind::Text).is_err());
    }

    #[test]
    fn test_bound_args_accessors() {
        let args = BoundArgs::new(vec![
            Argument::from("bob"),
            Argument::Int(3),
            Argument::Null,
        ]);
        assert_eq!(args.text(0).unwrap(), "bob");
        assert_eq!(args.int(1).unwrap(), 3);
        assert_eq!(args.entity(2).unwrap(), None);
        assert!(args.int(0).unwrap_err().to_string().contains("should be int"));
        assert!(args.text(9).is_err());
    }
}
