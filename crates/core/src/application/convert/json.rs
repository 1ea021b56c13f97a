// JSON converters

use super::{Converter, ConverterChain, ConverterTable, EnvelopeConverter};
use crate::domain::types::{ARRAY_LIST, DATA_LIST, DATA_OBJECT, DATA_OBJECT_SET, STD_CLASS};
use crate::domain::value::{ARRAY_TAG, SCALAR_TAG};
use crate::domain::{Scalar, Value};
use crate::error::{DispatchError, Result};
use std::sync::Arc;

pub(super) fn table() -> ConverterTable {
    let collection: Arc<dyn Converter> = Arc::new(CollectionJsonConverter);
    ConverterTable::new(Arc::new(FinalJsonConverter))
        .register(DATA_OBJECT, Arc::new(EntityJsonConverter))
        .register(DATA_OBJECT_SET, collection.clone())
        .register(DATA_LIST, collection.clone())
        .register(ARRAY_LIST, collection)
        .register(ARRAY_TAG, Arc::new(ArrayJsonConverter))
        .register(SCALAR_TAG, Arc::new(ScalarJsonConverter))
        .register(STD_CLASS, Arc::new(RecordJsonConverter))
}

fn unsupported(converter: &str, value: &Value) -> DispatchError {
    DispatchError::internal(format!("{} cannot convert {}", converter, value.type_tag()))
}

fn scalar_json(scalar: &Scalar) -> Result<String> {
    Ok(serde_json::to_string(&scalar.to_json())?)
}

/// Joins `(key, converted)` pairs into a JSON object
fn object<'v>(
    fields: impl Iterator<Item = (&'v String, &'v Value)>,
    chain: &ConverterChain<'_>,
) -> Result<String> {
    let mut members = Vec::new();
    for (key, value) in fields {
        members.push(format!("{}:{}", serde_json::to_string(key)?, chain.convert(value)?));
    }
    Ok(format!("{{{}}}", members.join(",")))
}

fn array<'v>(items: impl Iterator<Item = &'v Value>, chain: &ConverterChain<'_>) -> Result<String> {
    let converted = items
        .map(|item| chain.convert(item))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("[{}]", converted.join(",")))
}

/// Entity -> object of its (filtered) field map
pub struct EntityJsonConverter;

impl Converter for EntityJsonConverter {
    fn convert(&self, value: &Value, _chain: &ConverterChain<'_>) -> Result<String> {
        let entity = value
            .as_entity()
            .ok_or_else(|| unsupported("EntityJsonConverter", value))?;
        let map: serde_json::Map<String, serde_json::Value> = entity
            .to_filtered_map()
            .into_iter()
            .map(|(k, v)| (k, v.to_json()))
            .collect();
        Ok(serde_json::to_string(&map)?)
    }
}

/// Typed collection -> array, each element through the chain
pub struct CollectionJsonConverter;

impl Converter for CollectionJsonConverter {
    fn convert(&self, value: &Value, chain: &ConverterChain<'_>) -> Result<String> {
        match value {
            Value::Collection(collection) => array(collection.items().iter(), chain),
            other => Err(unsupported("CollectionJsonConverter", other)),
        }
    }
}

/// Plain list -> array; plain map -> object
pub struct ArrayJsonConverter;

impl Converter for ArrayJsonConverter {
    fn convert(&self, value: &Value, chain: &ConverterChain<'_>) -> Result<String> {
        match value {
            Value::List(items) => array(items.iter(), chain),
            Value::Map(map) => object(map.iter(), chain),
            other => Err(unsupported("ArrayJsonConverter", other)),
        }
    }
}

pub struct ScalarJsonConverter;

impl Converter for ScalarJsonConverter {
    fn convert(&self, value: &Value, _chain: &ConverterChain<'_>) -> Result<String> {
        match value {
            Value::Scalar(scalar) => scalar_json(scalar),
            other => Err(unsupported("ScalarJsonConverter", other)),
        }
    }
}

/// `stdClass` and its subtypes -> object
pub struct RecordJsonConverter;

impl Converter for RecordJsonConverter {
    fn convert(&self, value: &Value, chain: &ConverterChain<'_>) -> Result<String> {
        match value {
            Value::Record(record) => object(record.fields().iter(), chain),
            other => Err(unsupported("RecordJsonConverter", other)),
        }
    }
}

pub struct FinalJsonConverter;

impl EnvelopeConverter for FinalJsonConverter {
    fn wrap(&self, body: String) -> String {
        format!("{{\"response\": {}}}", body)
    }
}
