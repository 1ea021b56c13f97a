// Response Converter Chain
//
// Type-directed serialisation: direct tag lookup, then ancestor tags, then the
// value's plain text. The envelope converter runs once, last.

pub mod json;
pub mod xml;

use crate::domain::value::SCALAR_TAG;
use crate::domain::{TypeHierarchy, Value};
use crate::error::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Reserved tag of the envelope converter
pub const FINAL_CONVERTER_TAG: &str = "FinalConverter";

/// Output format of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Xml,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Xml => "application/xml",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Serialises one value category; may recurse through `chain` for nested values
pub trait Converter: Send + Sync {
    fn convert(&self, value: &Value, chain: &ConverterChain<'_>) -> Result<String>;
}

/// Wraps the fully converted body in the response envelope
pub trait EnvelopeConverter: Send + Sync {
    fn wrap(&self, body: String) -> String;
}

/// Tag -> converter for one format, plus its mandatory envelope
#[derive(Clone)]
pub struct ConverterTable {
    converters: HashMap<String, Arc<dyn Converter>>,
    envelope: Arc<dyn EnvelopeConverter>,
}

impl ConverterTable {
    pub fn new(envelope: Arc<dyn EnvelopeConverter>) -> Self {
        Self {
            converters: HashMap::new(),
            envelope,
        }
    }

    /// Built-in JSON converters
    pub fn json() -> Self {
        json::table()
    }

    /// Built-in XML converters
    pub fn xml(declaration: bool) -> Self {
        xml::table(declaration)
    }

    /// Register (or replace) the converter for `tag`
    pub fn register(mut self, tag: impl Into<String>, converter: Arc<dyn Converter>) -> Self {
        self.converters.insert(tag.into(), converter);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&Arc<dyn Converter>> {
        self.converters.get(tag)
    }

    pub fn has(&self, tag: &str) -> bool {
        tag == FINAL_CONVERTER_TAG || self.converters.contains_key(tag)
    }

    pub fn envelope(&self) -> &dyn EnvelopeConverter {
        self.envelope.as_ref()
    }
}

/// One converter table per output format, built at startup
#[derive(Clone)]
pub struct ConverterRegistry {
    json: ConverterTable,
    xml: ConverterTable,
}

impl ConverterRegistry {
    pub fn new(json: ConverterTable, xml: ConverterTable) -> Self {
        Self { json, xml }
    }

    pub fn defaults(xml_declaration: bool) -> Self {
        Self::new(ConverterTable::json(), ConverterTable::xml(xml_declaration))
    }

    pub fn with_converter(
        mut self,
        format: OutputFormat,
        tag: impl Into<String>,
        converter: Arc<dyn Converter>,
    ) -> Self {
        match format {
            OutputFormat::Json => self.json = self.json.register(tag, converter),
            OutputFormat::Xml => self.xml = self.xml.register(tag, converter),
        }
        self
    }

    pub fn table(&self, format: OutputFormat) -> &ConverterTable {
        match format {
            OutputFormat::Json => &self.json,
            OutputFormat::Xml => &self.xml,
        }
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::defaults(true)
    }
}

/// A converter table bound to the type hierarchy for one render
pub struct ConverterChain<'a> {
    table: &'a ConverterTable,
    types: &'a TypeHierarchy,
}

impl<'a> ConverterChain<'a> {
    pub fn new(table: &'a ConverterTable, types: &'a TypeHierarchy) -> Self {
        Self { table, types }
    }

    /// Convert without the envelope
    pub fn convert(&self, value: &Value) -> Result<String> {
        let tag = value.type_tag();
        if let Some(converter) = self.table.get(tag) {
            return converter.convert(value, self);
        }

        if value.is_object() {
            for ancestor in self.types.ancestors(tag) {
                if let Some(converter) = self.table.get(ancestor) {
                    return converter.convert(value, self);
                }
            }
        }

        self.plain(value)
    }

    /// Convert, then wrap exactly once
    pub fn render(&self, value: &Value) -> Result<String> {
        let body = self.convert(value)?;
        Ok(self.table.envelope().wrap(body))
    }

    /// Unclaimed values: their text, encoded like any other scalar of the format.
    ///
    /// An object no converter claims, directly or through an ancestor, renders
    /// as its display text (the type name). Its fields are dropped.
    fn plain(&self, value: &Value) -> Result<String> {
        match self.table.get(SCALAR_TAG) {
            Some(scalar) if value.is_object() => {
                scalar.convert(&Value::from(value.to_string()), self)
            }
            _ => Ok(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Collection, Entity, Record};

    fn types() -> TypeHierarchy {
        TypeHierarchy::builder()
            .entity("Widget")
            .declare("Gadget", "Widget")
            .declare("Sprocket", "Gadget")
            .declare("SortedList", "DataList")
            .root("Orphan")
            .build()
            .unwrap()
    }

    struct Shout;

    impl Converter for Shout {
        fn convert(&self, value: &Value, _chain: &ConverterChain<'_>) -> Result<String> {
            Ok(format!("\"{}!\"", value.type_tag().to_uppercase()))
        }
    }

    #[test]
    fn test_subtype_serialises_like_parent() {
        let table = ConverterTable::json();
        let types = types();
        let chain = ConverterChain::new(&table, &types);

        let as_widget = chain
            .convert(&Entity::new("Widget", 3).with_field("Title", "x").into())
            .unwrap();
        let as_sprocket = chain
            .convert(&Entity::new("Sprocket", 3).with_field("Title", "x").into())
            .unwrap();
        assert_eq!(
            as_widget.replace("\"Widget\"", "\"?\""),
            as_sprocket.replace("\"Sprocket\"", "\"?\"")
        );
    }

    #[test]
    fn test_nearest_ancestor_wins() {
        let table = ConverterTable::json().register("Gadget", Arc::new(Shout));
        let types = types();
        let chain = ConverterChain::new(&table, &types);

        assert_eq!(
            chain.convert(&Entity::new("Sprocket", 1).into()).unwrap(),
            "\"SPROCKET!\""
        );
        assert!(chain
            .convert(&Entity::new("Widget", 1).into())
            .unwrap()
            .starts_with('{'));
    }

    #[test]
    fn test_collection_subtype_uses_collection_converter() {
        let table = ConverterTable::json();
        let types = types();
        let chain = ConverterChain::new(&table, &types);

        let sorted = Collection::new("SortedList", vec![Value::from(Entity::new("Widget", 1))]);
        let out = chain.convert(&sorted.into()).unwrap();
        assert!(out.starts_with("[{"));
    }

    #[test]
    fn test_unclaimed_object_falls_back_to_text() {
        let table = ConverterTable::json();
        let types = types();
        let chain = ConverterChain::new(&table, &types);

        let orphan = Record::new("Orphan").with("secret", 1i64);
        let text = chain.convert(&orphan.into()).unwrap();
        assert_eq!(text, "\"Orphan\"");
        assert!(!text.contains("secret"));
    }

    #[test]
    fn test_unclaimed_without_scalar_converter_is_raw_text() {
        let table = ConverterTable::new(Arc::new(json::FinalJsonConverter));
        let types = types();
        let chain = ConverterChain::new(&table, &types);

        assert_eq!(chain.convert(&Value::from("hi")).unwrap(), "hi");
        assert_eq!(chain.convert(&Entity::new("Widget", 1).into()).unwrap(), "Widget");
    }

    #[test]
    fn test_render_wraps_exactly_once() {
        let table = ConverterTable::json();
        let types = types();
        let chain = ConverterChain::new(&table, &types);

        let body = chain.render(&Value::List(vec![Value::from("a")])).unwrap();
        assert_eq!(body, r#"{"response": ["a"]}"#);
        assert_eq!(body.matches("response").count(), 1);
    }

    #[test]
    fn test_final_converter_always_present() {
        let registry = ConverterRegistry::default();
        for format in [OutputFormat::Json, OutputFormat::Xml] {
            assert!(registry.table(format).has(FINAL_CONVERTER_TAG));
            assert!(registry.table(format).has("ScalarItem"));
            assert!(registry.table(format).has("DataObjectSet"));
        }
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("XML".parse::<OutputFormat>().unwrap(), OutputFormat::Xml);
        assert_eq!(OutputFormat::Json.content_type(), "application/json");
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
