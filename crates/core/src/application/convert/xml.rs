// XML converters

use super::{Converter, ConverterChain, ConverterTable, EnvelopeConverter};
use crate::domain::types::{ARRAY_LIST, DATA_LIST, DATA_OBJECT, DATA_OBJECT_SET, STD_CLASS};
use crate::domain::value::{ARRAY_TAG, SCALAR_TAG};
use crate::domain::{Scalar, Value};
use crate::error::{DispatchError, Result};
use quick_xml::escape::escape;
use std::sync::Arc;

pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

const ITEM: &str = "item";

pub(super) fn table(declaration: bool) -> ConverterTable {
    let collection: Arc<dyn Converter> = Arc::new(CollectionXmlConverter);
    ConverterTable::new(Arc::new(FinalXmlConverter { declaration }))
        .register(DATA_OBJECT, Arc::new(EntityXmlConverter))
        .register(DATA_OBJECT_SET, collection.clone())
        .register(DATA_LIST, collection.clone())
        .register(ARRAY_LIST, collection)
        .register(ARRAY_TAG, Arc::new(ArrayXmlConverter))
        .register(SCALAR_TAG, Arc::new(ScalarXmlConverter))
        .register(STD_CLASS, Arc::new(RecordXmlConverter))
}

fn unsupported(converter: &str, value: &Value) -> DispatchError {
    DispatchError::internal(format!("{} cannot convert {}", converter, value.type_tag()))
}

/// Map keys become element names; anything XML rejects is replaced with `_`
pub fn element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match name.chars().next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => name.insert(0, '_'),
    }
    name
}

fn element(name: &str, content: &str) -> String {
    format!("<{name}>{content}</{name}>")
}

/// Characters XML 1.0 cannot carry at all, escaped or not
fn is_xml_char(c: char) -> bool {
    !matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}

fn scalar_text(scalar: &Scalar) -> String {
    let text: String = scalar.to_string().chars().filter(|c| is_xml_char(*c)).collect();
    escape(text.as_str()).into_owned()
}

fn keyed<'v>(
    wrapper: &str,
    fields: impl Iterator<Item = (&'v String, &'v Value)>,
    chain: &ConverterChain<'_>,
) -> Result<String> {
    let mut out = String::new();
    for (key, value) in fields {
        out.push_str(&element(&element_name(key), &chain.convert(value)?));
    }
    Ok(element(wrapper, &out))
}

/// Entity -> `<item><Field>value</Field>...</item>`
pub struct EntityXmlConverter;

impl Converter for EntityXmlConverter {
    fn convert(&self, value: &Value, _chain: &ConverterChain<'_>) -> Result<String> {
        let entity = value
            .as_entity()
            .ok_or_else(|| unsupported("EntityXmlConverter", value))?;
        let fields: String = entity
            .to_filtered_map()
            .iter()
            .map(|(name, scalar)| element(&element_name(name), &scalar_text(scalar)))
            .collect();
        Ok(element(ITEM, &fields))
    }
}

/// Typed collection -> `<items>`; entities keep their own `<item>` element
pub struct CollectionXmlConverter;

impl Converter for CollectionXmlConverter {
    fn convert(&self, value: &Value, chain: &ConverterChain<'_>) -> Result<String> {
        let Value::Collection(collection) = value else {
            return Err(unsupported("CollectionXmlConverter", value));
        };
        let mut out = String::new();
        for item in collection.items() {
            let converted = chain.convert(item)?;
            if item.as_entity().is_some() {
                out.push_str(&converted);
            } else {
                out.push_str(&element(ITEM, &converted));
            }
        }
        Ok(element("items", &out))
    }
}

/// Plain list -> `<array><item>..</item></array>`; plain map -> keyed children
pub struct ArrayXmlConverter;

impl Converter for ArrayXmlConverter {
    fn convert(&self, value: &Value, chain: &ConverterChain<'_>) -> Result<String> {
        match value {
            Value::List(items) => {
                let mut out = String::new();
                for item in items {
                    out.push_str(&element(ITEM, &chain.convert(item)?));
                }
                Ok(element("array", &out))
            }
            Value::Map(map) => keyed("array", map.iter(), chain),
            other => Err(unsupported("ArrayXmlConverter", other)),
        }
    }
}

/// Escaped text, no wrapping element
pub struct ScalarXmlConverter;

impl Converter for ScalarXmlConverter {
    fn convert(&self, value: &Value, _chain: &ConverterChain<'_>) -> Result<String> {
        match value {
            Value::Scalar(scalar) => Ok(scalar_text(scalar)),
            other => Err(unsupported("ScalarXmlConverter", other)),
        }
    }
}

pub struct RecordXmlConverter;

impl Converter for RecordXmlConverter {
    fn convert(&self, value: &Value, chain: &ConverterChain<'_>) -> Result<String> {
        match value {
            Value::Record(record) => keyed("object", record.fields().iter(), chain),
            other => Err(unsupported("RecordXmlConverter", other)),
        }
    }
}

pub struct FinalXmlConverter {
    pub declaration: bool,
}

impl EnvelopeConverter for FinalXmlConverter {
    fn wrap(&self, body: String) -> String {
        let envelope = element("response", &body);
        if self.declaration {
            format!("{}{}", XML_DECLARATION, envelope)
        } else {
            envelope
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Collection, Entity, Record, TypeHierarchy};
    use quick_xml::events::Event;
    use quick_xml::Reader;

    fn types() -> TypeHierarchy {
        TypeHierarchy::builder()
            .entity("Widget")
            .declare("Gadget", "Widget")
            .build()
            .unwrap()
    }

    fn render(value: Value, declaration: bool) -> String {
        let table = table(declaration);
        let types = types();
        ConverterChain::new(&table, &types).render(&value).unwrap()
    }

    /// Root element name of a well-formed document
    fn root_of(doc: &str) -> String {
        let mut reader = Reader::from_str(doc);
        let mut root = None;
        let mut depth = 0usize;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) => {
                    if depth == 0 {
                        root = Some(String::from_utf8(e.name().as_ref().to_vec()).unwrap());
                    }
                    depth += 1;
                }
                Event::End(_) => depth -= 1,
                Event::Eof => break,
                _ => {}
            }
        }
        assert_eq!(depth, 0);
        root.unwrap()
    }

    #[test]
    fn test_scalar_envelope_without_declaration() {
        assert_eq!(render(Value::from("world"), false), "<response>world</response>");
    }

    #[test]
    fn test_declaration_prefix() {
        let doc = render(Value::from("world"), true);
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(doc.ends_with("<response>world</response>"));
        assert_eq!(root_of(&doc), "response");
    }

    #[test]
    fn test_scalar_text_escaped() {
        let doc = render(Value::from("<b> & co"), false);
        assert_eq!(doc, "<response>&lt;b&gt; &amp; co</response>");
        assert_eq!(root_of(&doc), "response");
    }

    #[test]
    fn test_forbidden_characters_dropped() {
        let doc = render(Value::from("a\u{1}b\u{b}\u{1f}c\tok\n"), false);
        assert_eq!(doc, "<response>abc\tok\n</response>");
        assert_eq!(root_of(&doc), "response");

        let entity = Entity::new("Widget", 1).with_field("Title", "x\u{0}y");
        assert!(render(entity.into(), false).contains("<Title>xy</Title>"));
    }

    #[test]
    fn test_entity_item() {
        let doc = render(Entity::new("Gadget", 5).with_field("Title", "A&B").into(), false);
        assert_eq!(
            doc,
            "<response><item><ID>5</ID><ClassName>Gadget</ClassName><Title>A&amp;B</Title></item></response>"
        );
    }

    #[test]
    fn test_collection_and_array_well_formed() {
        let list = Collection::data_list(vec![Entity::new("Widget", 1), Entity::new("Gadget", 2)]);
        let doc = render(
            Value::List(vec![list.into(), Value::from(3i64), Record::std_class().with("1st key", "v").into()]),
            true,
        );
        assert_eq!(root_of(&doc), "response");
        assert!(doc.contains("<items><item><ID>1</ID>"));
        assert!(doc.contains("<item>3</item>"));
        assert!(doc.contains("<object><_1st_key>v</_1st_key></object>"));
    }

    #[test]
    fn test_element_name_sanitised() {
        assert_eq!(element_name("Title"), "Title");
        assert_eq!(element_name("two words"), "two_words");
        assert_eq!(element_name("9lives"), "_9lives");
        assert_eq!(element_name(""), "_");
    }
}
