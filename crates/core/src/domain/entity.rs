// Entity Domain Model
//
// A persisted domain object as handed back by an EntityRepository.

use super::value::Scalar;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Entity identifier (unique across all entity types)
pub type EntityId = i64;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    type_name: String,
    id: EntityId,
    fields: IndexMap<String, Scalar>,
    created: Option<DateTime<Utc>>,
    last_edited: Option<DateTime<Utc>>,

    /// Restricts what converters emit; `None` exposes the full map
    exposed_fields: Option<Vec<String>>,
}

impl Entity {
    pub fn new(type_name: impl Into<String>, id: EntityId) -> Self {
        Self {
            type_name: type_name.into(),
            id,
            fields: IndexMap::new(),
            created: None,
            last_edited: None,
            exposed_fields: None,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_timestamps(mut self, created: DateTime<Utc>, last_edited: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self.last_edited = Some(last_edited);
        self
    }

    pub fn with_exposed_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exposed_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn get(&self, field: &str) -> Option<&Scalar> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Scalar>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn fields(&self) -> &IndexMap<String, Scalar> {
        &self.fields
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn last_edited(&self) -> Option<DateTime<Utc>> {
        self.last_edited
    }

    pub fn exposed_fields(&self) -> Option<&[String]> {
        self.exposed_fields.as_deref()
    }

    /// Full field map: system fields first, then the entity's own fields
    pub fn to_map(&self) -> IndexMap<String, Scalar> {
        let mut map = IndexMap::with_capacity(self.fields.len() + 4);
        map.insert("ID".to_string(), Scalar::Int(self.id));
        map.insert("ClassName".to_string(), Scalar::Text(self.type_name.clone()));
        if let Some(created) = self.created {
            map.insert(
                "Created".to_string(),
                Scalar::Text(created.format(TIMESTAMP_FORMAT).to_string()),
            );
        }
        if let Some(last_edited) = self.last_edited {
            map.insert(
                "LastEdited".to_string(),
                Scalar::Text(last_edited.format(TIMESTAMP_FORMAT).to_string()),
            );
        }
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.clone());
        }
        map
    }

    /// Field map honouring the exposed-field filter, when one is declared
    pub fn to_filtered_map(&self) -> IndexMap<String, Scalar> {
        let map = self.to_map();
        match &self.exposed_fields {
            Some(exposed) => map
                .into_iter()
                .filter(|(name, _)| exposed.iter().any(|e| e == name))
                .collect(),
            None => map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_map_orders_system_fields_first() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let entity = Entity::new("Widget", 7)
            .with_field("Title", "Sprocket")
            .with_timestamps(ts, ts);

        let keys: Vec<_> = entity.to_map().keys().cloned().collect();
        assert_eq!(keys, ["ID", "ClassName", "Created", "LastEdited", "Title"]);
        assert_eq!(
            entity.to_map()["Created"],
            Scalar::Text("2024-03-01 12:30:00".to_string())
        );
    }

    #[test]
    fn test_filtered_map() {
        let entity = Entity::new("Widget", 7)
            .with_field("Title", "Sprocket")
            .with_field("Secret", "hunter2")
            .with_exposed_fields(["ID", "Title"]);

        let map = entity.to_filtered_map();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("Title"));
        assert!(!map.contains_key("Secret"));
    }

    #[test]
    fn test_filtered_map_without_filter_is_full_map() {
        let entity = Entity::new("Widget", 1).with_field("Title", "a");
        assert_eq!(entity.to_filtered_map(), entity.to_map());
    }
}
