// SQLite EntityRepository Implementation

use crate::error::map_sqlx_error;
use crate::permission::{member_holds, ADMIN_PERMISSION};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use sqlx::SqlitePool;
use std::sync::Arc;
use switchboard_core::domain::{Caller, Entity, EntityId, MemberId, Scalar, TypeHierarchy};
use switchboard_core::error::{DispatchError, Result};
use switchboard_core::port::{EntityRepository, TimeProvider};
use tracing::{debug, info};

/// Entity to be stored; id and timestamps are assigned on insert
#[derive(Debug, Clone, Default)]
pub struct NewEntity {
    pub type_name: String,
    pub owner: Option<MemberId>,
    pub is_public: bool,
    pub fields: IndexMap<String, Scalar>,
    pub exposed_fields: Option<Vec<String>>,
}

impl NewEntity {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn owned_by(mut self, member_id: MemberId) -> Self {
        self.owner = Some(member_id);
        self
    }

    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn exposing<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exposed_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

pub struct SqliteEntityRepository {
    pool: SqlitePool,
    types: Arc<TypeHierarchy>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteEntityRepository {
    pub fn new(
        pool: SqlitePool,
        types: Arc<TypeHierarchy>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            pool,
            types,
            time_provider,
        }
    }

    pub async fn insert(&self, new: NewEntity) -> Result<Entity> {
        if !self.types.is_entity_type(&new.type_name) {
            return Err(DispatchError::internal(format!(
                "{} is not an entity type",
                new.type_name
            )));
        }

        let now = self.time_provider.now();
        let exposed = new
            .exposed_fields
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO entities (class_name, owner_id, is_public, fields, exposed_fields, created, last_edited)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.type_name)
        .bind(new.owner)
        .bind(new.is_public)
        .bind(fields_json(&new.fields)?)
        .bind(exposed)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let id = result.last_insert_rowid();
        info!(entity_id = id, type_name = %new.type_name, "Entity stored");

        let mut entity = Entity::new(new.type_name, id).with_timestamps(now, now);
        for (name, value) in new.fields {
            entity.set(name, value);
        }
        if let Some(exposed) = new.exposed_fields {
            entity = entity.with_exposed_fields(exposed);
        }
        Ok(entity)
    }

    /// Entities of `type_name` or any subtype that `caller` may view, oldest first
    pub async fn list_viewable(&self, type_name: &str, caller: &Caller) -> Result<Vec<Entity>> {
        let rows = sqlx::query_as::<_, EntityRow>("SELECT * FROM entities ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let admin = self.is_admin(caller).await?;
        rows.into_iter()
            .filter(|row| self.types.is_a(&row.class_name, type_name))
            .filter(|row| row.visible_to(caller, admin))
            .map(EntityRow::into_entity)
            .collect()
    }

    /// Set one field and stamp `LastEdited`; `None` when the entity does not exist
    pub async fn update_field(
        &self,
        id: EntityId,
        field: &str,
        value: impl Into<Scalar>,
    ) -> Result<Option<Entity>> {
        let Some(row) = self.fetch_row(id).await? else {
            return Ok(None);
        };

        let mut entity = row.into_entity()?;
        entity.set(field, value);
        let now = self.time_provider.now();

        sqlx::query("UPDATE entities SET fields = ?, last_edited = ? WHERE id = ?")
            .bind(fields_json(entity.fields())?)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(entity_id = id, field, "Entity field updated");
        let created = entity.created().unwrap_or(now);
        Ok(Some(entity.with_timestamps(created, now)))
    }

    async fn fetch_row(&self, id: EntityId) -> Result<Option<EntityRow>> {
        sqlx::query_as::<_, EntityRow>("SELECT * FROM entities WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn is_admin(&self, caller: &Caller) -> Result<bool> {
        match caller.member_id() {
            Some(member_id) => member_holds(&self.pool, member_id, ADMIN_PERMISSION).await,
            None => Ok(false),
        }
    }
}

#[async_trait]
impl EntityRepository for SqliteEntityRepository {
    async fn by_type_and_id(&self, type_name: &str, id: EntityId) -> Result<Option<Entity>> {
        let Some(row) = self.fetch_row(id).await? else {
            return Ok(None);
        };

        if !self.types.is_a(&row.class_name, type_name) {
            debug!(entity_id = id, stored = %row.class_name, requested = type_name, "Entity type mismatch");
            return Ok(None);
        }

        row.into_entity().map(Some)
    }

    /// Viewable when public, owned by the caller, or the caller is ADMIN
    async fn can_view(&self, entity: &Entity, caller: &Caller) -> Result<bool> {
        let access: Option<(Option<MemberId>, bool)> =
            sqlx::query_as("SELECT owner_id, is_public FROM entities WHERE id = ?")
                .bind(entity.id())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        let Some((owner_id, is_public)) = access else {
            return Ok(false);
        };
        if is_public || (owner_id.is_some() && owner_id == caller.member_id()) {
            return Ok(true);
        }
        self.is_admin(caller).await
    }
}

fn fields_json(fields: &IndexMap<String, Scalar>) -> Result<String> {
    let map: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect();
    Ok(serde_json::to_string(&map)?)
}

#[derive(Debug, sqlx::FromRow)]
struct EntityRow {
    id: i64,
    class_name: String,
    owner_id: Option<i64>,
    is_public: bool,
    fields: String,
    exposed_fields: Option<String>,
    created: DateTime<Utc>,
    last_edited: DateTime<Utc>,
}

impl EntityRow {
    fn visible_to(&self, caller: &Caller, admin: bool) -> bool {
        self.is_public || admin || (self.owner_id.is_some() && self.owner_id == caller.member_id())
    }

    fn into_entity(self) -> Result<Entity> {
        let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&self.fields)?;

        let mut entity =
            Entity::new(self.class_name, self.id).with_timestamps(self.created, self.last_edited);
        for (name, value) in &fields {
            entity.set(name.clone(), Scalar::from_json(value));
        }
        if let Some(exposed) = self.exposed_fields {
            let names: Vec<String> = serde_json::from_str(&exposed)?;
            entity = entity.with_exposed_fields(names);
        }
        Ok(entity)
    }
}
