// Entity Repository Port (Interface)

use crate::domain::{Caller, Entity, EntityId};
use crate::error::Result;
use async_trait::async_trait;

/// Read access to persisted entities, used to resolve entity-typed parameters
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Find an entity of `type_name` (or one of its subtypes) by ID
    async fn by_type_and_id(&self, type_name: &str, id: EntityId) -> Result<Option<Entity>>;

    /// Entity-level view permission.
    ///
    /// Return `Err(DispatchError::AccessDenied)` to fail the whole call with a 403
    /// instead of letting the binder treat the parameter as unbound.
    async fn can_view(&self, entity: &Entity, caller: &Caller) -> Result<bool>;
}
