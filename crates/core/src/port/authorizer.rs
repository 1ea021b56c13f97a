// Authorizer Port (Interface)

use crate::domain::Caller;
use crate::error::Result;
use async_trait::async_trait;

/// Permission checks for allow-list rules that name a permission
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Does `caller` hold the permission code `permission`?
    async fn has_permission(&self, caller: &Caller, permission: &str) -> Result<bool>;
}
