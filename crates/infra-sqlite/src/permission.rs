// SQLite Authorizer - member permission codes

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use sqlx::SqlitePool;
use switchboard_core::domain::{Caller, MemberId};
use switchboard_core::error::Result;
use switchboard_core::port::Authorizer;

/// Holding this code implies every other permission
pub const ADMIN_PERMISSION: &str = "ADMIN";

/// `member_id` holds `code` directly or through ADMIN
pub(crate) async fn member_holds(pool: &SqlitePool, member_id: MemberId, code: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM member_permissions WHERE member_id = ? AND code IN (?, ?)",
    )
    .bind(member_id)
    .bind(code)
    .bind(ADMIN_PERMISSION)
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;

    Ok(count > 0)
}

pub struct SqliteAuthorizer {
    pool: SqlitePool,
}

impl SqliteAuthorizer {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Authorizer for SqliteAuthorizer {
    async fn has_permission(&self, caller: &Caller, permission: &str) -> Result<bool> {
        match caller.member_id() {
            Some(member_id) => member_holds(&self.pool, member_id, permission).await,
            None => Ok(false),
        }
    }
}
