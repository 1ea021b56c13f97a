// SQLite member store: accounts, API tokens, permission grants

use crate::error::map_sqlx_error;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::sync::Arc;
use switchboard_core::domain::{MemberId, Principal};
use switchboard_core::error::Result;
use switchboard_core::port::TimeProvider;
use tracing::info;

/// Hex-encoded SHA-256 of a raw API token
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[derive(Clone)]
pub struct SqliteMemberRepository {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteMemberRepository {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    pub async fn create(&self, email: &str) -> Result<MemberId> {
        let result = sqlx::query("INSERT INTO members (email, created) VALUES (?, ?)")
            .bind(email)
            .bind(self.time_provider.now())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let id = result.last_insert_rowid();
        info!(member_id = id, email, "Member created");
        Ok(id)
    }

    /// Store the hash of `token`; the raw token is never persisted
    pub async fn set_token(&self, member_id: MemberId, token: &str) -> Result<()> {
        sqlx::query("UPDATE members SET token_hash = ? WHERE id = ?")
            .bind(hash_token(token))
            .bind(member_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    pub async fn grant(&self, member_id: MemberId, code: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO member_permissions (member_id, code) VALUES (?, ?)")
            .bind(member_id)
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// The member, when `token` matches its stored hash
    pub async fn verify_token(&self, member_id: MemberId, token: &str) -> Result<Option<Principal>> {
        let row: Option<(i64, String, Option<String>)> =
            sqlx::query_as("SELECT id, email, token_hash FROM members WHERE id = ?")
                .bind(member_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.and_then(|(id, email, stored)| {
            let stored = stored?;
            (stored == hash_token(token)).then_some(Principal { id, email })
        }))
    }
}
