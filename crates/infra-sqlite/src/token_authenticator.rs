// SQLite Authenticator - `<memberId>:<token>` API tokens

use crate::member_repository::SqliteMemberRepository;
use async_trait::async_trait;
use switchboard_core::domain::{Caller, MemberId};
use switchboard_core::error::Result;
use switchboard_core::port::{Authenticator, Credentials};
use tracing::debug;

pub struct SqliteTokenAuthenticator {
    members: SqliteMemberRepository,
    allow_public_access: bool,
}

impl SqliteTokenAuthenticator {
    pub fn new(members: SqliteMemberRepository, allow_public_access: bool) -> Self {
        Self {
            members,
            allow_public_access,
        }
    }
}

fn split_token(raw: &str) -> Option<(MemberId, &str)> {
    let (id, secret) = raw.split_once(':')?;
    let id = id.trim().parse().ok()?;
    (!secret.is_empty()).then_some((id, secret))
}

#[async_trait]
impl Authenticator for SqliteTokenAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<Caller>> {
        let Some(raw) = credentials.token.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(self.allow_public_access.then_some(Caller::Anonymous));
        };

        let Some((member_id, secret)) = split_token(raw) else {
            debug!("Malformed API token");
            return Ok(None);
        };

        let principal = self.members.verify_token(member_id, secret).await?;
        if principal.is_none() {
            debug!(member_id, "API token rejected");
        }
        Ok(principal.map(Caller::Member))
    }
}
