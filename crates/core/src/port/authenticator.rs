// Authenticator Port (Interface)

use crate::domain::Caller;
use crate::error::Result;
use async_trait::async_trait;

/// Credentials lifted off the request by the HTTP boundary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Raw token, `<memberId>:<secret>` for the bundled token authenticator
    pub token: Option<String>,
}

impl Credentials {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

/// Establishes who is calling
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// `Ok(None)` rejects the request outright (403 "User not found");
    /// `Ok(Some(Caller::Anonymous))` lets it through unauthenticated.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<Caller>>;
}

/// Treats every request as anonymous (public-only deployments, tests)
pub struct AnonymousAuthenticator;

#[async_trait]
impl Authenticator for AnonymousAuthenticator {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<Option<Caller>> {
        Ok(Some(Caller::Anonymous))
    }
}
