// Switchboard Infrastructure - SQLite Adapter
// Implements: EntityRepository, Authenticator (member tokens), Authorizer (permission codes)

mod connection;
mod entity_repository;
mod error;
mod member_repository;
mod migration;
mod permission;
mod token_authenticator;

pub use connection::create_pool;
pub use entity_repository::{NewEntity, SqliteEntityRepository};
pub use member_repository::{hash_token, SqliteMemberRepository};
pub use migration::run_migrations;
pub use permission::{SqliteAuthorizer, ADMIN_PERMISSION};
pub use token_authenticator::SqliteTokenAuthenticator;

// Note: sqlx::Error conversion is handled by `error::map_sqlx_error`
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for DispatchError here)
