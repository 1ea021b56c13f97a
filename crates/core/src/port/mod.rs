// Port Layer - Interfaces for external collaborators

pub mod authenticator;
pub mod authorizer;
pub mod entity_repository;
pub mod id_provider; // Request ids for log correlation
pub mod service;
pub mod time_provider;

// Re-exports
pub use authenticator::{AnonymousAuthenticator, Authenticator, Credentials};
pub use authorizer::Authorizer;
pub use entity_repository::EntityRepository;
pub use id_provider::IdProvider;
pub use service::{CallContext, Capabilities, InMemoryServiceLocator, ServiceLocator, WebService};
pub use time_provider::TimeProvider;
