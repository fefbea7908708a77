pub mod api;
pub mod auth;
pub mod config;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export auth types
pub use auth::{AuthError, Identity, JwksVerifier, TokenVerifier};

// Export all model types
pub use model::*;

// Export store types
pub use store::{DocumentStore, MemoryStore, MongoStore, StoreError};
