pub mod auth_extractor;
pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::*;
