//! API Layer
//!
//! HTTP API endpoints and request handling for the aid service.

pub mod admin_handlers;
pub mod aid_handlers;
pub mod handlers;
pub mod middleware;
pub mod routes;

// Re-export commonly used types
pub use handlers::AppState;
pub use middleware::{auth_middleware, AuthAccount};
pub use routes::{create_routes, RouterBuilder};
