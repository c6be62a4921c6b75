//! REST exposure of the normalization engine
//!
//! `ServerBuilder` wires the configuration, an entity store and an auth
//! provider into an axum `Router` serving:
//! - collection, resource, related and relationship documents
//! - resource creation from request documents
//! - a `/health` liveness check

pub mod builder;
pub mod handlers;
pub mod host;
pub mod response;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::AppState;
pub use host::ServerHost;
pub use router::build_router;
