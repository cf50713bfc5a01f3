//! charge-core: Shared infrastructure for the charge platform services.

pub mod auth;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;

pub use async_trait;
pub use axum;
pub use serde;
pub use serde_json;
pub use tracing;
pub use validator;
