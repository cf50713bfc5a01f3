pub mod error_path;
pub mod tracing;
