//! Baitech Core Library
//!
//! Domain models, error types, configuration and shared constants used by the
//! image pipeline and the identifier generator.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{AppConfig, CloudinaryConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
