//! Baitech Storage Library
//!
//! This crate provides the storage abstraction used by the local image
//! pipeline: a `Storage` trait and its filesystem implementation.
//!
//! # Storage key format
//!
//! All keys are relative to the media root and share one layout:
//!
//! - **Primary variants**: `images/{stem}.{ext}`
//! - **Size variants**: `images_optimized/{size}/{stem}.{ext}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in
//! the `keys` module.

pub mod factory;
pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use baitech_core::StorageBackend;
pub use factory::create_storage;
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
