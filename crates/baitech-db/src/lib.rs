//! Baitech DB Library
//!
//! Sequence stores backing the identifier generator, plus connection pool
//! setup and migrations.

pub mod db;

pub use db::*;
pub use sqlx;
