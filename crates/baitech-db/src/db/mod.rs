//! Sequence repositories
//!
//! `SequenceStore` reserves the next value of a scope atomically. The
//! PostgreSQL store is the production implementation; the in-memory store
//! serves tests and single-process tools. `CountingSequenceStore` keeps the
//! older count-then-format strategy over a `DocumentCounter`.

pub mod counting;
pub mod memory;
pub mod sequence;
pub mod setup;

pub use counting::{CountFilter, CountingSequenceStore, DocumentCounter, InMemoryDocumentCounter};
pub use memory::InMemorySequenceStore;
pub use sequence::{PgSequenceStore, SequenceStore};
pub use setup::{connect, run_migrations, setup_database};
