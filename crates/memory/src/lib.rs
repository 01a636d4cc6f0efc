//! Memory store implementations for Ponder.

pub mod in_memory;
pub mod token;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use token::estimate_tokens;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
