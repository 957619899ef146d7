// Adapters layer: concrete implementations for external systems.

pub mod sqlite;
pub mod storage;

pub use sqlite::SqliteSink;
pub use storage::LocalStorage;
