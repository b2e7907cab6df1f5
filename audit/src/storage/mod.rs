//! Persistence backends for audit records.

mod base;
mod memory;
mod postgres;

pub use base::Storage;
pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;
