mod memory;
mod postgres;

pub use self::memory::MemoryStore;
pub use self::postgres::{render, PostgresStore};
