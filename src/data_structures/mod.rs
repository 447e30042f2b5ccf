//! Specialized data structures used by the crate.

mod id_pool;

pub use id_pool::IdPool;
