//! Long-term memory stores and local passage retrieval for lorekeep.
//!
//! Memory backends implement `lorekeep_core::MemoryStore`; the passage
//! store implements `lorekeep_core::Retriever` and serves as the local
//! stand-in for a production vector-search knowledge base.

pub mod file_backend;
pub mod in_memory;
pub mod keyword;
pub mod noop;
pub mod passages;

pub use file_backend::FileBackend;
pub use in_memory::InMemoryStore;
pub use noop::NoopMemory;
pub use passages::FilePassages;
