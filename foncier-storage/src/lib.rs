//! e-Foncier Storage - Storage Trait and In-Memory Store
//!
//! Defines the storage abstraction for registry entities. The PostgreSQL
//! implementation lives in foncier-api.

pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::RegistryStore;
