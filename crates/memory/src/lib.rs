//! Context store implementations for Palaver.
//!
//! The `ContextStore` trait lives in `palaver-core`; this crate holds the
//! in-memory reference implementation used in tests and ephemeral
//! deployments. A persistent backend plugs in behind the same trait.

pub mod in_memory;

pub use in_memory::InMemoryStore;
