//! Data-store abstraction.
//!
//! The access-control layer talks to storage through the [`RecordStore`]
//! trait, one generic CRUD surface per entity kind. Any backend with this
//! shape is substitutable; [`MemoryStore`] is the embedded backend used by
//! the server and the test suite.

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::RecordStore;
