//! Access-control layer.
//!
//! Mediates every data access to user, project, client-profile, and
//! invoice records, enforcing per-caller ownership with an admin bypass.
//! The underlying store has no row-level security of its own; this layer
//! is where it lives.

mod service;

pub use service::AccessControl;
