//! HTTP API for the back office.
//!
//! Route handlers are thin: each resolves the caller identity left in
//! request extensions by the auth middleware, constructs a fresh
//! [`AccessControl`](crate::access::AccessControl) for that request, and
//! renders the result. All ownership decisions live in the access layer.

mod handlers;
mod rest;

pub use handlers::ApiState;
pub use rest::create_rest_router;
