//! Ledgerdesk: back-office server with ownership-scoped access control.
//!
//! Every data access to user, project, client-profile, and invoice records
//! goes through the access-control layer, which enforces per-caller
//! ownership and an admin bypass in lieu of database-native row-level
//! security.

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod store;

pub use access::AccessControl;
pub use api::{create_rest_router, ApiState};
pub use auth::{AuthLayer, AuthMiddleware, Authenticator, CallerIdentity, JwtClaims};
pub use config::{ApiConfig, AuthConfig, Config, JwtConfig, ServerConfig};
pub use error::{
    AccessError, AuthError, ConfigError, LedgerdeskError, Result, StoreError,
};
pub use model::{
    ClientProfile, ClientProfileFilter, ClientProfilePatch, Invoice, InvoiceFilter, InvoicePatch,
    InvoiceStatus, KycStatus, OwnedRecord, Project, ProjectFilter, ProjectPatch, ProjectStatus,
    Record, RecordFilter, RecordPatch, User, UserFilter, UserPatch,
};
pub use store::{MemoryStore, RecordStore};
