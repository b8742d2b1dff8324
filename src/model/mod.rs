//! Record model for Ledgerdesk.
//!
//! Defines the four entity kinds the back office manages (users, projects,
//! client profiles, invoices) and the ownership traits the access-control
//! layer is parameterized over.

mod records;
mod traits;

pub use records::{
    ClientProfile, ClientProfileFilter, ClientProfilePatch, Invoice, InvoiceFilter, InvoicePatch,
    InvoiceStatus, KycStatus, Project, ProjectFilter, ProjectPatch, ProjectStatus, User,
    UserFilter, UserPatch,
};
pub use traits::{OwnedRecord, Record, RecordFilter, RecordPatch};
