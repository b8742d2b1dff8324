//! Entity types, filters, and patches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::traits::{OwnedRecord, Record, RecordFilter, RecordPatch};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// User
// ============================================================================

/// A back-office account. Owns itself: the owning key is the record's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a generated id.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            email: email.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

impl Record for User {
    const KIND: &'static str = "user";
    const OWNED_BY_ID: bool = true;
    type Filter = UserFilter;
    type Patch = UserPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.id
    }
}

/// Lookup criteria for users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserFilter {
    pub id: Option<String>,
    pub email: Option<String>,
}

impl RecordFilter<User> for UserFilter {
    fn matches(&self, user: &User) -> bool {
        self.id.as_deref().map_or(true, |v| v == user.id)
            && self.email.as_deref().map_or(true, |v| v == user.email)
    }

    fn requested_owner(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn constrain_owner(&mut self, owner_id: &str) {
        self.id = Some(owner_id.to_string());
    }
}

/// Partial update for a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl RecordPatch<User> for UserPatch {
    fn apply(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
    }
}

// ============================================================================
// Project
// ============================================================================

/// Project lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Paused,
    Completed,
    Archived,
}

/// A client engagement, scoped to the user who created it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new active project with a generated id.
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id: user_id.into(),
            name: name.into(),
            description: description.into(),
            status: ProjectStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Project {
    const KIND: &'static str = "project";
    type Filter = ProjectFilter;
    type Patch = ProjectPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl OwnedRecord for Project {
    fn assign_owner(&mut self, owner_id: &str) {
        self.user_id = owner_id.to_string();
    }
}

/// Lookup criteria for projects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFilter {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<ProjectStatus>,
    /// Case-insensitive substring match on the project name.
    pub name_contains: Option<String>,
}

impl ProjectFilter {
    /// Filter on a single project id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

impl RecordFilter<Project> for ProjectFilter {
    fn matches(&self, project: &Project) -> bool {
        self.id.as_deref().map_or(true, |v| v == project.id)
            && self.user_id.as_deref().map_or(true, |v| v == project.user_id)
            && self.status.map_or(true, |v| v == project.status)
            && self.name_contains.as_deref().map_or(true, |v| {
                project.name.to_lowercase().contains(&v.to_lowercase())
            })
    }

    fn requested_owner(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn constrain_owner(&mut self, owner_id: &str) {
        self.user_id = Some(owner_id.to_string());
    }
}

/// Partial update for a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl RecordPatch<Project> for ProjectPatch {
    fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        project.updated_at = Utc::now();
    }
}

// ============================================================================
// ClientProfile
// ============================================================================

/// KYC verification states for a client profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    Pending,
    Submitted,
    Verified,
    Rejected,
}

/// A billable client, scoped to the user who created it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProfile {
    pub id: String,
    pub user_id: String,
    pub company: String,
    pub contact_email: String,
    pub kyc_status: KycStatus,
    pub created_at: DateTime<Utc>,
}

impl ClientProfile {
    /// Create a new client profile with a generated id and pending KYC.
    pub fn new(
        user_id: impl Into<String>,
        company: impl Into<String>,
        contact_email: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.into(),
            company: company.into(),
            contact_email: contact_email.into(),
            kyc_status: KycStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

impl Record for ClientProfile {
    const KIND: &'static str = "client profile";
    type Filter = ClientProfileFilter;
    type Patch = ClientProfilePatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl OwnedRecord for ClientProfile {
    fn assign_owner(&mut self, owner_id: &str) {
        self.user_id = owner_id.to_string();
    }
}

/// Lookup criteria for client profiles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientProfileFilter {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub kyc_status: Option<KycStatus>,
    /// Case-insensitive substring match on the company name.
    pub company_contains: Option<String>,
}

impl ClientProfileFilter {
    /// Filter on a single client profile id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

impl RecordFilter<ClientProfile> for ClientProfileFilter {
    fn matches(&self, client: &ClientProfile) -> bool {
        self.id.as_deref().map_or(true, |v| v == client.id)
            && self.user_id.as_deref().map_or(true, |v| v == client.user_id)
            && self.kyc_status.map_or(true, |v| v == client.kyc_status)
            && self.company_contains.as_deref().map_or(true, |v| {
                client.company.to_lowercase().contains(&v.to_lowercase())
            })
    }

    fn requested_owner(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn constrain_owner(&mut self, owner_id: &str) {
        self.user_id = Some(owner_id.to_string());
    }
}

/// Partial update for a client profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientProfilePatch {
    pub company: Option<String>,
    pub contact_email: Option<String>,
    pub kyc_status: Option<KycStatus>,
}

impl RecordPatch<ClientProfile> for ClientProfilePatch {
    fn apply(&self, client: &mut ClientProfile) {
        if let Some(company) = &self.company {
            client.company = company.clone();
        }
        if let Some(contact_email) = &self.contact_email {
            client.contact_email = contact_email.clone();
        }
        if let Some(kyc_status) = self.kyc_status {
            client.kyc_status = kyc_status;
        }
    }
}

// ============================================================================
// Invoice
// ============================================================================

/// Invoice lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Void,
}

/// An invoice issued against a client profile, scoped to the user who
/// created it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub user_id: String,
    /// The [`ClientProfile`] this invoice bills.
    pub client_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
    pub due_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Create a new draft invoice with a generated id.
    pub fn new(
        user_id: impl Into<String>,
        client_id: impl Into<String>,
        amount_cents: i64,
    ) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.into(),
            client_id: client_id.into(),
            amount_cents,
            currency: "USD".to_string(),
            status: InvoiceStatus::Draft,
            issued_at: Utc::now(),
            due_at: None,
        }
    }
}

impl Record for Invoice {
    const KIND: &'static str = "invoice";
    type Filter = InvoiceFilter;
    type Patch = InvoicePatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl OwnedRecord for Invoice {
    fn assign_owner(&mut self, owner_id: &str) {
        self.user_id = owner_id.to_string();
    }
}

/// Lookup criteria for invoices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceFilter {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub client_id: Option<String>,
    pub status: Option<InvoiceStatus>,
}

impl InvoiceFilter {
    /// Filter on a single invoice id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

impl RecordFilter<Invoice> for InvoiceFilter {
    fn matches(&self, invoice: &Invoice) -> bool {
        self.id.as_deref().map_or(true, |v| v == invoice.id)
            && self.user_id.as_deref().map_or(true, |v| v == invoice.user_id)
            && self.client_id.as_deref().map_or(true, |v| v == invoice.client_id)
            && self.status.map_or(true, |v| v == invoice.status)
    }

    fn requested_owner(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn constrain_owner(&mut self, owner_id: &str) {
        self.user_id = Some(owner_id.to_string());
    }
}

/// Partial update for an invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoicePatch {
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub due_at: Option<DateTime<Utc>>,
}

impl RecordPatch<Invoice> for InvoicePatch {
    fn apply(&self, invoice: &mut Invoice) {
        if let Some(amount_cents) = self.amount_cents {
            invoice.amount_cents = amount_cents;
        }
        if let Some(currency) = &self.currency {
            invoice.currency = currency.clone();
        }
        if let Some(status) = self.status {
            invoice.status = status;
        }
        if let Some(due_at) = self.due_at {
            invoice.due_at = Some(due_at);
        }
    }
}
