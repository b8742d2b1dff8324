//! REST API request handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::access::AccessControl;
use crate::auth::CallerIdentity;
use crate::error::{AccessError, LedgerdeskError, StoreError};
use crate::model::{
    ClientProfile, ClientProfileFilter, ClientProfilePatch, Invoice, InvoiceFilter, InvoicePatch,
    Project, ProjectFilter, ProjectPatch, User, UserFilter, UserPatch,
};
use crate::store::MemoryStore;

/// Application state shared across handlers.
pub struct ApiState {
    /// The data store every per-request service wraps.
    pub store: Arc<MemoryStore>,
}

impl ApiState {
    /// Create new API state.
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

/// Build the per-request access-control service.
fn access(state: &ApiState, identity: CallerIdentity) -> AccessControl<MemoryStore> {
    AccessControl::new(state.store.clone(), identity)
}

// ============================================================================
// Error mapping
// ============================================================================

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Handler-level error wrapper mapping the error taxonomy onto HTTP.
///
/// Denials map to 404, the same status as a genuine miss: a rejected
/// caller must not learn whether the record exists.
pub struct ApiError(LedgerdeskError);

impl From<LedgerdeskError> for ApiError {
    fn from(err: LedgerdeskError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self.0 {
            LedgerdeskError::Access(AccessError::Unauthenticated) => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "authentication required".to_string(),
            ),
            LedgerdeskError::Access(AccessError::Denied { .. })
            | LedgerdeskError::Access(AccessError::NotFound { .. })
            | LedgerdeskError::Store(StoreError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, "not_found", "not found".to_string())
            }
            LedgerdeskError::Store(StoreError::Conflict { .. }) => (
                StatusCode::CONFLICT,
                "conflict",
                self.0.to_string(),
            ),
            LedgerdeskError::Auth(_) => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid credentials".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal error".to_string(),
            ),
        };

        tracing::debug!(status = %status, error = %self.0, "request rejected");

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// ============================================================================
// Request types
// ============================================================================

/// Create-user request (admin only).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
}

/// Create-project request. A supplied `user_id` is overridden by the
/// access layer with the caller's own id.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Create-client request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClientRequest {
    pub company: String,
    pub contact_email: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Create-invoice request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoiceRequest {
    pub client_id: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub user_id: Option<String>,
}

// ============================================================================
// Health
// ============================================================================

/// GET /health - Liveness probe.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ============================================================================
// Users
// ============================================================================

/// GET /users - List visible users (all for admins, self otherwise).
pub async fn list_users_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Query(filter): Query<UserFilter>,
) -> ApiResult<Json<Vec<User>>> {
    let users: Vec<User> = access(&state, identity).find_many(filter).await?;
    Ok(Json(users))
}

/// GET /users/:id - Get one user.
pub async fn get_user_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let filter = UserFilter {
        id: Some(id),
        email: None,
    };
    let user: User = access(&state, identity).find_one(filter).await?;
    Ok(Json(user))
}

/// POST /users - Create a user (admin only).
pub async fn create_user_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = access(&state, identity)
        .create_user(User::new(request.email, request.name))
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PATCH /users/:id - Update a user (self, or any for admins).
pub async fn update_user_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Path(id): Path<String>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<Json<User>> {
    let filter = UserFilter {
        id: Some(id),
        email: None,
    };
    let user: User = access(&state, identity).update(filter, patch).await?;
    Ok(Json(user))
}

// ============================================================================
// Projects
// ============================================================================

/// GET /projects - List visible projects.
pub async fn list_projects_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Query(filter): Query<ProjectFilter>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects: Vec<Project> = access(&state, identity).find_many(filter).await?;
    Ok(Json(projects))
}

/// GET /projects/:id - Get one project.
pub async fn get_project_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    let project: Project = access(&state, identity)
        .find_one(ProjectFilter::by_id(id))
        .await?;
    Ok(Json(project))
}

/// POST /projects - Create a project owned by the caller.
pub async fn create_project_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = Project::new(
        request.user_id.unwrap_or_default(),
        request.name,
        request.description,
    );
    let project = access(&state, identity).create(project).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// PATCH /projects/:id - Update a project.
pub async fn update_project_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Path(id): Path<String>,
    Json(patch): Json<ProjectPatch>,
) -> ApiResult<Json<Project>> {
    let project: Project = access(&state, identity)
        .update(ProjectFilter::by_id(id), patch)
        .await?;
    Ok(Json(project))
}

/// DELETE /projects/:id - Delete a project.
pub async fn delete_project_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    let project: Project = access(&state, identity)
        .delete(ProjectFilter::by_id(id))
        .await?;
    Ok(Json(project))
}

// ============================================================================
// Client profiles
// ============================================================================

/// GET /clients - List visible client profiles.
pub async fn list_clients_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Query(filter): Query<ClientProfileFilter>,
) -> ApiResult<Json<Vec<ClientProfile>>> {
    let clients: Vec<ClientProfile> = access(&state, identity).find_many(filter).await?;
    Ok(Json(clients))
}

/// GET /clients/:id - Get one client profile.
pub async fn get_client_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Json<ClientProfile>> {
    let client: ClientProfile = access(&state, identity)
        .find_one(ClientProfileFilter::by_id(id))
        .await?;
    Ok(Json(client))
}

/// POST /clients - Create a client profile owned by the caller.
pub async fn create_client_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Json(request): Json<CreateClientRequest>,
) -> ApiResult<(StatusCode, Json<ClientProfile>)> {
    let client = ClientProfile::new(
        request.user_id.unwrap_or_default(),
        request.company,
        request.contact_email,
    );
    let client = access(&state, identity).create(client).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// PATCH /clients/:id - Update a client profile.
pub async fn update_client_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Path(id): Path<String>,
    Json(patch): Json<ClientProfilePatch>,
) -> ApiResult<Json<ClientProfile>> {
    let client: ClientProfile = access(&state, identity)
        .update(ClientProfileFilter::by_id(id), patch)
        .await?;
    Ok(Json(client))
}

/// DELETE /clients/:id - Delete a client profile.
pub async fn delete_client_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Json<ClientProfile>> {
    let client: ClientProfile = access(&state, identity)
        .delete(ClientProfileFilter::by_id(id))
        .await?;
    Ok(Json(client))
}

// ============================================================================
// Invoices
// ============================================================================

/// GET /invoices - List visible invoices.
pub async fn list_invoices_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Query(filter): Query<InvoiceFilter>,
) -> ApiResult<Json<Vec<Invoice>>> {
    let invoices: Vec<Invoice> = access(&state, identity).find_many(filter).await?;
    Ok(Json(invoices))
}

/// GET /invoices/:id - Get one invoice.
pub async fn get_invoice_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Json<Invoice>> {
    let invoice: Invoice = access(&state, identity)
        .find_one(InvoiceFilter::by_id(id))
        .await?;
    Ok(Json(invoice))
}

/// POST /invoices - Create an invoice owned by the caller.
pub async fn create_invoice_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Json(request): Json<CreateInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    let invoice = Invoice::new(
        request.user_id.unwrap_or_default(),
        request.client_id,
        request.amount_cents,
    );
    let invoice = access(&state, identity).create(invoice).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// PATCH /invoices/:id - Update an invoice.
pub async fn update_invoice_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Path(id): Path<String>,
    Json(patch): Json<InvoicePatch>,
) -> ApiResult<Json<Invoice>> {
    let invoice: Invoice = access(&state, identity)
        .update(InvoiceFilter::by_id(id), patch)
        .await?;
    Ok(Json(invoice))
}

/// DELETE /invoices/:id - Delete an invoice.
pub async fn delete_invoice_handler(
    State(state): State<Arc<ApiState>>,
    Extension(identity): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Json<Invoice>> {
    let invoice: Invoice = access(&state, identity)
        .delete(InvoiceFilter::by_id(id))
        .await?;
    Ok(Json(invoice))
}
