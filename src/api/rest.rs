//! REST API router construction.

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::handlers::{
    create_client_handler, create_invoice_handler, create_project_handler, create_user_handler,
    delete_client_handler, delete_invoice_handler, delete_project_handler, get_client_handler,
    get_invoice_handler, get_project_handler, get_user_handler, health_handler,
    list_clients_handler, list_invoices_handler, list_projects_handler, list_users_handler,
    update_client_handler, update_invoice_handler, update_project_handler, update_user_handler,
    ApiState,
};
use crate::auth::{AuthLayer, Authenticator};
use crate::config::ApiConfig;
use crate::store::MemoryStore;

/// Create the REST API router.
///
/// Endpoints (under the configured prefix):
/// - GET|POST            /users,    GET|PATCH        /users/:id
/// - GET|POST            /projects, GET|PATCH|DELETE /projects/:id
/// - GET|POST            /clients,  GET|PATCH|DELETE /clients/:id
/// - GET|POST            /invoices, GET|PATCH|DELETE /invoices/:id
/// - GET /health (unprefixed)
///
/// The auth middleware resolves the caller identity once per request;
/// each handler then constructs its own access-control service around it.
pub fn create_rest_router(
    store: Arc<MemoryStore>,
    authenticator: Authenticator,
    config: &ApiConfig,
) -> Router {
    let state = Arc::new(ApiState::new(store));

    let api_routes = Router::new()
        .route(
            "/users",
            get(list_users_handler).post(create_user_handler),
        )
        .route(
            "/users/:id",
            get(get_user_handler).patch(update_user_handler),
        )
        .route(
            "/projects",
            get(list_projects_handler).post(create_project_handler),
        )
        .route(
            "/projects/:id",
            get(get_project_handler)
                .patch(update_project_handler)
                .delete(delete_project_handler),
        )
        .route(
            "/clients",
            get(list_clients_handler).post(create_client_handler),
        )
        .route(
            "/clients/:id",
            get(get_client_handler)
                .patch(update_client_handler)
                .delete(delete_client_handler),
        )
        .route(
            "/invoices",
            get(list_invoices_handler).post(create_invoice_handler),
        )
        .route(
            "/invoices/:id",
            get(get_invoice_handler)
                .patch(update_invoice_handler)
                .delete(delete_invoice_handler),
        )
        .with_state(state);

    let router = Router::new()
        .nest(&config.prefix, api_routes)
        .route("/health", get(health_handler))
        .layer(AuthLayer::new(authenticator));

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_origin(Any);

        router.layer(cors)
    } else {
        router
    }
}
