//! HTTP API Layer
//!
//! This crate provides the REST API of the sales ledger using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers, one module per resource
//! - **Middleware**: Request ids, tracing and audit logging
//! - **DTOs**: Bodies that are not domain records
//! - **Error Handling**: Consistent error responses
//!
//! Handlers only talk to a [`SalesPort`], so the same router serves an
//! embedded database or forwards to a remote backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(port, clock, config);
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderName,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use core_kernel::Clock;
use domain_sales::overdue::OverdueEngine;
use domain_sales::ports::SalesPort;
use infra_db::SqliteRecordStore;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{contracts, database, debts, health, houses, payments, receipts, resale, statistics};
use crate::middleware::{audit_middleware, REQUEST_ID_HEADER};

/// Largest database file accepted by the import endpoint
const IMPORT_BODY_LIMIT: usize = 256 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub port: Arc<dyn SalesPort>,
    pub debts: Arc<OverdueEngine>,
    pub config: Arc<ApiConfig>,
    /// The embedded database, absent when forwarding to a remote backend
    pub store: Option<Arc<SqliteRecordStore>>,
}

impl AppState {
    /// Wires the overdue engine to `port` using the configured due-date policy
    pub fn new(port: Arc<dyn SalesPort>, clock: Arc<dyn Clock>, config: ApiConfig) -> Self {
        let debts = OverdueEngine::new(port.clone(), clock, config.due_date_policy());
        Self {
            port,
            debts: Arc::new(debts),
            config: Arc::new(config),
            store: None,
        }
    }

    /// Enables database export and import over `store`
    pub fn with_store(mut self, store: Arc<SqliteRecordStore>) -> Self {
        self.store = Some(store);
        self
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Port, overdue engine and configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let house_routes = Router::new()
        .route("/", get(houses::list_houses).post(houses::create_house))
        .route("/bulk", post(houses::create_houses_bulk))
        .route(
            "/:id",
            get(houses::get_house)
                .put(houses::update_house)
                .delete(houses::delete_house),
        );

    let receipt_routes = Router::new()
        .route("/", get(receipts::list_receipts).post(receipts::create_receipt))
        .route("/:id", get(receipts::get_receipt).delete(receipts::delete_receipt));

    let contract_routes = Router::new()
        .route("/", get(contracts::list_contracts).post(contracts::create_contract))
        .route("/sold-houses", get(contracts::sold_houses))
        .route(
            "/:id",
            get(contracts::get_contract)
                .put(contracts::update_contract)
                .delete(contracts::delete_contract),
        )
        .route("/:id/remaining", get(contracts::remaining_amount))
        .route("/:id/payments", get(contracts::contract_payments));

    let payment_routes = Router::new()
        .route("/", post(payments::add_payment))
        .route("/:id", delete(payments::delete_payment))
        .route("/contract/:id", get(contracts::contract_payments));

    let resale_routes = Router::new()
        .route("/", get(resale::list_resale).post(resale::create_resale))
        .route("/:id", delete(resale::delete_resale));

    let database_routes = Router::new()
        .route("/export", get(database::export_database))
        .route(
            "/import",
            post(database::import_database).layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        );

    let api_routes = Router::new()
        .nest("/houses", house_routes)
        .nest("/receipts", receipt_routes)
        .nest("/contracts", contract_routes)
        .nest("/payments", payment_routes)
        .nest("/resale", resale_routes)
        .nest("/database", database_routes)
        .route("/statistics", get(statistics::statistics))
        .route("/debts", get(debts::list_debts));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
