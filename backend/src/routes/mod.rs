//! Route definitions for TimberBalance

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - movement records
        .nest("/receptions", reception_routes(state.clone()))
        .nest("/consumptions", consumption_routes(state.clone()))
        .nest("/production", production_routes(state.clone()))
        .nest("/sales", sale_routes(state.clone()))
        .nest("/opening-stocks", opening_stock_routes(state.clone()))
        // Protected routes - landholdings and compliance documents
        .nest("/landholdings", landholding_routes(state.clone()))
        // Protected routes - annual balance
        .nest("/balance", balance_routes(state.clone()))
        // Protected routes - bulk ingestion
        .nest("/bulk", bulk_routes(state.clone()))
        // Protected routes - document processing
        .nest("/documents", document_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Reception routes (protected)
fn reception_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_receptions).post(handlers::create_reception),
        )
        .route(
            "/:reception_id",
            get(handlers::get_reception)
                .put(handlers::update_reception)
                .delete(handlers::delete_reception),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Consumption routes (protected)
fn consumption_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_consumptions).post(handlers::create_consumption),
        )
        .route(
            "/:consumption_id",
            get(handlers::get_consumption)
                .put(handlers::update_consumption)
                .delete(handlers::delete_consumption),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Production run routes (protected)
fn production_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_production_runs).post(handlers::create_production_run),
        )
        .route(
            "/:production_id",
            get(handlers::get_production_run)
                .put(handlers::update_production_run)
                .delete(handlers::delete_production_run),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Sale routes (protected)
fn sale_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route(
            "/:sale_id",
            get(handlers::get_sale)
                .put(handlers::update_sale)
                .delete(handlers::delete_sale),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Opening stock routes (protected)
fn opening_stock_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_opening_stocks).post(handlers::set_opening_stock),
        )
        .route("/:stock_id", axum::routing::delete(handlers::delete_opening_stock))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Landholding routes (protected)
fn landholding_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_landholdings).post(handlers::create_landholding),
        )
        .route("/document-types", get(handlers::list_document_types))
        .route(
            "/:landholding_id",
            get(handlers::get_landholding).put(handlers::update_landholding),
        )
        .route(
            "/:landholding_id/archive",
            put(handlers::archive_landholding),
        )
        .route(
            "/:landholding_id/documents",
            get(handlers::list_documents).post(handlers::upload_document),
        )
        .route(
            "/:landholding_id/documents/:document_id",
            get(handlers::download_document).delete(handlers::delete_document),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Annual balance routes (protected)
fn balance_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:year", get(handlers::get_annual_balance))
        .route("/:year/export", get(handlers::export_annual_balance))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Bulk ingestion routes (protected)
fn bulk_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/records", post(handlers::bulk_insert_records))
        .route("/statements", post(handlers::bulk_insert_statements))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Document processing routes (protected)
fn document_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/process", post(handlers::process_document))
        .route("/history", get(handlers::get_processing_history))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
