//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::error::expose_upstream_details;
use super::handlers::{calculations, events, expenses, packages, sales, system};
use super::state::AppState;
use crate::config::ServerConfig;

/// CORS policy: any origin in development, otherwise only `allowed_origins`.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.is_development() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Upload routes stop reading well before the global body limit.
    let upload_limit = DefaultBodyLimit::max(state.config.upload_body_limit());

    let events = Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route(
            "/{id}",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        );

    let packages = Router::new()
        .route("/", get(packages::list_packages).post(packages::create_package))
        .route(
            "/{id}",
            get(packages::get_package)
                .put(packages::update_package)
                .delete(packages::delete_package),
        )
        .route("/{id}/events", get(packages::package_events));

    let sales = Router::new()
        .route("/", get(sales::list_sales))
        .route("/stats", get(sales::sales_stats))
        .route(
            "/package",
            post(sales::create_package_sale).layer(upload_limit),
        )
        .route(
            "/individual",
            post(sales::create_individual_sale).layer(upload_limit),
        )
        .route("/{id}", get(sales::get_sale).delete(sales::delete_sale))
        .route("/{id}/delivery", patch(sales::set_delivery))
        .route("/{id}/payment", patch(sales::set_payment_status));

    let expenses = Router::new()
        .route(
            "/",
            get(expenses::list_expenses)
                .post(expenses::create_expense)
                .layer(upload_limit),
        )
        .route("/stats", get(expenses::expense_stats))
        .route("/categories", get(expenses::list_categories))
        .route("/{id}", get(expenses::get_expense).delete(expenses::delete_expense))
        .route("/{id}/status", patch(expenses::set_status));

    let calculations = Router::new()
        .route(
            "/",
            get(calculations::list_calculations).post(calculations::create_calculation),
        )
        .route("/compare", post(calculations::compare_scenarios))
        .route("/stats/summary", get(calculations::calculation_summary))
        .route(
            "/{id}",
            get(calculations::get_calculation).delete(calculations::delete_calculation),
        );

    let api = Router::new()
        .route("/health", get(system::health_check))
        .route("/deploy-info", get(system::deploy_info))
        .route("/stats/general", get(system::general_stats))
        .nest("/events", events)
        .nest("/packages", packages)
        .nest("/sales", sales)
        .nest("/expenses", expenses)
        .nest("/calculations", calculations);

    Router::new()
        .nest("/api", api)
        .fallback(system::not_found)
        .layer(middleware::map_response_with_state(
            state.clone(),
            expose_upstream_details,
        ))
        .layer(DefaultBodyLimit::max(state.config.body_limit_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_builds_for_every_environment() {
        let _dev = cors_layer(&ServerConfig::default());
        let _prod = cors_layer(&ServerConfig {
            environment: "production".to_string(),
            allowed_origins: vec!["https://fest.example".to_string(), "bad\norigin".to_string()],
            ..Default::default()
        });
    }
}
