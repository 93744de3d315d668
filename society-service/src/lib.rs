pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::SocietyConfig;
use crate::services::OnboardingWorkflow;

/// Multipart overhead allowed on top of the document bytes.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SocietyConfig>,
    pub workflow: Arc<OnboardingWorkflow>,
    pub register_rate_limiter: IpRateLimiter,
    pub regenerate_key_rate_limiter: IpRateLimiter,
}

pub fn build_router(state: AppState) -> Router {
    let uploads = &state.config.uploads;
    let register_body_limit = uploads
        .max_file_bytes
        .saturating_mul(uploads.max_files)
        .saturating_add(FORM_OVERHEAD_BYTES);

    let register_route = Router::new()
        .route("/api/society/register", post(handlers::registration::register))
        .layer(DefaultBodyLimit::max(register_body_limit))
        .layer(from_fn_with_state(
            state.register_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let regenerate_route = Router::new()
        .route(
            "/api/society/regenerate-key",
            post(handlers::registration::regenerate_key),
        )
        .layer(from_fn_with_state(
            state.regenerate_key_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let society_routes = Router::new()
        .route(
            "/api/society/verify/:society_id",
            get(handlers::registration::verify_email),
        )
        .route(
            "/api/society/admin-verify/:society_id",
            get(handlers::registration::admin_verify),
        )
        .merge(register_route)
        .merge(regenerate_route);

    let setup_routes = Router::new()
        .route("/society/setup/:society_id", get(handlers::setup::setup_status))
        .route(
            "/society/setup/:society_id/set-password",
            post(handlers::setup::set_password),
        )
        .route(
            "/society/setup/:society_id/configure",
            post(handlers::setup::configure),
        );

    Router::new()
        .route("/", get(handlers::health::welcome))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .merge(society_routes)
        .merge(setup_routes)
        .route_layer(from_fn(metrics_middleware))
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
}
