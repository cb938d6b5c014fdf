use axum::{
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{request_id_middleware, REQUEST_ID_HEADER};
use crate::{handlers::*, AppState};

pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/stations/:name", get(get_station))
        .route("/summary", get(get_summary))
        .route("/alerts", get(get_alerts))
        .route("/scheduler", get(get_scheduler_status))
        .route("/refresh", post(trigger_refresh))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1", create_api_routes())
        // Middleware stack
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST])
                        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
                        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]),
                ),
        )
        .with_state(state)
}
