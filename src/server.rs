use crate::api::{admin, auth, stats};
use crate::ingest::handler::{record_visit, AppState};
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Permissive CORS for visit recording (the tracking call comes from the
    // host site, which may live on any origin)
    let ingestion_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    // Admin routes — stats summary + purge, guarded by bearer-token auth
    let admin_routes = Router::new()
        .route("/stats/summary", get(stats::get_summary))
        .route("/admin/purge-token", post(admin::issue_purge_token))
        .route("/admin/purge", post(admin::purge_stats))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_admin,
        ));

    // Recording with permissive CORS and a small body limit (payload is
    // two URLs and a flag)
    let ingestion_routes = Router::new()
        .route("/visit", post(record_visit))
        .layer(DefaultBodyLimit::max(16_384))
        .layer(ingestion_cors);

    let api_routes = Router::new().merge(ingestion_routes).merge(admin_routes);

    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
        .route("/metrics", get(prometheus_metrics))
        .nest("/api", api_routes)
        .layer(axum::middleware::map_response(add_security_headers))
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(30),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Inject OWASP-recommended security headers on every HTTP response.
async fn add_security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response
}

/// GET /health — Simple health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

/// GET /health/detailed — Detailed health check with system info.
async fn detailed_health_check(
    State(state): State<Arc<AppState>>,
) -> axum::Json<serde_json::Value> {
    let auth_configured = state.admin_token_hash.is_some();
    let stored_visits = tokio::task::spawn_blocking(move || state.store.count().unwrap_or(0))
        .await
        .unwrap_or(0);

    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "stored_visits": stored_visits,
        "auth_configured": auth_configured,
    }))
}

/// GET /metrics — Prometheus-compatible metrics endpoint.
async fn prometheus_metrics(
    State(state): State<Arc<AppState>>,
) -> ([(header::HeaderName, &'static str); 1], String) {
    use std::fmt::Write;
    use std::sync::atomic::Ordering;

    let recorded = state.visits_recorded_total.load(Ordering::Relaxed);
    let auth_configured = u8::from(state.admin_token_hash.is_some());
    let stored = tokio::task::spawn_blocking(move || state.store.count().unwrap_or(0))
        .await
        .unwrap_or(0);

    let mut out = String::with_capacity(512);
    let _ = writeln!(
        out,
        "# HELP sst_visits_recorded_total Visits recorded since startup"
    );
    let _ = writeln!(out, "# TYPE sst_visits_recorded_total counter");
    let _ = writeln!(out, "sst_visits_recorded_total {recorded}");
    let _ = writeln!(out, "# HELP sst_visits_stored Visits currently in the store");
    let _ = writeln!(out, "# TYPE sst_visits_stored gauge");
    let _ = writeln!(out, "sst_visits_stored {stored}");
    let _ = writeln!(out, "# HELP sst_auth_configured Whether an admin token is set");
    let _ = writeln!(out, "# TYPE sst_auth_configured gauge");
    let _ = writeln!(out, "sst_auth_configured {auth_configured}");

    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], out)
}
