use crate::api::admin::PurgeTokenStore;
use crate::storage::visits::{NewVisit, VisitStore};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Maximum recorded user-agent length, in characters.
pub const MAX_USER_AGENT_LEN: usize = 255;

/// Maximum accepted URL length for page and referer fields.
const MAX_URL_LEN: usize = 2048;

/// Inbound visit payload from the site integration.
#[derive(Debug, Deserialize)]
pub struct VisitPayload {
    /// Canonical URL of the rendered page; empty if unresolvable
    #[serde(rename = "u", default)]
    pub page_url: String,
    /// Referer URL
    #[serde(rename = "r")]
    pub referer_url: Option<String>,
    /// Whether the page renders in an administrative context
    #[serde(rename = "a", default)]
    pub admin_context: bool,
}

/// Shared application state.
pub struct AppState {
    pub store: VisitStore,
    /// SHA-256 digest of the admin bearer token; None means admin routes refuse.
    pub admin_token_hash: Option<[u8; 32]>,
    /// Substring identifying the service's own internal agent; matching
    /// user agents are recorded as empty to suppress self-generated traffic.
    pub agent_marker: String,
    pub purge_tokens: PurgeTokenStore,
    pub visits_recorded_total: AtomicU64,
}

/// POST /api/visit — Record one page view.
///
/// Best-effort: a storage failure is logged, never surfaced to the visitor.
/// Administrative page renders are skipped entirely.
pub async fn record_visit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<VisitPayload>,
) -> impl IntoResponse {
    if payload.admin_context {
        return StatusCode::NO_CONTENT;
    }

    // Length validation to prevent abuse
    if payload.page_url.len() > MAX_URL_LEN
        || payload
            .referer_url
            .as_ref()
            .is_some_and(|r| r.len() > MAX_URL_LEN)
    {
        return StatusCode::BAD_REQUEST;
    }

    let user_agent = sanitize_user_agent(
        headers.get("user-agent").and_then(|v| v.to_str().ok()),
        &state.agent_marker,
    );
    let ip_address = sanitize_ip(&extract_ip(&headers));

    let visit = NewVisit {
        page_url: payload.page_url,
        referer_url: payload.referer_url.unwrap_or_default(),
        user_agent,
        ip_address,
    };

    let state2 = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || state2.store.insert(&visit)).await;

    match result {
        Ok(Ok(())) => {
            state.visits_recorded_total.fetch_add(1, Ordering::Relaxed);
        }
        Ok(Err(e)) => {
            // Recording failures are invisible to the visitor
            tracing::error!(error = %e, "Failed to record visit");
        }
        Err(e) => {
            tracing::error!(error = %e, "Visit insert task panicked");
        }
    }

    StatusCode::ACCEPTED
}

/// Extract client IP from headers, checking X-Forwarded-For first.
/// Returns the empty string when no address is available.
fn extract_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .unwrap_or_default()
        .to_string()
}

/// Normalize a raw User-Agent header value.
///
/// Missing headers and agents carrying the internal marker record as empty;
/// everything else is truncated to `MAX_USER_AGENT_LEN` characters.
fn sanitize_user_agent(ua: Option<&str>, marker: &str) -> String {
    match ua {
        None => String::new(),
        Some(ua) if ua.contains(marker) => String::new(),
        Some(ua) => ua.chars().take(MAX_USER_AGENT_LEN).collect(),
    }
}

/// Keep only characters valid in IPv4/IPv6 literal notation plus separators.
///
/// Permissive allow-list, not a validator: malformed-but-matching strings
/// pass through unchanged.
fn sanitize_ip(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_hexdigit() || matches!(c, ':' | '.' | ',' | ' '))
        .collect()
}
