use crate::api::errors::ApiError;
use crate::ingest::handler::AppState;
use axum::extract::State;
use axum::Json;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Action identifier a purge request must carry.
pub const PURGE_ACTION: &str = "purge_stats";

/// Single-use correlation tokens for the purge action.
///
/// Only the most recently issued token is valid: issuing a new one
/// invalidates its predecessor, and a consumed token cannot be replayed.
#[derive(Default)]
pub struct PurgeTokenStore {
    current: Mutex<Option<String>>,
}

impl PurgeTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token, invalidating any outstanding one.
    pub fn issue(&self) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        *self.current.lock() = Some(token.clone());
        token
    }

    /// Consume a token. Returns true only for the currently valid token,
    /// which is removed so it cannot be used twice.
    pub fn consume(&self, token: &str) -> bool {
        let mut current = self.current.lock();
        if current.as_deref() == Some(token) {
            *current = None;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PurgeTokenResponse {
    pub token: String,
}

/// POST /api/admin/purge-token — Issue a single-use purge correlation token.
pub async fn issue_purge_token(State(state): State<Arc<AppState>>) -> Json<PurgeTokenResponse> {
    Json(PurgeTokenResponse {
        token: state.purge_tokens.issue(),
    })
}

/// Purge request body. Both fields are required; malformed requests are
/// rejected before the store is touched.
#[derive(Debug, Deserialize)]
pub struct PurgeRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub success: bool,
    pub purged: usize,
    pub message: String,
}

/// POST /api/admin/purge — Delete every stored visit, unconditionally and
/// irreversibly. Admin capability is enforced by middleware before this
/// handler runs; the correlation token is validated here.
pub async fn purge_stats(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PurgeRequest>,
) -> Result<Json<PurgeResponse>, ApiError> {
    if payload.action != PURGE_ACTION {
        return Err(ApiError::BadRequest(format!(
            "invalid request: action must be '{PURGE_ACTION}'"
        )));
    }
    if payload.token.is_empty() {
        return Err(ApiError::BadRequest(
            "invalid request: missing purge token".to_string(),
        ));
    }
    if !state.purge_tokens.consume(&payload.token) {
        return Err(ApiError::Unauthorized(
            "invalid or already used purge token".to_string(),
        ));
    }

    let state2 = Arc::clone(&state);
    let purged = tokio::task::spawn_blocking(move || state2.store.purge_all())
        .await
        .map_err(|e| ApiError::Internal(format!("Purge task panicked: {e}")))??;

    tracing::info!(purged, "Visit statistics purged");
    Ok(Json(PurgeResponse {
        success: true,
        purged,
        message: "The page visit statistics data was successfully erased.".to_string(),
    }))
}
