use crate::api::errors::ApiError;
use crate::ingest::handler::AppState;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// SHA-256 digest of an admin token. Comparing digests instead of raw
/// strings keeps the configured secret out of accidental debug output.
pub fn hash_token(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// Middleware guarding administrative routes (stats summary, purge).
///
/// Expects `Authorization: Bearer <token>`. With no admin token configured
/// every request is refused; the original system has no anonymous admin.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.admin_token_hash else {
        return Err(ApiError::Unauthorized(
            "admin token not configured".to_string(),
        ));
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if hash_token(token) == expected => Ok(next.run(request).await),
        Some(_) => Err(ApiError::Unauthorized(
            "invalid admin token".to_string(),
        )),
        None => Err(ApiError::Unauthorized(
            "missing Authorization bearer token".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_deterministic() {
        assert_eq!(hash_token("secret"), hash_token("secret"));
    }

    #[test]
    fn test_hash_token_distinguishes_inputs() {
        assert_ne!(hash_token("secret"), hash_token("Secret"));
        assert_ne!(hash_token(""), hash_token(" "));
    }
}
