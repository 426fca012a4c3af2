//! Authenticated principal extraction: the per-request authentication check.
//!
//! A bearer token grants access only when all four checks pass: a session
//! record exists for its digest, the signature and expiry verify, the signing
//! user still exists, and the token was issued at or after the user's last
//! password change. Any failure answers 401; stale sessions found along the
//! way are deleted as best-effort cleanup.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use super::{
    state::AuthState,
    storage::{delete_session, lookup_session, lookup_user_by_id},
    token,
    utils::{hash_session_token, now_unix_seconds},
};
use crate::api::error::ApiError;

/// Authenticated user context passed to downstream handlers.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

fn unauthorized() -> ApiError {
    ApiError::Authentication("You are not logged in or your session has expired".to_string())
}

/// Resolve the `Authorization: Bearer` header into a principal, or fail 401.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<Principal, ApiError> {
    let Some(bearer) = extract_bearer_token(headers) else {
        return Err(unauthorized());
    };
    authenticate_token(pool, state, &bearer).await
}

/// Run the full authentication check against a raw token.
///
/// Also used by the internal validate-token endpoint, which receives the
/// token in the request body rather than a header.
pub(crate) async fn authenticate_token(
    pool: &PgPool,
    state: &AuthState,
    bearer: &str,
) -> Result<Principal, ApiError> {
    // Revocability first: a signed token without a session record is revoked.
    let token_hash = hash_session_token(bearer);
    let Some(_session) = lookup_session(pool, &token_hash).await? else {
        return Err(unauthorized());
    };

    // Signature and expiry are independent of the store.
    let claims = match token::verify_hs256(
        bearer,
        state.config().token_secret(),
        now_unix_seconds(),
    ) {
        Ok(claims) => claims,
        Err(err) => {
            debug!("token verification failed: {err}");
            cleanup_session(pool, &token_hash).await;
            return Err(unauthorized());
        }
    };

    let Some(user) = lookup_user_by_id(pool, claims.sub).await? else {
        // Signing user is gone; the session record is dead weight.
        cleanup_session(pool, &token_hash).await;
        return Err(unauthorized());
    };

    // A token issued before the most recent password change is stale, which
    // invalidates every pre-change session without enumerating them.
    if claims.iat < user.password_changed_at_unix {
        cleanup_session(pool, &token_hash).await;
        return Err(ApiError::Authentication(
            "Password was changed recently, please log in again".to_string(),
        ));
    }

    Ok(Principal {
        user_id: user.id,
        name: user.name,
        email: user.email,
    })
}

/// Best-effort deletion: a failed delete never masks the 401 outcome.
async fn cleanup_session(pool: &PgPool, token_hash: &[u8]) {
    if let Err(err) = delete_session(pool, token_hash).await {
        error!("Failed to delete stale session: {err}");
    }
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extract_bearer_token_accepts_both_cases() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(
            extract_bearer_token(&headers),
            Some("abc.def.ghi".to_string())
        );

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(extract_bearer_token(&headers), Some("xyz".to_string()));
    }

    #[test]
    fn extract_bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn extract_bearer_token_rejects_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        let headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        assert_eq!(
            unauthorized().status_code(),
            axum::http::StatusCode::UNAUTHORIZED
        );
    }
}
