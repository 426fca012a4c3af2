//! Login, logout, and the internal token validation endpoint.

use axum::{extract::Extension, http::HeaderMap, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error};

use super::{
    password::verify_password,
    principal::{authenticate_token, extract_bearer_token},
    state::AuthState,
    storage::{delete_session, insert_session, lookup_user_by_email},
    token::{sign_hs256, BearerTokenClaims},
    utils::{hash_session_token, normalize_email, now_unix_seconds},
};
use crate::api::{
    error::ApiError,
    handlers::auth::types::{
        LoginRequest, LoginResponse, MessageResponse, ValidateTokenRequest, ValidateTokenResponse,
    },
};

fn bad_credentials() -> ApiError {
    // Same answer for unknown email and wrong password.
    ApiError::Authentication("Incorrect email or password".to_string())
}

#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, bearer token issued", body = LoginResponse),
        (status = 400, description = "Missing payload"),
        (status = 401, description = "Incorrect email or password")
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::Validation(
            "Please provide email and password".to_string(),
        ));
    }

    let Some(user) = lookup_user_by_email(&pool, &email).await? else {
        return Err(bad_credentials());
    };

    if !verify_password(&request.password, &user.password_hash) {
        debug!("password mismatch for {email}");
        return Err(bad_credentials());
    }

    let now = now_unix_seconds();
    let claims = BearerTokenClaims {
        sub: user.id,
        iat: now,
        exp: now + auth_state.config().token_ttl_seconds(),
    };
    let token = sign_hs256(auth_state.config().token_secret(), &claims)
        .map_err(|err| anyhow::anyhow!("failed to sign bearer token: {err}"))?;

    // The raw token goes only to the caller; the store keeps its digest.
    insert_session(&pool, user.id, &hash_session_token(&token)).await?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            status: "success".to_string(),
            token,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    responses(
        (status = 200, description = "Session revoked", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(bearer) = extract_bearer_token(&headers) else {
        return Err(ApiError::Authentication(
            "You are not logged in".to_string(),
        ));
    };

    // Only valid sessions can log out; this also cleans up stale records.
    authenticate_token(&pool, &auth_state, &bearer).await?;

    if let Err(err) = delete_session(&pool, &hash_session_token(&bearer)).await {
        error!("Failed to delete session on logout: {err}");
        return Err(ApiError::Internal(err));
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse::success("Logged out")),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/validate-token",
    request_body = ValidateTokenRequest,
    responses(
        (status = 200, description = "Token validity", body = ValidateTokenResponse),
        (status = 400, description = "Missing payload")
    ),
    tag = "auth"
)]
pub async fn validate_token(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ValidateTokenRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let is_valid = match authenticate_token(&pool, &auth_state, &request.token).await {
        Ok(_) => true,
        Err(ApiError::Authentication(_)) => false,
        // Store failures are surfaced, not reported as "invalid".
        Err(err) => return Err(err),
    };

    Ok((StatusCode::OK, Json(ValidateTokenResponse { is_valid })))
}
