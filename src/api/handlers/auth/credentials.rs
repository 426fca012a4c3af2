//! Signup and the authenticated change-password path.

use axum::{extract::Extension, http::HeaderMap, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use super::{
    password::{check_password_pair, hash_password, verify_password},
    principal::require_auth,
    state::AuthState,
    storage::{insert_user, lookup_user_by_id, update_user_password, SignupOutcome},
    utils::{normalize_email, valid_email},
};
use crate::api::{
    error::ApiError,
    handlers::auth::types::{ChangePasswordRequest, MessageResponse, SignupRequest},
};

#[utoipa::path(
    post,
    path = "/api/v1/users/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn signup(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SignupRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    if request.name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Missing required field: name".to_string(),
        ));
    }

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(ApiError::Validation(
            "Please provide a valid email".to_string(),
        ));
    }

    // Confirmation is checked before hashing and never persisted.
    check_password_pair(
        &request.password,
        &request.confirm_password,
        auth_state.config().min_password_length(),
    )
    .map_err(ApiError::Validation)?;

    let password_hash = hash_password(&request.password)?;

    match insert_user(&pool, request.name.trim(), &email, &password_hash).await? {
        SignupOutcome::Created(user_id) => {
            info!("user created: {user_id}");
            Ok((
                StatusCode::CREATED,
                Json(MessageResponse::success("User created")),
            ))
        }
        SignupOutcome::Conflict => Err(ApiError::Conflict(
            "Email already registered".to_string(),
        )),
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/update-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated, all prior sessions invalidated", body = MessageResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing/invalid session or wrong current password")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn change_password(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    // Re-fetch for the stored hash; the principal never carries it.
    let Some(user) = lookup_user_by_id(&pool, principal.user_id).await? else {
        return Err(ApiError::Authentication(
            "You are not logged in or your session has expired".to_string(),
        ));
    };

    if !verify_password(&request.current_password, &user.password_hash) {
        return Err(ApiError::Authentication(
            "Your current password is wrong".to_string(),
        ));
    }

    check_password_pair(
        &request.new_password,
        &request.new_confirm_password,
        auth_state.config().min_password_length(),
    )
    .map_err(ApiError::Validation)?;

    let password_hash = hash_password(&request.new_password)?;

    // Bumping password_changed_at makes every outstanding token stale,
    // including the one used for this request.
    update_user_password(&pool, user.id, &password_hash).await?;

    info!("password changed for user {}", user.id);

    Ok((
        StatusCode::OK,
        Json(MessageResponse::success(
            "Password updated, please log in again",
        )),
    ))
}
