//! OTP-driven password reset: Requested -> Verified -> Consumed.
//!
//! Forgot-password creates a short-lived record holding only hashes, emails
//! the plaintext code out-of-band, and returns the record id. Verify-otp
//! trades a correct code for a fresh exchange token (single disclosure).
//! Reset-password consumes the record: with a matching exchange token it
//! rehashes the password, deletes the record, and every pre-reset session
//! becomes stale through the password-change timestamp.

use anyhow::Context;
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    password::{check_password_pair, hash_password, verify_password},
    state::AuthState,
    storage::{
        attach_exchange_token, delete_otp, lookup_otp, lookup_user_by_email, replace_otp,
        update_user_password,
    },
    utils::{generate_exchange_token, generate_otp_code, normalize_email},
};
use crate::api::{
    email::otp_email_body,
    error::ApiError,
    handlers::auth::types::{
        ForgotPasswordRequest, ForgotPasswordResponse, MessageResponse, ResetPasswordRequest,
        VerifyOtpRequest, VerifyOtpResponse,
    },
};

const OTP_EMAIL_SUBJECT: &str = "Your password reset OTP (valid for 5 minutes)";

#[utoipa::path(
    post,
    path = "/api/v1/users/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "OTP emailed, reset flow started", body = ForgotPasswordResponse),
        (status = 404, description = "No user with that email"),
        (status = 500, description = "Email dispatch failed")
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);
    let Some(user) = lookup_user_by_email(&pool, &email).await? else {
        return Err(ApiError::NotFound(
            "There is no user with that email address".to_string(),
        ));
    };

    let code = generate_otp_code();
    let otp_hash = hash_password(&code)?;

    // Supersede any prior flow for this user; at most one stays live.
    let otp_id = replace_otp(&pool, &user.email, &otp_hash).await?;

    // The request awaits the dispatch: a reset must not "succeed" when the
    // user never receives a code.
    auth_state
        .mailer()
        .send(&user.email, OTP_EMAIL_SUBJECT, &otp_email_body(&code))
        .await
        .context("failed to send OTP email")?;

    info!("password reset requested for user {}", user.id);

    Ok((
        StatusCode::OK,
        Json(ForgotPasswordResponse {
            status: "success".to_string(),
            otp_id,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "OTP verified, exchange token issued", body = VerifyOtpResponse),
        (status = 400, description = "Invalid OTP (record kept for retry)"),
        (status = 404, description = "Unknown or expired OTP request")
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let ttl = auth_state.config().otp_ttl_seconds();
    let Some(record) = lookup_otp(&pool, request.otp_id, ttl).await? else {
        return Err(ApiError::NotFound(
            "Invalid or expired OTP request".to_string(),
        ));
    };

    // Mismatch keeps the record usable for retry until the TTL runs out.
    if !verify_password(&request.otp, &record.otp_hash) {
        debug!("otp mismatch for record {}", record.id);
        return Err(ApiError::Validation("Invalid OTP".to_string()));
    }

    let exchange_token = generate_exchange_token()?;
    let exchange_token_hash = hash_password(&exchange_token)?;
    attach_exchange_token(&pool, record.id, &exchange_token_hash).await?;

    // Sole disclosure of the plaintext exchange token.
    Ok((
        StatusCode::OK,
        Json(VerifyOtpResponse {
            status: "success".to_string(),
            exchange_token,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset, all prior sessions invalidated", body = MessageResponse),
        (status = 400, description = "Bad exchange token or password validation error"),
        (status = 404, description = "Unknown or expired OTP request")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let ttl = auth_state.config().otp_ttl_seconds();
    let Some(record) = lookup_otp(&pool, request.otp_id, ttl).await? else {
        return Err(ApiError::NotFound(
            "Invalid or expired OTP request".to_string(),
        ));
    };

    // An absent hash means the Verified step was skipped.
    let Some(exchange_token_hash) = record.exchange_token_hash.as_deref() else {
        return Err(ApiError::Validation(
            "OTP verification required before reset".to_string(),
        ));
    };

    if !verify_password(&request.exchange_token, exchange_token_hash) {
        return Err(ApiError::Validation("Invalid reset request".to_string()));
    }

    check_password_pair(
        &request.password,
        &request.confirm_password,
        auth_state.config().min_password_length(),
    )
    .map_err(ApiError::Validation)?;

    let Some(user) = lookup_user_by_email(&pool, &record.user_email).await? else {
        return Err(ApiError::NotFound(
            "There is no user with that email address".to_string(),
        ));
    };

    let password_hash = hash_password(&request.password)?;
    update_user_password(&pool, user.id, &password_hash).await?;

    // One-time use; existing sessions go stale via the timestamp comparison.
    delete_otp(&pool, record.id).await?;

    info!("password reset completed for user {}", user.id);

    Ok((
        StatusCode::OK,
        Json(MessageResponse::success(
            "Password reset, please log in again",
        )),
    ))
}
