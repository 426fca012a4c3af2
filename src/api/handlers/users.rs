//! Authenticated user profile endpoint.

use axum::{extract::Extension, http::HeaderMap, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::{require_auth, AuthState};
use crate::api::error::ApiError;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    pub status: String,
    pub user: UserProfile,
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Authenticated user's profile", body = UserProfileResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;

    Ok((
        StatusCode::OK,
        Json(UserProfileResponse {
            status: "success".to_string(),
            user: UserProfile {
                id: principal.user_id,
                name: principal.name,
                email: principal.email,
            },
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_profile_never_contains_password_fields() -> anyhow::Result<()> {
        let profile = UserProfile {
            id: Uuid::nil(),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
        };
        let value = serde_json::to_value(&profile)?;
        assert!(value.get("password").is_none());
        assert!(value.get("passwordHash").is_none());
        Ok(())
    }
}
