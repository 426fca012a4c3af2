//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub status: String,
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub status: String,
    pub otp_id: Uuid,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub otp_id: Uuid,
    pub otp: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub status: String,
    pub exchange_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub otp_id: Uuid,
    pub exchange_token: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_confirm_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTokenRequest {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTokenResponse {
    pub is_valid: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub status: String,
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn signup_request_uses_camel_case() -> Result<()> {
        let request: SignupRequest = serde_json::from_value(serde_json::json!({
            "name": "A",
            "email": "a@x.com",
            "password": "pw123456",
            "confirmPassword": "pw123456",
        }))?;
        assert_eq!(request.confirm_password, "pw123456");
        Ok(())
    }

    #[test]
    fn forgot_password_response_serializes_otp_id() -> Result<()> {
        let response = ForgotPasswordResponse {
            status: "success".to_string(),
            otp_id: Uuid::nil(),
        };
        let value = serde_json::to_value(&response)?;
        let otp_id = value
            .get("otpId")
            .and_then(serde_json::Value::as_str)
            .context("missing otpId")?;
        assert_eq!(otp_id, Uuid::nil().to_string());
        Ok(())
    }

    #[test]
    fn validate_token_response_uses_is_valid_key() -> Result<()> {
        let value = serde_json::to_value(ValidateTokenResponse { is_valid: true })?;
        assert_eq!(value.get("isValid"), Some(&serde_json::Value::Bool(true)));
        Ok(())
    }

    #[test]
    fn reset_password_request_round_trips() -> Result<()> {
        let request: ResetPasswordRequest = serde_json::from_value(serde_json::json!({
            "otpId": Uuid::nil().to_string(),
            "exchangeToken": "E1",
            "password": "newpass1",
            "confirmPassword": "newpass1",
        }))?;
        assert_eq!(request.exchange_token, "E1");
        assert_eq!(request.password, request.confirm_password);
        Ok(())
    }

    #[test]
    fn message_response_success_helper() {
        let response = MessageResponse::success("done");
        assert_eq!(response.status, "success");
        assert_eq!(response.message, "done");
    }
}
