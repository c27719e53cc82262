use serde_json::json;

use super::ApiClient;
use crate::errors::Result;
use crate::models::{ApiMessage, AuthResponse, LoginRequest, SignupRequest, VerifyEmailRequest};

impl ApiClient {
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let body = LoginRequest { email: email.to_string(), password: password.to_string() };
        self.post("/auth/login", &body).await
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let body = SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("/auth/signup", &body).await
    }

    /// The path keeps the backend's spelling.
    pub async fn verify_email(&self, email: &str, code: &str) -> Result<AuthResponse> {
        let body = VerifyEmailRequest { code: code.to_string(), email: email.to_string() };
        self.post("/email_varification", &body).await
    }

    pub async fn resend_code(&self, email: &str) -> Result<ApiMessage> {
        self.post("/auth/resend-code", &json!({ "email": email })).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<ApiMessage> {
        self.post("/auth/forgot-password", &json!({ "email": email })).await
    }

    pub async fn reset_password(&self, reset_token: &str, password: &str) -> Result<ApiMessage> {
        self.post(
            &format!("/auth/reset-password/{reset_token}"),
            &json!({ "password": password }),
        )
        .await
    }
}
