//! Sign-in, sign-up and profile. Every successful auth response replaces the
//! stored user wholesale.

use tracing::{info, warn};

use crate::api::ApiClient;
use crate::errors::{ClientError, Result};
use crate::models::{AuthResponse, AuthenticatedUser, Payment};
use crate::storage::SessionStore;

#[derive(Clone)]
pub struct AccountService {
    api: ApiClient,
}

impl AccountService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn session(&self) -> &SessionStore {
        self.api.session()
    }

    pub fn current_user(&self) -> Option<AuthenticatedUser> {
        self.session().current()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser> {
        require("email", email)?;
        require("password", password)?;
        let response = self.api.login(email.trim(), password).await?;
        self.adopt(response).await
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<AuthenticatedUser> {
        require("name", name)?;
        require("email", email)?;
        require("password", password)?;
        let response = self.api.signup(name.trim(), email.trim(), password).await?;
        self.adopt(response).await
    }

    pub async fn verify_email(&self, email: &str, code: &str) -> Result<AuthenticatedUser> {
        require("code", code)?;
        let response = self.api.verify_email(email.trim(), code.trim()).await?;
        self.adopt(response).await
    }

    pub async fn resend_code(&self, email: &str) -> Result<Option<String>> {
        require("email", email)?;
        Ok(self.api.resend_code(email.trim()).await?.message)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>> {
        require("email", email)?;
        Ok(self.api.forgot_password(email.trim()).await?.message)
    }

    pub async fn reset_password(&self, reset_token: &str, password: &str) -> Result<Option<String>> {
        require("password", password)?;
        Ok(self.api.reset_password(reset_token, password).await?.message)
    }

    /// Fetches the profile. A 401 means the stored token is dead: credentials are
    /// cleared and the caller falls back to guest.
    pub async fn profile(&self) -> Result<AuthenticatedUser> {
        match self.api.fetch_profile().await {
            Ok(user) => Ok(user),
            Err(e) if e.is_unauthorized() => {
                warn!("Profile request unauthorized, clearing stored credentials");
                self.session().clear_async().await?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_name(&self, name: &str) -> Result<AuthenticatedUser> {
        require("name", name)?;
        let mut updated = self.api.update_profile_name(name.trim()).await?;
        if updated.token.is_none() {
            updated.token = self.session().token();
        }
        self.session().save_async(&updated).await?;
        Ok(updated)
    }

    pub async fn payments(&self) -> Result<Vec<Payment>> {
        self.api.payments().await
    }

    /// Forgets the signed-in user. Display preferences stay.
    pub async fn logout(&self) -> Result<()> {
        if let Some(user) = self.current_user() {
            info!("Signing out {}", user.email);
        }
        self.session().clear_async().await
    }

    async fn adopt(&self, response: AuthResponse) -> Result<AuthenticatedUser> {
        let user = response.user;
        if user.token.is_none() {
            // Signup answers before the email is verified; nothing to store yet.
            info!("{} awaiting email verification", user.email);
            return Ok(user);
        }
        self.session().save_async(&user).await?;
        info!("Signed in as {} ({})", user.email, user.role);
        Ok(user)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::empty_field(field));
    }
    Ok(())
}
