use serde_json::json;

use super::ApiClient;
use crate::errors::Result;
use crate::models::{AuthenticatedUser, Payment};

impl ApiClient {
    pub async fn fetch_profile(&self) -> Result<AuthenticatedUser> {
        self.get("/user").await
    }

    pub async fn update_profile_name(&self, name: &str) -> Result<AuthenticatedUser> {
        self.put("/user", &json!({ "name": name })).await
    }

    pub async fn payments(&self) -> Result<Vec<Payment>> {
        self.get("/user/payments").await
    }
}
