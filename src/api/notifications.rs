use reqwest::Method;
use serde_json::json;

use super::ApiClient;
use crate::errors::Result;
use crate::models::Notification;

impl ApiClient {
    pub async fn notifications(&self) -> Result<Vec<Notification>> {
        self.get("/notifications").await
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<()> {
        let path = format!("/notifications/{notification_id}/read");
        self.send_unit(self.request(Method::PUT, &path).json(&json!({})), &path).await
    }

    pub async fn delete_notification(&self, notification_id: &str) -> Result<()> {
        self.delete(&format!("/notifications/{notification_id}")).await
    }
}
