use reqwest::Method;
use serde_json::json;

use super::ApiClient;
use crate::errors::Result;
use crate::models::{Agent, AgentDraft, ApiMessage};

impl ApiClient {
    /// Public marketplace listing; works for guests.
    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        self.get("/agents").await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.get(&format!("/agents/{agent_id}")).await
    }

    /// Agents owned by the signed-in vendor/admin.
    pub async fn my_agents(&self) -> Result<Vec<Agent>> {
        self.get("/agents/me").await
    }

    /// Agents a user has subscribed to.
    pub async fn user_agents(&self, user_id: &str) -> Result<Vec<Agent>> {
        self.post("/agents/get_my_agents", &json!({ "userId": user_id })).await
    }

    pub async fn buy_agent(&self, agent_id: &str, user_id: &str) -> Result<ApiMessage> {
        self.post(&format!("/agents/buy/{agent_id}"), &json!({ "userId": user_id })).await
    }

    pub async fn create_agent(&self, draft: &AgentDraft) -> Result<Agent> {
        self.post("/agents", draft).await
    }

    pub async fn update_agent(&self, agent_id: &str, draft: &AgentDraft) -> Result<Agent> {
        self.put(&format!("/agents/{agent_id}"), draft).await
    }

    pub async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        self.delete(&format!("/agents/{agent_id}")).await
    }

    pub async fn submit_for_review(&self, agent_id: &str) -> Result<Agent> {
        let path = format!("/agents/{agent_id}/submit-review");
        self.send(self.request(Method::POST, &path), &path).await
    }

    pub async fn approve_agent(&self, agent_id: &str, message: &str) -> Result<Agent> {
        self.post(&format!("/agents/{agent_id}/approve"), &json!({ "message": message })).await
    }

    pub async fn reject_agent(&self, agent_id: &str, reason: &str) -> Result<Agent> {
        self.post(&format!("/agents/{agent_id}/reject"), &json!({ "reason": reason })).await
    }
}
