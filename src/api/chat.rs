use reqwest::Method;

use super::ApiClient;
use crate::errors::Result;
use crate::models::{ChatReply, ChatRequest, ChatSession, CreatedSession, SessionSummary};

impl ApiClient {
    /// Sends one user turn (with history) and returns the agent's reply.
    pub async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        self.post("/chat", request).await
    }

    /// Sessions in the order the backend returns them.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        self.get("/chat/sessions").await
    }

    pub async fn create_session(&self) -> Result<CreatedSession> {
        let path = "/chat/sessions";
        self.send(self.request(Method::POST, path), path).await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<ChatSession> {
        self.get(&format!("/chat/sessions/{session_id}")).await
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.delete(&format!("/chat/sessions/{session_id}")).await
    }
}
