use reqwest::Method;
use serde::de::DeserializeOwned;

use super::ApiClient;
use crate::errors::{ClientError, Result};
use crate::models::{
    ContactVendorRequest, Envelope, ThreadKey, VendorInbox, VendorMessageRecord, VendorReplyRequest,
};

impl ApiClient {
    /// Raw records of one user ↔ vendor thread, replies still attached.
    pub async fn conversation_history(&self, thread: &ThreadKey) -> Result<Vec<VendorMessageRecord>> {
        let path = "/messages/history";
        let builder = self.request(Method::GET, path).query(&thread.query()[..]);
        open(self.send(builder, path).await?, path)
    }

    pub async fn clear_conversation_history(&self, thread: &ThreadKey) -> Result<()> {
        let path = "/messages/history";
        let builder = self.request(Method::DELETE, path).query(&thread.query()[..]);
        check(self.send(builder, path).await?, path)
    }

    pub async fn contact_vendor(&self, request: &ContactVendorRequest) -> Result<()> {
        let path = "/messages/contact-vendor";
        check(self.post(path, request).await?, path)
    }

    pub async fn send_to_user(&self, request: &VendorReplyRequest) -> Result<()> {
        let path = "/messages/send-to-user";
        check(self.post(path, request).await?, path)
    }

    pub async fn user_messages(&self, user_id: &str) -> Result<Vec<VendorMessageRecord>> {
        let path = format!("/messages/user/{user_id}");
        open(self.get(&path).await?, &path)
    }

    pub async fn vendor_messages(&self, vendor_id: &str) -> Result<Vec<VendorMessageRecord>> {
        let path = format!("/messages/vendor/{vendor_id}");
        let inbox: VendorInbox = open(self.get(&path).await?, &path)?;
        Ok(inbox.messages)
    }

    /// Admin only.
    pub async fn all_vendor_chats(&self) -> Result<Vec<VendorMessageRecord>> {
        let path = "/messages/all";
        open(self.get(path).await?, path)
    }
}

fn open<T: DeserializeOwned>(envelope: Envelope<T>, endpoint: &str) -> Result<T> {
    match envelope {
        Envelope { success: true, data: Some(data) } => Ok(data),
        _ => Err(ClientError::Unexpected(format!("{endpoint} reported failure"))),
    }
}

fn check(envelope: Envelope<serde_json::Value>, endpoint: &str) -> Result<()> {
    if envelope.success {
        Ok(())
    } else {
        Err(ClientError::Unexpected(format!("{endpoint} reported failure")))
    }
}
