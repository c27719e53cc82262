//! Thin authenticated REST client for the marketplace backend.
//!
//! One method per endpoint, grouped by area in the submodules. Every request carries
//! `Authorization: Bearer <token>` while the session store holds a token and no
//! Authorization header at all for guests. There is no retry: failures are mapped to
//! [`ClientError`] and handed to the caller.

mod agents;
mod auth;
mod chat;
mod notifications;
mod support;
mod users;
mod vendor_chat;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};
use crate::models::ApiMessage;
use crate::storage::SessionStore;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Starts a request, attaching the bearer token when one is stored.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn dispatch(&self, builder: RequestBuilder, endpoint: &str) -> Result<Response> {
        debug!("→ {endpoint}");
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::network(endpoint, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, endpoint, &body))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, endpoint: &str) -> Result<T> {
        self.dispatch(builder, endpoint)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ClientError::decode(endpoint, e))
    }

    async fn send_unit(&self, builder: RequestBuilder, endpoint: &str) -> Result<()> {
        self.dispatch(builder, endpoint).await.map(|_| ())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::GET, path), path).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, path).json(body), path).await
    }

    async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::PUT, path).json(body), path).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send_unit(self.request(Method::DELETE, path), path).await
    }
}

/// Maps a non-success status to the error taxonomy; the body's `error`/`message`
/// text is kept for display when present.
fn status_error(status: StatusCode, endpoint: &str, body: &str) -> ClientError {
    let endpoint = endpoint.to_string();
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized { endpoint },
        StatusCode::FORBIDDEN => ClientError::Forbidden { endpoint },
        StatusCode::NOT_FOUND => ClientError::NotFound { endpoint },
        _ => {
            let message = serde_json::from_str::<ApiMessage>(body)
                .ok()
                .and_then(|m| m.error.or(m.message))
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        status.canonical_reason().unwrap_or("request failed").to_string()
                    } else {
                        body.trim().to_string()
                    }
                });
            ClientError::Server { status: status.as_u16(), message }
        }
    }
}
