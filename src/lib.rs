//! Client for the AI agent marketplace backend: persistent session, REST client,
//! polling reconciliation and the services built on them.

pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod service;
pub mod storage;
pub mod sync;
pub mod view;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use errors::{ClientError, Result};
