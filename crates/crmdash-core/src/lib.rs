//! Session core for the CRM dashboard.
//!
//! - `auth`: the session store (`SessionManager`), token storage and credentials
//! - `api`: HTTP client for the CRM REST API
//! - `routes`: the dashboard route table and the guard in front of it
//! - `config`: persisted settings and environment overrides
//!
//! There is no global session: build a `SessionManager` and pass it to
//! whatever needs it.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod routes;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, Credentials, Session, SessionManager, SessionStatus, TokenStore};
pub use config::{Config, StorageBackend};
pub use models::User;
pub use routes::{guard, Route, RouteDecision, NAVIGATION};
