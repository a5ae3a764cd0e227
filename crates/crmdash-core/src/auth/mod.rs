//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionManager`: login, logout and profile fetch over an explicit session
//! - `Session`: the in-memory user/token pair and its authenticated flag
//! - `TokenStore`: durable storage for the bearer token (file, keychain, memory)
//! - `Credentials`: login form input, never persisted

pub mod credentials;
pub mod error;
pub mod manager;
pub mod session;
pub mod store;

pub use credentials::Credentials;
pub use error::{AuthError, StorageError};
pub use manager::SessionManager;
pub use session::{Session, SessionStatus, StoredToken};
pub use store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
