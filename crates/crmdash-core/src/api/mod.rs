//! REST API client module for the CRM backend.
//!
//! This module provides the `ApiClient` for the two auth endpoints the
//! session depends on (`POST auth/login/`, `GET auth/user/`) and for
//! bearer-authorized reads against the rest of the CRM API.

pub mod client;
pub mod error;

pub use client::{ApiClient, LoginResponse, DEFAULT_API_URL};
pub use error::ApiError;
