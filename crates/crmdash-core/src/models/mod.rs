//! Data models for the CRM session.
//!
//! - `User`: the profile record returned by the auth service, passed through as-is

pub mod user;

pub use user::User;
