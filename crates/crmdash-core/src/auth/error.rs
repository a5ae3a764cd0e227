use thiserror::Error;

use crate::api::ApiError;

/// Session-level failures surfaced to callers
#[derive(Error, Debug)]
pub enum AuthError {
    /// Login was rejected or could not be completed
    #[error("Login failed: {0}")]
    Authentication(String),

    /// The server no longer accepts the session token; the session has been cleared
    #[error("Session expired - please log in again")]
    SessionExpired,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    /// Turn a failed login call into a message fit for the login form
    pub(crate) fn from_login_failure(err: &ApiError) -> Self {
        let message = match err {
            ApiError::Unauthorized | ApiError::BadRequest(_) => {
                "Invalid username or password".to_string()
            }
            ApiError::NetworkError(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::NetworkError(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            ApiError::InvalidResponse(_) => "Unexpected response from server".to_string(),
            other => other.to_string(),
        };
        AuthError::Authentication(message)
    }
}

/// Failures reading or writing the persisted token
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Token file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token file is corrupt: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}
