//! API client for the CRM REST API.
//!
//! `ApiClient` knows nothing about session state. It sends what it is given
//! and maps HTTP failures onto `ApiError`; deciding what a failure means for
//! the session is the `SessionManager`'s job.

use std::time::Duration;

use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::auth::Credentials;
use crate::models::User;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL the dashboard talks to when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// HTTP request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const LOGIN_PATH: &str = "auth/login/";
const CURRENT_USER_PATH: &str = "auth/user/";

/// Body returned by a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub user: User,
}

/// API client for the CRM backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client with the default request timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Exchange credentials for an access token and the user's profile
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let url = self.url(LOGIN_PATH);
        debug!(url = %url, username = %credentials.identifier, "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(credentials)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    /// Fetch the profile of the user the token belongs to
    pub async fn fetch_user(&self, token: &str) -> Result<User, ApiError> {
        let url = self.url(CURRENT_USER_PATH);
        debug!(url = %url, "Fetching current user");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    /// GET any CRM resource with this client's token, returned as raw JSON
    pub async fn get_json(&self, path: &str) -> Result<serde_json::Value, ApiError> {
        let url = self.url(path);
        debug!(url = %url, authorized = self.token.is_some(), "Sending GET request");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .headers(self.auth_headers()?)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidResponse("Token is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slashes() {
        let client = ApiClient::new("http://localhost:8000/api/").expect("client builds");
        assert_eq!(client.url("/auth/login/"), "http://localhost:8000/api/auth/login/");
        assert_eq!(client.url("contacts/"), "http://localhost:8000/api/contacts/");

        let client = ApiClient::new(DEFAULT_API_URL).expect("client builds");
        assert_eq!(client.url(CURRENT_USER_PATH), "http://localhost:8000/api/auth/user/");
    }

    #[test]
    fn test_with_token_keeps_base_url() {
        let client = ApiClient::new("http://crm.example/api").expect("client builds");
        let authed = client.with_token("tok1".to_string());
        assert_eq!(authed.base_url(), "http://crm.example/api");

        let headers = authed.auth_headers().expect("valid header");
        assert_eq!(headers[header::AUTHORIZATION], "Bearer tok1");
        assert!(client.auth_headers().expect("empty headers").is_empty());
    }

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"access":"tok1","refresh":"r1","user":{"id":1,"name":"A"}}"#;
        let resp: LoginResponse = serde_json::from_str(json).expect("Failed to parse login JSON");
        assert_eq!(resp.access, "tok1");
        assert_eq!(resp.user.id().as_deref(), Some("1"));
    }

    #[test]
    fn test_login_response_requires_access_token() {
        let json = r#"{"user":{"id":1}}"#;
        assert!(serde_json::from_str::<LoginResponse>(json).is_err());
    }
}
