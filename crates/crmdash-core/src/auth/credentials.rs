use std::fmt;

use serde::Serialize;

/// Login form input. Sent to the auth endpoint and then dropped; it is never
/// written to storage and its secret never appears in logs.
#[derive(Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "username")]
    pub identifier: String,
    #[serde(rename = "password")]
    secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Both fields filled in
    pub fn is_complete(&self) -> bool {
        !self.identifier.trim().is_empty() && !self.secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_backend_field_names() {
        let creds = Credentials::new("a", "bad");
        let json = serde_json::to_value(&creds).expect("serialize");
        assert_eq!(json, serde_json::json!({"username": "a", "password": "bad"}));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("alice", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_is_complete() {
        assert!(Credentials::new("a", "b").is_complete());
        assert!(!Credentials::new("", "b").is_complete());
        assert!(!Credentials::new("   ", "b").is_complete());
        assert!(!Credentials::new("a", "").is_complete());
    }
}
