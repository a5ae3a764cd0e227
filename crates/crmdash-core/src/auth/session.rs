use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;

/// The two states of the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum SessionStatus {
    Unauthenticated,
    Authenticated,
}

/// In-memory view of the current user and their access token.
///
/// Fields are private so `is_authenticated` can only be true when both a
/// user and a token are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Session {
    user: Option<User>,
    token: Option<String>,
    is_authenticated: bool,
}

impl Session {
    /// No user, no token
    pub fn empty() -> Self {
        Self::default()
    }

    /// A token loaded from storage that has not been checked against the server yet
    pub fn with_token(token: String) -> Self {
        Self {
            user: None,
            token: Some(token),
            is_authenticated: false,
        }
    }

    pub fn authenticated(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            is_authenticated: true,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Get the bearer token, if one is held
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_authenticated {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        }
    }
}

/// A token as held by durable storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    /// When the token was written; unknown for backends that only hold the string
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl StoredToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            saved_at: Some(Utc::now()),
        }
    }

    /// A token whose write time the backend cannot tell us
    pub fn undated(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            saved_at: None,
        }
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.saved_at.map(|at| (Utc::now() - at).num_minutes())
    }

    pub fn age_display(&self) -> String {
        let Some(minutes) = self.age_minutes() else {
            return "unknown".to_string();
        };
        if minutes < 1 {
            // Negative means clock skew; treat it as fresh
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample_user() -> User {
        serde_json::from_value(json!({"id": 1, "name": "A"})).expect("user JSON")
    }

    #[test]
    fn test_empty_session() {
        let session = Session::empty();
        assert!(session.user().is_none());
        assert!(session.token().is_none());
        assert!(!session.is_authenticated());
        assert_eq!(session.status(), SessionStatus::Unauthenticated);
        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_token_alone_is_not_authenticated() {
        let session = Session::with_token("tok1".to_string());
        assert_eq!(session.token(), Some("tok1"));
        assert!(session.user().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_authenticated_session() {
        let session = Session::authenticated(sample_user(), "tok1".to_string());
        assert_eq!(session.status(), SessionStatus::Authenticated);
        assert_eq!(session.token(), Some("tok1"));
        assert_eq!(session.user(), Some(&sample_user()));
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let json = serde_json::to_value(Session::authenticated(sample_user(), "tok1".into()))
            .expect("serialize");
        assert_eq!(
            json,
            json!({"user": {"id": 1, "name": "A"}, "token": "tok1", "isAuthenticated": true})
        );
        let json = serde_json::to_value(Session::empty()).expect("serialize");
        assert_eq!(json, json!({"user": null, "token": null, "isAuthenticated": false}));
    }

    #[test]
    fn test_stored_token_age_display() {
        assert_eq!(StoredToken::new("t").age_display(), "just now");
        assert_eq!(StoredToken::undated("t").age_display(), "unknown");

        let mut old = StoredToken::new("t");
        old.saved_at = Some(Utc::now() - Duration::minutes(95));
        assert_eq!(old.age_display(), "2h ago");

        old.saved_at = Some(Utc::now() - Duration::days(3));
        assert_eq!(old.age_display(), "3d ago");
    }

    #[test]
    fn test_stored_token_without_timestamp_parses() {
        let stored: StoredToken = serde_json::from_str(r#"{"token":"tok1"}"#).expect("parse");
        assert_eq!(stored, StoredToken::undated("tok1"));
    }
}
