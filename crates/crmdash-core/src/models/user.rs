use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Profile record returned by the auth service.
///
/// The backend owns this shape, so it is kept as the raw JSON object. The
/// accessors below only read well-known keys for display and never fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User(
    #[cfg_attr(feature = "ts", ts(type = "Record<string, unknown>"))] Map<String, Value>,
);

impl User {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The user's id, rendered as text whether the backend sent a number or a string
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.str_field("username")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_field("email")
    }

    /// Best available human-readable name.
    /// Prefers "first last", then `name`, then `username`, then `email`.
    pub fn display_name(&self) -> String {
        let first = self.str_field("first_name").unwrap_or("");
        let last = self.str_field("last_name").unwrap_or("");
        let full = format!("{} {}", first, last).trim().to_string();
        if !full.is_empty() {
            return full;
        }

        self.str_field("name")
            .or_else(|| self.username())
            .or_else(|| self.email())
            .map(str::to_string)
            .or_else(|| self.id().map(|id| format!("user #{}", id)))
            .unwrap_or_else(|| "Unknown user".to_string())
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}
