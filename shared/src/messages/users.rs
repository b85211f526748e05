//! User administration messages

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Account as listed by `/api/auth/users/` and `/api/auth/pending-users/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_approved: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    /// Username, falling back to the email address
    pub fn display_name(&self) -> &str {
        if !self.username.trim().is_empty() {
            return &self.username;
        }
        self.email.as_deref().unwrap_or("")
    }
}
