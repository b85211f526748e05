//! Authentication and account messages

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{SharedError, SharedResult};
use crate::types::{Role, UserProfile};

/// Body of `POST /api/auth/login/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// Build a login request, requiring both fields to be non-empty
    pub fn new(email: &str, password: &str) -> SharedResult<Self> {
        let email = email.trim();
        if email.is_empty() {
            return Err(SharedError::validation("email", "Email is required"));
        }
        if password.is_empty() {
            return Err(SharedError::validation("password", "Password is required"));
        }
        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

/// Body of `POST /api/auth/register/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Sign-up form as typed by the user, before validation
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Option<Role>,
}

impl SignUpForm {
    /// Check that every field is filled and the passwords match
    pub fn validate(&self) -> SharedResult<RegisterRequest> {
        let username = self.username.trim();
        let email = self.email.trim();

        let role = match self.role {
            Some(role) => role,
            None => return Err(SharedError::validation("role", "Please fill in all fields")),
        };

        for (field, value) in [
            ("username", username),
            ("email", email),
            ("password", self.password.as_str()),
            ("confirm_password", self.confirm_password.as_str()),
        ] {
            if value.is_empty() {
                return Err(SharedError::validation(field, "Please fill in all fields"));
            }
        }

        if self.password != self.confirm_password {
            return Err(SharedError::validation("confirm_password", "Passwords do not match"));
        }

        Ok(RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            role,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

impl PasswordResetRequest {
    pub fn new(email: &str) -> SharedResult<Self> {
        let email = email.trim();
        if email.is_empty() {
            return Err(SharedError::validation("email", "Email is required"));
        }
        Ok(Self {
            email: email.to_string(),
        })
    }
}

/// Successful login response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Registration response; accounts awaiting approval come back without a token
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RegisterResponse {
    /// Token and user, when the backend signed the new account in
    pub fn into_auth(self) -> Option<AuthResponse> {
        match (self.token, self.user) {
            (Some(token), Some(user)) => Some(AuthResponse { token, user }),
            _ => None,
        }
    }
}

/// Body of `PUT /api/auth/profile/update/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub current_password: String,
}

impl ProfileUpdateForm {
    /// A new password needs a matching confirmation and the current password
    pub fn validate(&self) -> SharedResult<ProfileUpdateRequest> {
        let changing_password = !self.password.is_empty();

        if changing_password && self.password != self.confirm_password {
            return Err(SharedError::validation("confirm_password", "Passwords do not match"));
        }
        if changing_password && self.current_password.is_empty() {
            return Err(SharedError::validation(
                "current_password",
                "Current password is required to change password",
            ));
        }

        Ok(ProfileUpdateRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: changing_password.then(|| self.password.clone()),
            current_password: changing_password.then(|| self.current_password.clone()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdateResponse {
    pub user: UserProfile,
}

/// Error body returned by the backend on 4xx/5xx responses.
///
/// The backend uses several shapes: `{error}`, `{detail}`, `{message}`,
/// `{non_field_errors: [..]}` or field-keyed arrays such as
/// `{username: ["already taken"]}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub non_field_errors: Vec<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

const NAMED_FIELDS: [(&str, &str); 3] = [("username", "Username"), ("email", "Email"), ("password", "Password")];

impl ErrorBody {
    /// First message per named field
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(field, value)| first_message(value).map(|message| (field.clone(), message)))
            .collect()
    }

    /// Single human-readable message, if the body carried one
    pub fn summary(&self) -> Option<String> {
        if let Some(text) = self.error.as_ref().or(self.detail.as_ref()).or(self.message.as_ref()) {
            return Some(text.clone());
        }
        if let Some(first) = self.non_field_errors.first() {
            return Some(first.clone());
        }

        let field_errors = self.field_errors();
        for (field, label) in NAMED_FIELDS {
            if let Some(message) = field_errors.get(field) {
                return Some(format!("{label}: {message}"));
            }
        }
        field_errors
            .into_iter()
            .next()
            .map(|(field, message)| format!("{field}: {message}"))
    }
}

fn first_message(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(|item| item.as_str().map(str::to_string)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_requires_both_fields() {
        assert_eq!(LoginRequest::new("", "pw").unwrap_err().field(), Some("email"));
        assert_eq!(LoginRequest::new("a@b.c", "").unwrap_err().field(), Some("password"));
        assert_eq!(LoginRequest::new(" a@b.c ", "pw").unwrap().email, "a@b.c");
    }

    #[test]
    fn test_sign_up_form_validation() {
        let mut form = SignUpForm {
            username: "wanjiru".into(),
            email: "w@farm.test".into(),
            password: "secret".into(),
            confirm_password: "secrets".into(),
            role: Some(Role::Worker),
        };
        assert_eq!(form.validate().unwrap_err().field(), Some("confirm_password"));

        form.confirm_password = "secret".into();
        let request = form.validate().unwrap();
        assert_eq!(request.role, Role::Worker);

        form.username = "  ".into();
        assert_eq!(form.validate().unwrap_err().field(), Some("username"));

        form.username = "wanjiru".into();
        form.role = None;
        assert_eq!(form.validate().unwrap_err().field(), Some("role"));
    }

    #[test]
    fn test_profile_update_password_rules() {
        let mut form = ProfileUpdateForm {
            username: "boss".into(),
            email: "boss@farm.test".into(),
            ..Default::default()
        };
        let request = form.validate().unwrap();
        assert_eq!(request.password, None);
        let wire = serde_json::to_value(&request).unwrap();
        assert!(wire.get("password").is_none());

        form.password = "new".into();
        form.confirm_password = "other".into();
        assert_eq!(form.validate().unwrap_err().field(), Some("confirm_password"));

        form.confirm_password = "new".into();
        assert_eq!(form.validate().unwrap_err().field(), Some("current_password"));

        form.current_password = "old".into();
        let request = form.validate().unwrap();
        assert_eq!(request.current_password.as_deref(), Some("old"));
    }

    #[test]
    fn test_error_body_priorities() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail": "Invalid token.", "message": "x"}"#).unwrap();
        assert_eq!(body.summary().as_deref(), Some("Invalid token."));

        let body: ErrorBody =
            serde_json::from_str(r#"{"non_field_errors": ["Unable to log in with provided credentials."]}"#).unwrap();
        assert_eq!(body.summary().as_deref(), Some("Unable to log in with provided credentials."));

        let body: ErrorBody = serde_json::from_str(
            r#"{"email": ["user with this email already exists."], "username": ["A user with that username already exists."]}"#,
        )
        .unwrap();
        assert_eq!(body.summary().as_deref(), Some("Username: A user with that username already exists."));
        assert_eq!(body.field_errors().len(), 2);

        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.summary(), None);
    }

    #[test]
    fn test_register_response_without_token() {
        let response: RegisterResponse =
            serde_json::from_str(r#"{"message": "Registration successful. Await approval."}"#).unwrap();
        assert!(response.into_auth().is_none());
    }
}
