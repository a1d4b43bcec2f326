use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::auth::{Session, UnknownRole};
use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// The role the user picked on the sign-in screen.
    #[serde(default)]
    pub role: String,
}

impl LoginRequest {
    pub fn has_empty_fields(&self) -> bool {
        self.email.trim().is_empty() || self.password.is_empty() || self.role.trim().is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub session: Option<Session>,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        Self {
            success: true,
            session: Some(session),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),

    #[error("Auth service error: {0}")]
    ExternalService(String),

    #[error("Malformed auth response: {0}")]
    MalformedResponse(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::MissingFields => AppError::ValidationError(e.to_string()),
            SessionError::InvalidCredentials => AppError::Auth(e.to_string()),
            SessionError::UnknownRole(_) => AppError::BadRequest(e.to_string()),
            SessionError::ExternalService(msg) => AppError::ExternalService(msg),
            SessionError::MalformedResponse(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str, role: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn any_blank_field_counts_as_missing() {
        assert!(request("", "secret", "patient").has_empty_fields());
        assert!(request("a@b.com", "", "patient").has_empty_fields());
        assert!(request("a@b.com", "secret", "  ").has_empty_fields());
        assert!(!request("a@b.com", "secret", "doctor").has_empty_fields());
    }

    #[test]
    fn errors_map_to_http_errors() {
        assert!(matches!(AppError::from(SessionError::MissingFields), AppError::ValidationError(msg) if msg == "Please fill in all fields"));
        assert!(matches!(AppError::from(SessionError::InvalidCredentials), AppError::Auth(msg) if msg == "Invalid credentials"));
        assert!(matches!(
            AppError::from(SessionError::UnknownRole(UnknownRole("admin".to_string()))),
            AppError::BadRequest(_)
        ));
    }
}
