use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The three people a session can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Doctor,
    Compounder,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Compounder => "compounder",
        }
    }
}

impl Role {
    /// Role recorded on a `profiles` row. Missing or unknown values give
    /// `None`.
    pub fn from_profile(profile: &Value) -> Option<Role> {
        profile
            .get("role")
            .and_then(Value::as_str)
            .and_then(|role| role.parse().ok())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "compounder" => Ok(Role::Compounder),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// An established session: who is signed in, as what, and the token the
/// entity store expects on their behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub name: String,
    pub role: Role,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Session for an already validated token. The role comes from the
    /// caller's profile row only; user metadata in the token is editable by
    /// the user and is never trusted for it.
    pub fn from_profile(user: &User, profile: &Value, access_token: &str) -> Option<Session> {
        let role = Role::from_profile(profile)?;
        let email = user.email.clone();

        Some(Session {
            user_id: user.id.clone(),
            name: profile_name(profile, email.as_deref().unwrap_or_default()),
            email,
            role,
            access_token: access_token.to_string(),
            expires_at: user.expires_at,
        })
    }
}

/// Display name on a profile row, or `fallback` when it is missing or blank.
pub fn profile_name(profile: &Value, fallback: &str) -> String {
    profile
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}
