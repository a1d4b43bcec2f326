use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{profile_name, Role, Session};

use crate::models::{LoginRequest, SessionError};

/// Establishes and tears down sessions against GoTrue, resolving the
/// application role from the user's profile.
pub struct SessionService {
    supabase: Arc<SupabaseClient>,
}

impl SessionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Password sign-in for the role picked on the login screen. The
    /// profile's role has to match it; a doctor cannot sign in as a patient.
    pub async fn login(&self, request: &LoginRequest) -> Result<Session, SessionError> {
        if request.has_empty_fields() {
            return Err(SessionError::MissingFields);
        }
        let requested: Role = request.role.parse()?;
        let email = request.email.trim();

        debug!("Signing in {} as {}", email, requested);
        let grant = self.supabase
            .sign_in_with_password(email, &request.password)
            .await
            .map_err(|e| {
                let message = e.to_string();
                if message.starts_with("Authentication error") {
                    SessionError::InvalidCredentials
                } else {
                    SessionError::ExternalService(message)
                }
            })?;

        let access_token = grant
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| SessionError::MalformedResponse("missing access_token".to_string()))?
            .to_string();
        let user_id = grant
            .get("user")
            .and_then(|u| u.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| SessionError::MalformedResponse("missing user id".to_string()))?
            .to_string();
        let expires_at = grant
            .get("expires_in")
            .and_then(Value::as_i64)
            .map(|secs| Utc::now() + Duration::seconds(secs));

        let profile = self.profile(&user_id, &access_token).await?;
        if Role::from_profile(&profile) != Some(requested) {
            warn!("Sign-in for {} rejected: profile role does not match {}", user_id, requested);
            return Err(SessionError::InvalidCredentials);
        }

        info!("User {} signed in as {}", user_id, requested);
        Ok(Session {
            user_id,
            email: Some(email.to_string()),
            name: profile_name(&profile, email),
            role: requested,
            access_token,
            expires_at,
        })
    }

    pub async fn logout(&self, auth_token: &str) -> Result<(), SessionError> {
        self.supabase
            .sign_out(auth_token)
            .await
            .map_err(|e| SessionError::ExternalService(e.to_string()))?;

        info!("Session signed out");
        Ok(())
    }

    async fn profile(&self, user_id: &str, auth_token: &str) -> Result<Value, SessionError> {
        self.supabase
            .get_profile(user_id, auth_token)
            .await
            .map_err(|e| SessionError::ExternalService(e.to_string()))
            .map(|profile| profile.unwrap_or(Value::Null))
    }
}
