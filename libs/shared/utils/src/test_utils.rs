use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, Session, User};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Point the config at a mock server.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn compounder(email: &str) -> Self {
        Self::new(email, "compounder")
    }

    /// The user as the auth middleware would see it: Supabase puts the
    /// application role into user metadata.
    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some("authenticated".to_string()),
            metadata: Some(json!({ "role": self.role })),
            created_at: Some(Utc::now()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        }
    }

    /// The session the middleware builds when the profile row carries this
    /// user's role.
    pub fn to_session(&self) -> Session {
        Session {
            user_id: self.id.clone(),
            email: Some(self.email.clone()),
            name: self.email.clone(),
            role: self.role.parse().unwrap_or(Role::Patient),
            access_token: "test-token".to_string(),
            expires_at: None,
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "user_metadata": { "role": user.role },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }
}

/// Row shapes the Supabase REST API returns for this schema.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn profile_response(user_id: &str, name: &str, role: &str) -> serde_json::Value {
        json!({
            "id": user_id,
            "name": name,
            "avatar": null,
            "role": role
        })
    }

    pub fn token_response(user: &TestUser, access_token: &str) -> serde_json::Value {
        json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-token",
            "user": {
                "id": user.id,
                "email": user.email,
                "user_metadata": { "role": user.role }
            }
        })
    }

    pub fn doctor_response(doctor_id: &str, user_id: &str, name: &str, status: &str) -> serde_json::Value {
        json!({
            "id": doctor_id,
            "user_id": user_id,
            "specialization": "Cardiology",
            "experience": 8,
            "rating": "4.8",
            "consultation_time": 20,
            "status": status,
            "profiles": { "name": name, "avatar": null }
        })
    }

    pub fn appointment_response(
        appointment_id: &str,
        patient_id: &str,
        doctor_id: &str,
        date: &str,
        time_slot: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": appointment_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "date": date,
            "time_slot": time_slot,
            "status": status,
            "queue_position": null,
            "estimated_wait_time": null,
            "symptoms": null,
            "patient": { "name": "John Doe" },
            "doctor": { "id": doctor_id, "profiles": { "name": "Dr. Sarah Johnson" } }
        })
    }

    pub fn queue_item_response(
        item_id: &str,
        appointment_id: &str,
        patient_name: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": item_id,
            "appointment_id": appointment_id,
            "status": status,
            "estimated_time": 15,
            "appointment": {
                "time_slot": "9:00 AM",
                "doctor_id": Uuid::new_v4(),
                "patient": { "name": patient_name }
            }
        })
    }

    pub fn notification_response(notification_id: &str, user_id: &str, read: bool) -> serde_json::Value {
        json!({
            "id": notification_id,
            "user_id": user_id,
            "title": "Appointment Reminder",
            "message": "Your appointment is in 30 minutes",
            "type": "info",
            "created_at": "2026-01-05T09:00:00Z",
            "read": read
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
