use std::sync::Arc;

use axum::{
    extract::{State, Json, Extension},
    http::HeaderMap,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{Session, TokenResponse};
use shared_models::error::AppError;
use shared_utils::extractor::extract_bearer_token;
use shared_utils::jwt::validate_token as validate_jwt;

use crate::models::{LoginRequest, LoginResponse};
use crate::services::SessionService;

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = SessionService::new(&config).login(&request).await?;
    Ok(Json(LoginResponse::from(session)))
}

#[axum::debug_handler]
pub async fn logout(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    SessionService::new(&config).logout(auth.token()).await?;
    Ok(Json(json!({ "success": true })))
}

/// The session the auth middleware resolved from the caller's profile.
#[axum::debug_handler]
pub async fn get_session(
    Extension(session): Extension<Session>,
) -> Json<Session> {
    debug!("Session requested by user: {}", session.user_id);
    Json(session)
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;
    let user = validate_jwt(&token, &config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    Ok(Json(TokenResponse {
        valid: true,
        role: user.role,
        user_id: user.id,
        email: user.email,
    }))
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = extract_bearer_token(&headers)?;
    let valid = validate_jwt(&token, &config.supabase_jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}
