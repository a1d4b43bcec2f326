use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
    body::Body,
};

use tracing::{debug, warn};

use shared_models::auth::{Role, Session, User};
use shared_models::error::AppError;
use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::jwt::validate_token;

/// Pull the bearer token out of the `Authorization` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

/// Validates the bearer token, resolves the caller's [`Session`] from their
/// profile row and stores both the [`User`] and the session in request
/// extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;

    let user = validate_token(&token, &config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;
    let session = resolve_session(&config, &user, &token).await?;

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// Look up the profile row behind a validated token and build the session
/// from it.
pub async fn resolve_session(config: &AppConfig, user: &User, token: &str) -> Result<Session, AppError> {
    let profile = SupabaseClient::new(config)
        .get_profile(&user.id, token)
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?
        .ok_or_else(|| {
            warn!("No profile row for user {}", user.id);
            AppError::Forbidden("No profile is linked to this account".to_string())
        })?;

    let session = Session::from_profile(user, &profile, token)
        .ok_or_else(|| AppError::Forbidden("No application role on this account".to_string()))?;

    debug!("User {} resolved as {}", session.user_id, session.role);
    Ok(session)
}

/// Check the session's role is one of `allowed`.
pub fn require_role(session: &Session, allowed: &[Role]) -> Result<Role, AppError> {
    let role = session.role;

    if allowed.contains(&role) {
        Ok(role)
    } else {
        Err(AppError::Forbidden(format!("Not available to the {} role", role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    use crate::test_utils::TestUser;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        assert_matches!(extract_bearer_token(&headers), Err(AppError::Auth(_)));

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_matches!(extract_bearer_token(&headers), Err(AppError::Auth(_)));

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn require_role_checks_membership() {
        let doctor = TestUser::doctor("doc@example.com").to_session();
        assert_eq!(require_role(&doctor, &[Role::Doctor, Role::Compounder]).unwrap(), Role::Doctor);
        assert_matches!(require_role(&doctor, &[Role::Patient]), Err(AppError::Forbidden(_)));

        let desk = TestUser::compounder("desk@example.com").to_session();
        assert_matches!(require_role(&desk, &[Role::Patient, Role::Doctor]), Err(AppError::Forbidden(_)));
    }
}
