//! Authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};

use common::{AppError, AppResult};
use domain::{Role, BEARER_TOKEN_PREFIX};

use crate::state::AppState;

/// Current authenticated user extracted from the session token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Identity provider user ID
    pub id: String,
    /// May be empty when the session token carries no email claim
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    /// Check if user has admin role.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Check if user has admin privileges.
pub fn require_admin(user: &CurrentUser) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Admins and instructors.
pub fn require_staff(user: &CurrentUser) -> AppResult<()> {
    if user.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Authentication middleware that validates session tokens.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&request)?;

    // Verify token via identity-service
    let identity = state
        .identity_client
        .verify_token(&token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let current_user = CurrentUser {
        id: identity.user_id,
        email: identity.email,
        role: identity.role,
    };

    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

/// Extract bearer token from Authorization header.
fn extract_token(request: &Request<Body>) -> AppResult<String> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    auth_header
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/classes");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        let token = extract_token(&request_with(Some("Bearer abc.def.ghi"))).unwrap();
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        assert!(extract_token(&request_with(None)).is_err());
        assert!(extract_token(&request_with(Some("Basic dXNlcjpwYXNz"))).is_err());
        assert!(extract_token(&request_with(Some("Bearer   "))).is_err());
    }

    #[test]
    fn test_role_guards() {
        let user = |role| CurrentUser {
            id: "user_1".to_string(),
            email: String::new(),
            role,
        };
        assert!(require_admin(&user(Role::Admin)).is_ok());
        assert!(require_admin(&user(Role::Instructor)).is_err());
        assert!(require_staff(&user(Role::Instructor)).is_ok());
        assert!(require_staff(&user(Role::Student)).is_err());
    }
}
