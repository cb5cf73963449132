//! Authentication middleware and extractors for axum.
//!
//! This module provides:
//! - `auth_middleware` - Layer that validates the learner token and injects the user into extensions
//! - `RequireAuth` - Extractor that requires authentication
//! - `RequirePrivileged` - Extractor that requires an instructor or admin
//!
//! The token is read from `Authorization: Bearer <token>` first, then from
//! the session cookie. Validation goes through the `SessionValidator` port.
//!
//! ```text
//! Request → auth_middleware → injects AuthenticatedUser into extensions
//!                                      ↓
//!                              Handler → RequireAuth extractor reads from extensions
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

/// Auth middleware state - the session validator plus the cookie to fall back on.
#[derive(Clone)]
pub struct AuthState {
    pub validator: Arc<dyn SessionValidator>,
    pub cookie_name: Arc<str>,
}

impl AuthState {
    pub fn new(validator: Arc<dyn SessionValidator>, cookie_name: impl Into<Arc<str>>) -> Self {
        Self {
            validator,
            cookie_name: cookie_name.into(),
        }
    }
}

/// Pulls the learner token from the request headers.
///
/// A Bearer header wins over the cookie. Empty values count as absent.
pub(crate) fn extract_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|h| h.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == cookie_name)
            .map(|(_, value)| value.trim())
            .filter(|t| !t.is_empty())
    })
}

/// Authentication middleware.
///
/// 1. Extracts the token from the Authorization header or the session cookie
/// 2. Validates the token using the `SessionValidator` port
/// 3. On success, injects `AuthenticatedUser` into request extensions
/// 4. On missing token, continues without injecting (the webhook and health routes need none)
/// 5. On invalid token, returns 401 Unauthorized
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_token(request.headers(), &auth.cookie_name).map(str::to_owned);

    let Some(token) = token else {
        return next.run(request).await;
    };

    match auth.validator.validate(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            let (status, message) = match &e {
                AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
                AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
                AuthError::ServiceUnavailable(msg) => {
                    tracing::error!("Auth service unavailable: {}", msg);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Authentication service unavailable",
                    )
                }
                _ => (StatusCode::UNAUTHORIZED, "Authentication failed"),
            };

            (
                status,
                Json(serde_json::json!({
                    "error": message,
                    "code": "AUTH_ERROR"
                })),
            )
                .into_response()
        }
    }
}

/// Extractor that requires authentication.
///
/// Returns 401 when the auth middleware did not inject a user.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

impl<S> axum::extract::FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .cloned()
                .map(RequireAuth)
                .ok_or(AuthRejection::Unauthenticated)
        })
    }
}

/// Extractor that requires an instructor or admin.
///
/// 401 without a user, 403 for a student.
#[derive(Debug, Clone)]
pub struct RequirePrivileged(pub AuthenticatedUser);

impl<S> axum::extract::FromRequestParts<S> for RequirePrivileged
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user = parts
                .extensions
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or(AuthRejection::Unauthenticated)?;

            if !user.is_privileged() {
                tracing::debug!(user_id = %user.id, role = %user.role, "Privileged route refused");
                return Err(AuthRejection::Forbidden);
            }
            Ok(RequirePrivileged(user))
        })
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// No valid authentication token was provided.
    Unauthenticated,
    /// The caller's role does not allow this route.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            AuthRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Authentication required",
                "UNAUTHENTICATED",
            ),
            AuthRejection::Forbidden => (
                StatusCode::FORBIDDEN,
                "Insufficient permissions",
                "FORBIDDEN",
            ),
        };

        (
            status,
            Json(serde_json::json!({
                "error": message,
                "code": code
            })),
        )
            .into_response()
    }
}
