//! HS256 JWT session validator.
//!
//! Learner tokens are signed by the platform's auth service with a shared
//! secret. The subject is read from `sub`, falling back to the legacy `id`
//! claim; `role` defaults to student when absent.

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::foundation::{AuthError, AuthenticatedUser, Role, UserId};
use crate::ports::SessionValidator;

#[derive(Debug, Deserialize)]
struct LearnerClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[allow(dead_code)]
    exp: u64,
    #[serde(default)]
    role: Option<String>,
}

pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    fn user_from_claims(claims: LearnerClaims) -> Result<AuthenticatedUser, AuthError> {
        let subject = claims
            .sub
            .or(claims.id)
            .ok_or(AuthError::InvalidToken)?;
        let id = UserId::new(subject).map_err(|_| AuthError::InvalidToken)?;
        let role = match claims.role.as_deref() {
            Some(raw) => raw.parse::<Role>()?,
            None => Role::default(),
        };
        Ok(AuthenticatedUser::new(id, role))
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<LearnerClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::debug!(error = %e, "Token validation failed");
                    AuthError::InvalidToken
                }
            },
        )?;

        Self::user_from_claims(data.claims)
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-jwt-secret-with-enough-length";

    fn validator() -> JwtSessionValidator {
        JwtSessionValidator::new(&SecretString::new(SECRET.to_string()))
    }

    fn token(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[tokio::test]
    async fn valid_token_yields_student_by_default() {
        let t = token(json!({ "sub": "learner-1", "exp": in_one_hour() }), SECRET);

        let user = validator().validate(&t).await.unwrap();

        assert_eq!(user.id.as_str(), "learner-1");
        assert_eq!(user.role, Role::Student);
    }

    #[tokio::test]
    async fn legacy_id_claim_is_accepted() {
        let t = token(
            json!({ "id": "learner-2", "exp": in_one_hour(), "role": "instructor" }),
            SECRET,
        );

        let user = validator().validate(&t).await.unwrap();

        assert_eq!(user.id.as_str(), "learner-2");
        assert!(user.is_privileged());
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let t = token(
            json!({ "sub": "learner-1", "exp": chrono::Utc::now().timestamp() - 3600 }),
            SECRET,
        );

        assert_eq!(validator().validate(&t).await.unwrap_err(), AuthError::TokenExpired);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_invalid() {
        let t = token(json!({ "sub": "learner-1", "exp": in_one_hour() }), "another-secret");

        assert_eq!(validator().validate(&t).await.unwrap_err(), AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn token_without_subject_is_invalid() {
        let t = token(json!({ "exp": in_one_hour() }), SECRET);

        assert_eq!(validator().validate(&t).await.unwrap_err(), AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn unknown_role_is_invalid() {
        let t = token(
            json!({ "sub": "learner-1", "exp": in_one_hour(), "role": "superuser" }),
            SECRET,
        );

        assert_eq!(validator().validate(&t).await.unwrap_err(), AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        assert_eq!(
            validator().validate("not.a.jwt").await.unwrap_err(),
            AuthError::InvalidToken
        );
    }
}
