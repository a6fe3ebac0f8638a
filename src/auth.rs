use crate::{AppState, errors::AppError};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const TOKEN_LIFETIME_HOURS: i64 = 1;

/// Bearer token claims. `sub` is the user id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 key pair derived from the configured secret. Built once at startup
/// and shared through `AppState`.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issues an access token for the given user.
    pub fn issue_token(&self, user_id: Uuid, email: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to sign token: {}", e)))
    }

    /// Validates signature and expiry; returns the claims on success.
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid bearer token: {}", e)))
    }
}

/// Hashes a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// Checks a candidate password against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::InternalServerError(format!("Stored hash is malformed: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// The resolved identity a protected handler runs as. Extraction fails with
/// 401 before the handler body executes, so no service call ever sees an
/// unauthenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Expected a bearer token".to_string()))?;

        let claims = state.token_keys.decode_token(token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Malformed token subject".to_string()))?;

        // The token may outlive the account; re-check the directory.
        let user = state
            .user_directory
            .get_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("Unknown or inactive user".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;
    use crate::service::PostService;
    use crate::test_support::{FakeMediaStore, InMemoryPosts, InMemoryUsers};
    use axum::http::Request;

    fn state_with_users(users: InMemoryUsers) -> Arc<AppState> {
        let users = Arc::new(users);
        Arc::new(AppState {
            post_service: PostService::new(
                Arc::new(InMemoryPosts::default()),
                users.clone(),
                Arc::new(FakeMediaStore::succeeding("unused")),
            ),
            user_directory: users,
            token_keys: TokenKeys::from_secret("test-secret"),
        })
    }

    async fn extract_with_token(state: &Arc<AppState>, token: &str) -> Result<AuthUser, AppError> {
        let request = Request::builder()
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        AuthUser::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn extractor_resolves_active_user() {
        let user_id = Uuid::new_v4();
        let state =
            state_with_users(InMemoryUsers::default().with_user(user_id, "alice@example.com"));
        let token = state
            .token_keys
            .issue_token(user_id, "alice@example.com")
            .unwrap();

        let user = extract_with_token(&state, &token).await.unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn extractor_rejects_inactive_user() {
        let user_id = Uuid::new_v4();
        let state = state_with_users(InMemoryUsers::default().with_user_record(UserRecord {
            id: user_id,
            email: "dormant@example.com".to_string(),
            password_hash: "unused".to_string(),
            is_active: false,
        }));
        // A token issued before deactivation must stop working
        let token = state
            .token_keys
            .issue_token(user_id, "dormant@example.com")
            .unwrap();

        let result = extract_with_token(&state, &token).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn extractor_rejects_token_for_unknown_user() {
        let state = state_with_users(InMemoryUsers::default());
        let token = state
            .token_keys
            .issue_token(Uuid::new_v4(), "gone@example.com")
            .unwrap();

        let result = extract_with_token(&state, &token).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn issued_token_decodes_to_same_subject() {
        let keys = TokenKeys::from_secret("test-secret");
        let user_id = Uuid::new_v4();
        let token = keys.issue_token(user_id, "alice@example.com").unwrap();
        let claims = keys.decode_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "alice@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let keys = TokenKeys::from_secret("test-secret");
        let other = TokenKeys::from_secret("different-secret");
        let token = other.issue_token(Uuid::new_v4(), "mallory@example.com").unwrap();
        assert!(keys.decode_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::from_secret("test-secret");
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "late@example.com".to_string(),
            iat: (now - Duration::hours(3)).timestamp(),
            exp: (now - Duration::hours(2)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(keys.decode_token(&token).is_err());
    }

    #[test]
    fn password_verification_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }
}
