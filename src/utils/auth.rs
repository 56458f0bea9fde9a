use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token is invalid: {0}")]
    Invalid(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

pub fn create_jwt(user_id: &str, secret: &str, ttl: Duration) -> Result<String, TokenError> {
    let expires_at = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| TokenError::Signing("expiry out of range".to_string()))?;
    create_jwt_with_expiry(user_id, secret, expires_at)
}

pub fn create_jwt_with_expiry(
    user_id: &str,
    secret: &str,
    expires_at: DateTime<Utc>,
) -> Result<String, TokenError> {
    let claims = Claims {
        sub: user_id.to_owned(),
        exp: expires_at.timestamp().max(0) as usize,
        iat: Utc::now().timestamp().max(0) as usize,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Checks signature and expiry. Any externally supplied string yields a
/// definite `Ok` or `Err`.
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Returns `false` for a wrong password and for an unparseable stored hash.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}
