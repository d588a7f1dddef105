use crate::{config::Config, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes the two JWT flavours so one can never stand in for the other.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Represents the claims encoded within a JWT.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Id of the user the token was issued to.
    pub sub: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
    pub kind: TokenKind,
}

/// Signing material and lifetimes for access and refresh tokens.
///
/// Access and refresh tokens are signed with distinct secrets; the `kind` claim is
/// checked as well, which matters when both secrets happen to be equal.
#[derive(Clone)]
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.refresh_token_secret,
            Duration::minutes(config.access_token_ttl_minutes),
            Duration::days(config.refresh_token_ttl_days),
        )
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn generate_access_token(&self, user_id: Uuid) -> Result<String, AppError> {
        generate(
            user_id,
            TokenKind::Access,
            self.access_ttl,
            &self.access_encoding,
        )
    }

    pub fn generate_refresh_token(&self, user_id: Uuid) -> Result<String, AppError> {
        generate(
            user_id,
            TokenKind::Refresh,
            self.refresh_ttl,
            &self.refresh_encoding,
        )
    }

    /// Verifies signature, expiry and kind of an access token.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AppError> {
        verify(token, TokenKind::Access, &self.access_decoding)
    }

    /// Verifies signature, expiry and kind of a refresh token.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        verify(token, TokenKind::Refresh, &self.refresh_decoding)
    }
}

fn generate(
    user_id: Uuid,
    kind: TokenKind,
    ttl: Duration,
    key: &EncodingKey,
) -> Result<String, AppError> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::InternalServerError("Token expiry overflow".into()))?;

    let claims = Claims {
        sub: user_id,
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
        kind,
    };

    encode(&Header::default(), &claims, key)
        .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

fn verify(token: &str, expected: TokenKind, key: &DecodingKey) -> Result<Claims, AppError> {
    let claims = decode::<Claims>(token, key, &Validation::default())?.claims;
    if claims.kind != expected {
        return Err(AppError::Unauthorized("Invalid or expired token".into()));
    }
    Ok(claims)
}

/// Random single-use token for email verification and password resets.
pub fn generate_opaque_token() -> String {
    Uuid::new_v4().simple().to_string()
}
