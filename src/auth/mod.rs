pub mod cookies;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::models::User;

// Re-export necessary items
pub use cookies::{refresh_cookie, removal_cookie, REFRESH_COOKIE};
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
};
pub use token::{generate_opaque_token, Claims, TokenKeys, TokenKind};

lazy_static! {
    static ref HAS_LETTER: Regex = Regex::new(r"[A-Za-z]").unwrap();
    static ref HAS_DIGIT: Regex = Regex::new(r"[0-9]").unwrap();
}

/// bcrypt ignores everything past the first 72 bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// A password must fit bcrypt's input and mix at least one letter and one digit.
fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        let mut error = ValidationError::new("password_length");
        error.message = Some(Cow::from("must be at most 72 bytes"));
        return Err(error);
    }
    if HAS_LETTER.is_match(password) && HAS_DIGIT.is_match(password) {
        return Ok(());
    }
    let mut error = ValidationError::new("password_strength");
    error.message = Some(Cow::from("must contain at least one letter and one digit"));
    Err(error)
}

/// Payload for `POST /users/register/basic`.
///
/// Missing fields deserialize to empty strings so they surface as field errors
/// instead of a generic parse failure.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(
        length(min = 6, message = "must be at least 6 characters"),
        custom = "validate_password_strength"
    )]
    pub password: String,
}

/// Payload for `POST /users/login/basic`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Payload carrying a single token: email verification and Facebook login.
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub token: String,
}

/// Payload for `POST /users/password/forgot`.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

/// Payload for `POST /users/password/reset`.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub token: String,
    #[serde(default)]
    #[validate(
        length(min = 6, message = "must be at least 6 characters"),
        custom = "validate_password_strength"
    )]
    pub password: String,
}

/// Body returned by both login routes: the public user and a short-lived access token.
/// The refresh token travels separately in the `refreshToken` cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Body returned by the refresh route.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub token: String,
}
