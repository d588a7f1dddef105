use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How long a password reset token stays usable.
pub const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// A user account as stored in the database.
///
/// Secrets (`password_hash` and the single-use tokens) are skipped when serializing,
/// so a `User` can be returned from handlers as-is.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    /// Always trimmed and lower-cased, see [`normalize_email`].
    pub email: String,
    /// `None` for accounts that only ever signed in through Facebook.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub verified: bool,
    #[serde(skip_serializing, default)]
    pub verification_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub reset_password_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub reset_password_expires: Option<DateTime<Utc>>,
    pub facebook_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A fresh, unverified account created by basic registration.
    pub fn new_basic(email: &str, password_hash: String, verification_token: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash: Some(password_hash),
            verified: false,
            verification_token: Some(verification_token),
            reset_password_token: None,
            reset_password_expires: None,
            facebook_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// An account created on first Facebook login. The provider vouches for the email.
    pub fn new_facebook(email: &str, facebook_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash: None,
            verified: true,
            verification_token: None,
            reset_password_token: None,
            reset_password_expires: None,
            facebook_id: Some(facebook_id.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Consumes the verification token.
    pub fn mark_verified(&mut self) {
        self.verified = true;
        self.verification_token = None;
        self.updated_at = Utc::now();
    }

    /// Links a Facebook identity to an existing account.
    pub fn link_facebook(&mut self, facebook_id: &str) {
        self.facebook_id = Some(facebook_id.to_string());
        self.verified = true;
        self.verification_token = None;
        self.updated_at = Utc::now();
    }

    pub fn issue_reset_token(&mut self, token: String) {
        let now = Utc::now();
        self.reset_password_token = Some(token);
        self.reset_password_expires = Some(now + Duration::hours(RESET_TOKEN_TTL_HOURS));
        self.updated_at = now;
    }

    pub fn reset_token_expired(&self, now: DateTime<Utc>) -> bool {
        match self.reset_password_expires {
            Some(expires) => expires <= now,
            None => true,
        }
    }

    /// Stores the new hash and consumes the reset token.
    pub fn set_password(&mut self, password_hash: String) {
        self.password_hash = Some(password_hash);
        self.reset_password_token = None;
        self.reset_password_expires = None;
        // Receiving the reset mail proves ownership of the address.
        self.verified = true;
        self.verification_token = None;
        self.updated_at = Utc::now();
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut user = User::new_basic("Fake@Gmail.com ", "$2b$hash".into(), "verify-me".into());
        user.issue_reset_token("reset-me".into());

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["email"], json!("fake@gmail.com"));
        assert_eq!(value["verified"], json!(false));
        for secret in [
            "password_hash",
            "verification_token",
            "reset_password_token",
            "reset_password_expires",
        ] {
            assert!(value.get(secret).is_none(), "{} leaked", secret);
        }
    }

    #[test]
    fn test_verification_consumes_token() {
        let mut user = User::new_basic("a@b.co", "hash".into(), "token".into());
        user.mark_verified();
        assert!(user.verified);
        assert!(user.verification_token.is_none());
    }

    #[test]
    fn test_reset_token_lifecycle() {
        let mut user = User::new_facebook("a@b.co", "1234");
        assert!(user.verified);
        assert!(user.reset_token_expired(Utc::now()));

        user.issue_reset_token("reset".into());
        assert!(!user.reset_token_expired(Utc::now()));
        assert!(user.reset_token_expired(Utc::now() + Duration::hours(2)));

        user.set_password("new-hash".into());
        assert_eq!(user.password_hash.as_deref(), Some("new-hash"));
        assert!(user.reset_password_token.is_none());
        assert!(user.reset_password_expires.is_none());
    }
}
