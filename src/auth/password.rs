use crate::error::AppError;
use actix_web::web;
use bcrypt::{hash, verify};

/// Hashes `password` with bcrypt at the given cost (`bcrypt::DEFAULT_COST` in production).
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}

/// Runs [`hash_password`] on actix's blocking thread pool so workers stay responsive.
pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String, AppError> {
    web::block(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
}

/// Runs [`verify_password`] on actix's blocking thread pool.
pub async fn verify_password_blocking(
    password: String,
    hashed_password: String,
) -> Result<bool, AppError> {
    web::block(move || verify_password(&password, &hashed_password))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_password_hashing_and_verification() {
        let password = "fake1234";
        let hashed = hash_password(password, TEST_COST).unwrap();

        assert_ne!(hashed, password);
        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("fke1234", &hashed).unwrap());
    }

    #[actix_rt::test]
    async fn test_blocking_variants() {
        let hashed = hash_password_blocking("fake1234".into(), TEST_COST).await.unwrap();
        assert!(verify_password_blocking("fake1234".into(), hashed.clone()).await.unwrap());
        assert!(!verify_password_blocking("fake123".into(), hashed).await.unwrap());
    }

    #[test]
    fn test_verify_with_invalid_hash() {
        match verify_password("fake1234", "invalidhashformat") {
            Err(AppError::InternalServerError(msg)) => {
                assert!(msg.contains("Failed to verify password"));
            }
            // Some bcrypt versions report a malformed hash as a plain mismatch.
            Ok(false) => {}
            Ok(true) => panic!("Password verification should fail for invalid hash format"),
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }
}
