//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure leaves the service in the same envelope shape:
//!
//! ```json
//! { "status": 401, "errors": { "form": ["Invalid email or password"] } }
//! ```
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers can simply return
//! `Result<HttpResponse, AppError>` and use `?`. `From` implementations exist for
//! `sqlx::Error`, `validator::ValidationErrors`, `jsonwebtoken::errors::Error`,
//! `bcrypt::BcryptError` and `reqwest::Error`.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use std::collections::BTreeMap;
use validator::ValidationErrors;

/// Field name → list of human readable messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Message used for every not-found response, whatever the resource.
pub const NOT_FOUND_MESSAGE: &str = "Resource not found";

/// Represents all possible errors that can occur within the application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Authentication failed or is missing (HTTP 401).
    /// The message is reported under the `form` key so clients cannot tell which field was wrong.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Malformed request that could not be mapped onto a field (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// Per-field validation failures (HTTP 400).
    #[error("Validation Error: {0:?}")]
    ValidationError(FieldErrors),
    /// The requested resource does not exist or is not visible to the caller (HTTP 404).
    #[error("Not Found")]
    NotFound,
    /// A unique value is already taken (HTTP 409).
    #[error("Conflict on {field}: {message}")]
    Conflict { field: String, message: String },
    /// An upstream provider could not be reached (HTTP 502).
    #[error("Bad Gateway: {0}")]
    BadGateway(String),
    /// Unexpected server-side error (HTTP 500).
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
    /// Error originating from the database driver (HTTP 500).
    #[error("Database Error: {0}")]
    DatabaseError(String),
}

impl AppError {
    /// Shorthand for a conflict on a single field.
    pub fn conflict(field: &str, message: &str) -> Self {
        AppError::Conflict {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    fn field_errors(&self) -> FieldErrors {
        let single = |field: &str, message: &str| {
            let mut errors = FieldErrors::new();
            errors.insert(field.to_string(), vec![message.to_string()]);
            errors
        };

        match self {
            AppError::Unauthorized(msg) => single("form", msg),
            AppError::BadRequest(msg) => single("body", msg),
            AppError::ValidationError(fields) => fields.clone(),
            AppError::NotFound => single("resource", NOT_FOUND_MESSAGE),
            AppError::Conflict { field, message } => single(field, message),
            AppError::BadGateway(_) => single("server", "Upstream provider is unavailable"),
            // Internal details stay in the logs.
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                single("server", "Internal server error")
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    status: u16,
    errors: FieldErrors,
}

/// Converts `AppError` variants into `HttpResponse` objects carrying the error envelope.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }

        HttpResponse::build(status).json(ErrorEnvelope {
            status: status.as_u16(),
            errors: self.field_errors(),
        })
    }
}

/// `RowNotFound` becomes a 404; every other driver error is a 500.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound,
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Flattens `validator` errors into the `field -> [messages]` map.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut fields = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            let messages = field_errors
                .iter()
                .map(|err| match &err.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        AppError::ValidationError(fields)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        log::debug!("Rejected token: {}", error);
        AppError::Unauthorized("Invalid or expired token".into())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// The request URL is dropped: provider URLs can carry access tokens in the query.
impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> AppError {
        AppError::BadGateway(error.without_url().to_string())
    }
}
