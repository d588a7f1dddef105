use actix_web::{http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};

/// Success envelope shared by every route: `{ "status": 201, "response": { ... } }`.
///
/// Errors use the sibling shape `{ "status", "errors" }` rendered by `AppError`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub response: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(status: StatusCode, response: T) -> Self {
        Self {
            status: status.as_u16(),
            response,
        }
    }
}

pub fn respond<T: Serialize>(status: StatusCode, response: T) -> HttpResponse {
    HttpResponse::build(status).json(Envelope::new(status, response))
}
