use actix_web::{get, http::StatusCode, web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::{response::respond, state::AppState};

/// Health check endpoint
///
/// Reports the storage backend in use and the current server time.
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    respond(
        StatusCode::OK,
        json!({
            "storage": state.storage,
            "timestamp": Utc::now()
        }),
    )
}
