#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use todo_api::{
    config::Config,
    mail::{Email, Mailer},
    state::StorageBackend,
    store::{MemoryTodoStore, MemoryUserStore},
    AppError, AppState,
};

pub const PASSWORD: &str = "Password123";

/// Collects outgoing mail so tests can follow verification and reset links.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub fn test_config(facebook_graph_url: &str) -> Config {
    Config {
        database_url: None,
        server_port: 8080,
        server_host: "127.0.0.1".into(),
        jwt_secret: "integration-access-secret".into(),
        refresh_token_secret: "integration-refresh-secret".into(),
        access_token_ttl_minutes: 15,
        refresh_token_ttl_days: 7,
        cookie_secure: false,
        frontend_url: "http://localhost:3000".into(),
        facebook_graph_url: facebook_graph_url.into(),
        smtp: None,
        mail_from: "Todo API <noreply@localhost>".into(),
        // Lowest cost bcrypt accepts, keeps the suite fast.
        bcrypt_cost: 4,
    }
}

/// Application state over in-memory stores, with handles kept for direct inspection.
pub struct TestContext {
    pub state: web::Data<AppState>,
    pub users: Arc<MemoryUserStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestContext {
    pub fn new() -> Self {
        // Nothing listens on the discard port; Facebook tests pass a mock server instead.
        Self::with_facebook("http://127.0.0.1:9")
    }

    pub fn with_facebook(facebook_graph_url: &str) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let users = Arc::new(MemoryUserStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(
            test_config(facebook_graph_url),
            users.clone(),
            Arc::new(MemoryTodoStore::new()),
            mailer.clone(),
            StorageBackend::Memory,
        );

        Self {
            state: web::Data::new(state),
            users,
            mailer,
        }
    }
}

/// Builds the service the way `main.rs` mounts it, minus CORS and request logging.
#[macro_export]
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.state.clone())
                .service(todo_api::routes::health::health)
                .service(actix_web::web::scope("/api").configure(todo_api::routes::config)),
        )
        .await
    };
}

/// Registers, verifies and logs in `email`, returning the access token.
#[macro_export]
macro_rules! signed_in_user {
    ($app:expr, $ctx:expr, $email:expr) => {{
        use todo_api::store::UserStore;

        let req = actix_web::test::TestRequest::post()
            .uri("/api/v1/users/register/basic")
            .set_json(serde_json::json!({ "email": $email, "password": common::PASSWORD }))
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);

        let token = $ctx
            .users
            .find_by_email($email)
            .await
            .unwrap()
            .and_then(|user| user.verification_token)
            .expect("registration should leave a verification token");
        let req = actix_web::test::TestRequest::post()
            .uri("/api/v1/users/verify")
            .set_json(serde_json::json!({ "token": token }))
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::ACCEPTED);

        let req = actix_web::test::TestRequest::post()
            .uri("/api/v1/users/login/basic")
            .set_json(serde_json::json!({ "email": $email, "password": common::PASSWORD }))
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        body["response"]["token"]
            .as_str()
            .expect("login should return an access token")
            .to_string()
    }};
}

pub fn credentials(email: &str, password: &str) -> Value {
    json!({ "email": email, "password": password })
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
