pub mod health;
pub mod todos;
pub mod users;

use actix_web::{error, web};

use crate::{auth::AuthMiddleware, error::AppError};

/// Extractor failures (bad JSON, bad query string, bad path segment) rendered in the
/// same envelope as every other error.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err: error::JsonPayloadError, _req| {
            AppError::BadRequest(err.to_string()).into()
        }),
    )
    .app_data(
        web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _req| {
            AppError::BadRequest(err.to_string()).into()
        }),
    )
    .app_data(
        // A malformed id can never match a todo.
        web::PathConfig::default().error_handler(|_err: error::PathError, _req| {
            AppError::NotFound.into()
        }),
    );
}

/// Routes below `/api`. The health check is mounted separately at the root.
pub fn config(cfg: &mut web::ServiceConfig) {
    extractor_configs(cfg);

    cfg.service(
        web::scope("/v1")
            .service(
                web::scope("/users")
                    .service(users::register_basic)
                    .service(users::verify_email)
                    .service(users::login_basic)
                    .service(users::login_facebook)
                    .service(users::refresh_token)
                    .service(users::logout)
                    .service(users::forgot_password)
                    .service(users::reset_password),
            )
            .service(
                web::scope("/todos")
                    .wrap(AuthMiddleware)
                    .service(todos::list_todos)
                    .service(todos::create_todo)
                    .service(todos::trash_todo)
                    .service(todos::untrash_todo),
            ),
    )
    // Clients log out through the unversioned path.
    .service(web::scope("/users").service(users::logout));
}
