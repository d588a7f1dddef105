use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Todo, TodoInput, TodoQuery},
    response::respond,
    state::AppState,
};
use actix_web::{get, http::StatusCode, patch, post, web, HttpResponse};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Retrieves the authenticated user's todos, newest first.
///
/// ## Query Parameters:
/// - `trashed` (optional): `true` for the trash only, `false` to hide it.
///
/// ## Responses:
/// - `200 OK`: `{ todos }`
/// - `401 Unauthorized`: missing or invalid access token
#[get("")]
pub async fn list_todos(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<TodoQuery>,
) -> Result<HttpResponse, AppError> {
    let todos = state.todos.list_for_user(user.0, &query).await?;
    Ok(respond(StatusCode::OK, json!({ "todos": todos })))
}

/// Creates a todo owned by the authenticated user.
///
/// ## Request Body:
/// - `title`: 1 to 200 characters (required)
/// - `content` (optional): up to 2000 characters
///
/// ## Responses:
/// - `201 Created`: `{ todo }`
/// - `400 Bad Request`: per-field validation errors
/// - `401 Unauthorized`: missing or invalid access token
#[post("")]
pub async fn create_todo(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    payload: web::Json<TodoInput>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    let todo = Todo::new(payload.into_inner(), user.0);
    state.todos.insert(&todo).await?;
    log::info!("User {} created todo {}", user.0, todo.id);

    Ok(respond(StatusCode::CREATED, json!({ "todo": todo })))
}

/// Gate for every route addressing a single todo.
///
/// A todo that does not exist and a todo owned by someone else look the same: 404.
pub async fn ensure_todo_exists(
    state: &AppState,
    user: AuthenticatedUser,
    id: Uuid,
) -> Result<Todo, AppError> {
    match state.todos.find_by_id(id).await? {
        Some(todo) if todo.user_id == user.0 => Ok(todo),
        _ => Err(AppError::NotFound),
    }
}

async fn set_trashed(
    state: &AppState,
    user: AuthenticatedUser,
    id: Uuid,
    trashed: bool,
) -> Result<HttpResponse, AppError> {
    ensure_todo_exists(state, user, id).await?;

    let todo = state
        .todos
        .set_trashed(id, trashed)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(respond(StatusCode::ACCEPTED, json!({ "todo": todo })))
}

/// Moves a todo to the trash.
///
/// ## Responses:
/// - `202 Accepted`: `{ todo }` with `trashed: true`
/// - `404 Not Found`: no such todo for this user
#[patch("/{id}/trash")]
pub async fn trash_todo(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    set_trashed(&state, user, id.into_inner(), true).await
}

/// Restores a todo from the trash.
///
/// ## Responses:
/// - `202 Accepted`: `{ todo }` with `trashed: false`
/// - `404 Not Found`: no such todo for this user
#[patch("/{id}/untrash")]
pub async fn untrash_todo(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    set_trashed(&state, user, id.into_inner(), false).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        mail::LogMailer,
        state::StorageBackend,
        store::{MemoryTodoStore, MemoryUserStore, TodoStore},
    };
    use std::sync::Arc;

    fn state() -> AppState {
        let config = Config {
            database_url: None,
            server_port: 8080,
            server_host: "127.0.0.1".into(),
            jwt_secret: "access".into(),
            refresh_token_secret: "refresh".into(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
            cookie_secure: false,
            frontend_url: "http://localhost:3000".into(),
            facebook_graph_url: "http://127.0.0.1:9".into(),
            smtp: None,
            mail_from: "Todo API <noreply@localhost>".into(),
            bcrypt_cost: 4,
        };
        AppState::new(
            config,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryTodoStore::new()),
            Arc::new(LogMailer),
            StorageBackend::Memory,
        )
    }

    #[actix_rt::test]
    async fn test_ensure_todo_exists_hides_foreign_todos() {
        let state = state();
        let owner = AuthenticatedUser(Uuid::new_v4());
        let stranger = AuthenticatedUser(Uuid::new_v4());
        let todo = Todo::new(
            TodoInput {
                title: "Mine".into(),
                content: None,
            },
            owner.0,
        );
        state.todos.insert(&todo).await.unwrap();

        assert_eq!(
            ensure_todo_exists(&state, owner, todo.id).await.unwrap().id,
            todo.id
        );
        assert!(matches!(
            ensure_todo_exists(&state, stranger, todo.id).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            ensure_todo_exists(&state, owner, Uuid::new_v4()).await,
            Err(AppError::NotFound)
        ));
    }

    #[actix_rt::test]
    async fn test_set_trashed_toggles_flag() {
        let state = state();
        let owner = AuthenticatedUser(Uuid::new_v4());
        let todo = Todo::new(
            TodoInput {
                title: "Toggle".into(),
                content: None,
            },
            owner.0,
        );
        state.todos.insert(&todo).await.unwrap();

        let response = set_trashed(&state, owner, todo.id, true).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(state.todos.find_by_id(todo.id).await.unwrap().unwrap().trashed);

        set_trashed(&state, owner, todo.id, false).await.unwrap();
        assert!(!state.todos.find_by_id(todo.id).await.unwrap().unwrap().trashed);
    }
}
