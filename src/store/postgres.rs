use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{TodoStore, UserStore, EMAIL_TAKEN};
use crate::{
    error::AppError,
    models::{Todo, TodoQuery, User},
};

const USER_COLUMNS: &str = "id, email, password_hash, verified, verification_token, \
     reset_password_token, reset_password_expires, facebook_id, created_at, updated_at";

const TODO_COLUMNS: &str = "id, user_id, title, content, trashed, created_at, updated_at";

/// Maps unique violations on `users` to 409 conflicts.
/// Everything else goes through `From<sqlx::Error>`.
fn user_write_error(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            return match db_error.constraint() {
                Some("users_facebook_id_key") => {
                    AppError::conflict("facebook", "Facebook account is already linked")
                }
                _ => AppError::conflict("email", EMAIL_TAKEN),
            };
        }
    }
    AppError::from(error)
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // `column` is always a literal from this file, never user input.
    async fn find_by_text(
        &self,
        column: &'static str,
        value: &str,
    ) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_by_text("email", email).await
    }

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>, AppError> {
        self.find_by_text("verification_token", token).await
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, AppError> {
        self.find_by_text("reset_password_token", token).await
    }

    async fn find_by_facebook_id(&self, facebook_id: &str) -> Result<Option<User>, AppError> {
        self.find_by_text("facebook_id", facebook_id).await
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, verified, verification_token, \
             reset_password_token, reset_password_expires, facebook_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.verified)
        .bind(&user.verification_token)
        .bind(&user.reset_password_token)
        .bind(user.reset_password_expires)
        .bind(&user.facebook_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(user_write_error)?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, password_hash = $3, verified = $4, \
             verification_token = $5, reset_password_token = $6, reset_password_expires = $7, \
             facebook_id = $8, updated_at = $9 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.verified)
        .bind(&user.verification_token)
        .bind(&user.reset_password_token)
        .bind(user.reset_password_expires)
        .bind(&user.facebook_id)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(user_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

pub struct PgTodoStore {
    pool: PgPool,
}

impl PgTodoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn list_for_user(
        &self,
        user_id: Uuid,
        query: &TodoQuery,
    ) -> Result<Vec<Todo>, AppError> {
        let mut sql = format!("SELECT {} FROM todos WHERE user_id = $1", TODO_COLUMNS);
        if query.trashed.is_some() {
            sql.push_str(" AND trashed = $2");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query_builder = sqlx::query_as::<_, Todo>(&sql).bind(user_id);
        if let Some(trashed) = query.trashed {
            query_builder = query_builder.bind(trashed);
        }

        let todos = query_builder.fetch_all(&self.pool).await?;
        Ok(todos)
    }

    async fn insert(&self, todo: &Todo) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO todos (id, user_id, title, content, trashed, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(todo.id)
        .bind(todo.user_id)
        .bind(&todo.title)
        .bind(&todo.content)
        .bind(todo.trashed)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Todo>, AppError> {
        let sql = format!("SELECT {} FROM todos WHERE id = $1", TODO_COLUMNS);
        let todo = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    async fn set_trashed(&self, id: Uuid, trashed: bool) -> Result<Option<Todo>, AppError> {
        let sql = format!(
            "UPDATE todos SET trashed = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            TODO_COLUMNS
        );
        let todo = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(trashed)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }
}
