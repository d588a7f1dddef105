//! Persistence for users and todos.
//!
//! Handlers only see the [`UserStore`] and [`TodoStore`] traits. The service runs on
//! [`postgres`] when `DATABASE_URL` is configured and falls back to [`memory`] otherwise.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Todo, TodoQuery, User},
};

pub use memory::{MemoryTodoStore, MemoryUserStore};
pub use postgres::{PgTodoStore, PgUserStore};

/// Message reported when registration hits an existing address.
pub const EMAIL_TAKEN: &str = "Email is already registered";

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>, AppError>;

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, AppError>;

    async fn find_by_facebook_id(&self, facebook_id: &str) -> Result<Option<User>, AppError>;

    /// Inserts a new user. Fails with a 409 conflict on `email` when the address is taken.
    async fn insert(&self, user: &User) -> Result<(), AppError>;

    /// Overwrites every mutable column of an existing user.
    async fn update(&self, user: &User) -> Result<(), AppError>;
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Todos owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: Uuid, query: &TodoQuery)
        -> Result<Vec<Todo>, AppError>;

    async fn insert(&self, todo: &Todo) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Todo>, AppError>;

    /// Flips the soft-delete flag and returns the updated record, or `None` if it vanished.
    async fn set_trashed(&self, id: Uuid, trashed: bool) -> Result<Option<Todo>, AppError>;
}
