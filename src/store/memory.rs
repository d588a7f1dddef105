use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TodoStore, UserStore, EMAIL_TAKEN};
use crate::{
    error::AppError,
    models::{Todo, TodoQuery, User},
};

/// Process-local user storage. Data is lost on restart.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn find_where<F>(&self, predicate: F) -> Result<Option<User>, AppError>
    where
        F: Fn(&User) -> bool + Send,
    {
        let users = self.users.read().await;
        Ok(users.values().find(|user| predicate(user)).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_where(|user| user.email == email).await
    }

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>, AppError> {
        self.find_where(|user| user.verification_token.as_deref() == Some(token))
            .await
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, AppError> {
        self.find_where(|user| user.reset_password_token.as_deref() == Some(token))
            .await
    }

    async fn find_by_facebook_id(&self, facebook_id: &str) -> Result<Option<User>, AppError> {
        self.find_where(|user| user.facebook_id.as_deref() == Some(facebook_id))
            .await
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::conflict("email", EMAIL_TAKEN));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|existing| existing.id != user.id && existing.email == user.email)
        {
            return Err(AppError::conflict("email", EMAIL_TAKEN));
        }
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AppError::NotFound),
        }
    }
}

/// Process-local todo storage. Data is lost on restart.
#[derive(Default)]
pub struct MemoryTodoStore {
    todos: RwLock<HashMap<Uuid, Todo>>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn list_for_user(
        &self,
        user_id: Uuid,
        query: &TodoQuery,
    ) -> Result<Vec<Todo>, AppError> {
        let todos = self.todos.read().await;
        let mut owned: Vec<Todo> = todos
            .values()
            .filter(|todo| todo.user_id == user_id)
            .filter(|todo| query.trashed.map_or(true, |trashed| todo.trashed == trashed))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn insert(&self, todo: &Todo) -> Result<(), AppError> {
        self.todos.write().await.insert(todo.id, todo.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Todo>, AppError> {
        Ok(self.todos.read().await.get(&id).cloned())
    }

    async fn set_trashed(&self, id: Uuid, trashed: bool) -> Result<Option<Todo>, AppError> {
        let mut todos = self.todos.write().await;
        Ok(todos.get_mut(&id).map(|todo| {
            todo.trashed = trashed;
            todo.updated_at = Utc::now();
            todo.clone()
        }))
    }
}
