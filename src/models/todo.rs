use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Input structure for creating a todo.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TodoInput {
    /// Must be between 1 and 200 characters.
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,

    /// Optional free text, at most 2000 characters.
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub content: Option<String>,
}

/// A todo as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: Uuid,
    /// Owner of the todo.
    pub user_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    /// Soft-delete flag; todos are never physically removed.
    pub trashed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters accepted when listing todos.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TodoQuery {
    /// Only return todos whose `trashed` flag matches.
    pub trashed: Option<bool>,
}

impl Todo {
    /// Creates a new, untrashed `Todo` owned by `user_id`.
    pub fn new(input: TodoInput, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: input.title,
            content: input.content,
            trashed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_todo_creation() {
        let owner = Uuid::new_v4();
        let input = TodoInput {
            title: "Buy milk".to_string(),
            content: Some("Semi-skimmed".to_string()),
        };

        let todo = Todo::new(input, owner);
        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.user_id, owner);
        assert!(!todo.trashed);
        assert_eq!(todo.created_at, todo.updated_at);
    }

    #[test]
    fn test_todo_validation() {
        let valid = TodoInput {
            title: "Valid".to_string(),
            content: None,
        };
        assert!(valid.validate().is_ok());

        let empty_title = TodoInput {
            title: "".to_string(),
            content: None,
        };
        assert!(empty_title.validate().is_err());

        let long_title = TodoInput {
            title: "a".repeat(201),
            content: None,
        };
        assert!(long_title.validate().is_err());

        let long_content = TodoInput {
            title: "Valid".to_string(),
            content: Some("b".repeat(2001)),
        };
        assert!(long_content.validate().is_err());
    }
}
