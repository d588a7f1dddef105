pub mod todo;
pub mod user;

pub use todo::{Todo, TodoInput, TodoQuery};
pub use user::{normalize_email, User};
