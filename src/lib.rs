#![doc = "The `todo_api` library crate."]
#![doc = ""]
#![doc = "Accounts (basic and Facebook login, email verification, password recovery,"]
#![doc = "refresh tokens) and per-user todo lists behind a JSON REST API."]
#![doc = "The binary (`main.rs`) wires these modules into an actix-web server;"]
#![doc = "integration tests build the same `App` around in-memory stores."]

pub mod auth;
pub mod config;
pub mod error;
pub mod facebook;
pub mod mail;
pub mod models;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
