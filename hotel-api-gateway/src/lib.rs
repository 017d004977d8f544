pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;

pub use handlers::{AppState, app};
