// Library entry point for clinidesk
// Exposes modules for integration tests while main.rs stays the binary entry point

pub mod app;
pub mod audit;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod schema;
pub mod tasks;
pub mod utility;

pub use error::ApiError;
pub use models::AppState;
