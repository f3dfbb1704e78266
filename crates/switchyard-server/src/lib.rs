// ABOUTME: HTTP server for switchyard, providing the session REST API, SSE turn streaming, and chat page.
// ABOUTME: Uses Axum with in-memory shared state; each session is locked for the duration of a turn.

pub mod api;
pub mod app_state;
pub mod config;
pub mod routes;
pub mod web;

pub use app_state::{AppState, SharedState, spawn_idle_sweeper};
pub use config::{ConfigError, SwitchyardConfig};
pub use routes::create_router;
