//! Buzz API crate - axum HTTP server, chat page and route handlers.
//!
//! Serves the chat widget and the JSON endpoints it calls: one turn per
//! `POST /chat`, transcript read and reset per session, health and the
//! expertise catalogue.

pub mod error;
pub mod handlers;
pub mod page;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
