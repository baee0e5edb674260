//! HTTP layer for blogr: session auth, post handlers and the router.

pub mod auth;
pub mod context;
pub mod error;
pub mod middleware;
pub mod pages;
pub mod posts;
pub mod routes;
pub mod session;

pub use auth::{AppState, AppStateInner};
pub use routes::router;
