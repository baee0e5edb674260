//! Types shared between the blogr database layer, HTTP handlers and server.

pub mod api;
pub mod models;
