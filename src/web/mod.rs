//! Inbound HTTP: webhook endpoint, read API and gallery page.

pub mod gallery;
pub mod routes;

pub use routes::{AppState, app_routes};
