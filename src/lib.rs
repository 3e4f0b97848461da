//! Photo ingest: webhook-driven photo enrichment service.

pub mod channels;
pub mod classify;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod store;
pub mod web;
