//! Scribe: a GraphQL service for authors and their posts.
//!
//! Persistence is SQLite through sqlx; mutations pass through a per-client
//! throttle backed by governor in memory or Redis when configured.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod services;

pub use app::{AppState, build_app};
