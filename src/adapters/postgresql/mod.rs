//! PostgreSQL store
//!
//! Dataset aggregates as JSONB documents, plus relational tables for locks,
//! roles, users and notifications.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
pub use models::{PostgreSQLDataFile, PostgreSQLDataset};
