//! # olympics-store
//!
//! Persistence for the leaderboard, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for both tables, plus a
//! bounded async [`Pool`] of such handles for the HTTP server.

pub mod countries;
pub mod database;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod registrations;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
pub use pool::{Pool, PooledDatabase};
