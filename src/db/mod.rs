//! SQLite-backed ledger storage.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - `Repository`, the `Ledger` implementation over sqlx

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
