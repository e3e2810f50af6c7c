//! Storage layer
//!
//! One record per event keyed by id, in embedded SQLite instead of
//! PostgreSQL for simplicity.

pub mod db;

pub use db::{EventStore, StoreError};
