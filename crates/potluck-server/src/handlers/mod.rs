//! HTTP handlers

pub mod events;
pub mod health;

pub use health::health;
