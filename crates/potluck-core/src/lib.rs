//! Potluck Share Core
//!
//! Pure domain types and the payload sanitizer for the potluck sharing
//! service. No I/O and no async runtime dependencies; the server crate
//! layers persistence and HTTP on top of these types.

pub mod event;
pub mod sanitize;

pub use event::{Category, Event, EventDocument, Item};
pub use sanitize::{create_id, sanitize_event_name, sanitize_event_payload};
