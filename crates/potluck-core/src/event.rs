//! Event types
//!
//! An event is a three-level document: event -> categories -> items.
//! Depth is fixed; there is no deeper nesting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shared potluck event, the unit of sharing
///
/// `id` is opaque and client-visible, minted at creation and immutable.
/// `created_at` never changes; `updated_at` is refreshed on every
/// successful write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub categories: Vec<Category>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named grouping of items within an event (e.g. "Mains")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub items: Vec<Item>,
}

/// A single dish within a category, optionally claimed by a person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub label: String,
    pub person: String,
}

/// The canonical sanitizer output: the mutable slice of an event
///
/// `id` and the timestamps are owned by the store; everything a client
/// may overwrite lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDocument {
    pub name: String,
    pub categories: Vec<Category>,
}
