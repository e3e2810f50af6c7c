//! Payload sanitizer
//!
//! Turns an arbitrary client-submitted JSON value into a canonical event
//! document. Total over all inputs: missing fields, wrong types, and
//! non-object payloads are coerced to defaults, never rejected.

use chrono::Utc;
use rand::Rng;
use serde_json::Value;

use crate::event::{Category, EventDocument, Item};

const DEFAULT_EVENT_NAME: &str = "Untitled Potluck";
const DEFAULT_CATEGORY_NAME: &str = "Category";
const DEFAULT_ITEM_LABEL: &str = "Item";
const DEFAULT_PERSON: &str = "Someone";

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Mint a short, practically-unique id token
///
/// Six random base-36 characters followed by the last four base-36
/// digits of the current Unix-millis timestamp. Ids are scoped to a
/// single document; no global uniqueness is guaranteed or needed.
pub fn create_id() -> String {
    let mut rng = rand::thread_rng();
    let mut id = String::with_capacity(10);
    for _ in 0..6 {
        id.push(BASE36[rng.gen_range(0..BASE36.len())] as char);
    }
    let millis = Utc::now().timestamp_millis().unsigned_abs();
    let stamp = to_base36(millis);
    id.push_str(&stamp[stamp.len().saturating_sub(4)..]);
    id
}

fn to_base36(mut n: u64) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    // base-36 digits are always ASCII
    String::from_utf8(digits).unwrap_or_default()
}

/// Sanitize a full event payload into its canonical form
///
/// Applied top-down, independently at each level. Never fails.
pub fn sanitize_event_payload(payload: &Value) -> EventDocument {
    let categories = match payload.get("categories").and_then(Value::as_array) {
        Some(raw) => raw.iter().map(sanitize_category).collect(),
        None => Vec::new(),
    };

    EventDocument {
        name: sanitize_event_name(payload),
        categories,
    }
}

/// Sanitize just the event-level name from a payload
pub fn sanitize_event_name(payload: &Value) -> String {
    text_or(payload.get("name"), DEFAULT_EVENT_NAME)
}

fn sanitize_category(raw: &Value) -> Category {
    let items = match raw.get("items").and_then(Value::as_array) {
        Some(raw_items) => raw_items.iter().map(sanitize_item).collect(),
        None => Vec::new(),
    };

    Category {
        id: id_or_fresh(raw.get("id")),
        name: text_or(raw.get("name"), DEFAULT_CATEGORY_NAME),
        items,
    }
}

fn sanitize_item(raw: &Value) -> Item {
    Item {
        id: id_or_fresh(raw.get("id")),
        label: text_or(raw.get("label"), DEFAULT_ITEM_LABEL),
        person: text_or(raw.get("person"), DEFAULT_PERSON),
    }
}

/// Trimmed string if present and non-blank, else the default
fn text_or(value: Option<&Value>, default: &str) -> String {
    match value.and_then(Value::as_str).map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

/// Pass a string id through verbatim (client-chosen ids survive an
/// edit-and-resave round trip); mint a fresh one for anything else.
fn id_or_fresh(value: Option<&Value>) -> String {
    match value.and_then(Value::as_str) {
        Some(s) => s.to_string(),
        None => create_id(),
    }
}
