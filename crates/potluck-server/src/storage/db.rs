//! SQLite event store (embedded, no external dependencies)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use potluck_core::{create_id, sanitize_event_name, sanitize_event_payload, Category, Event};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub struct EventStore {
    pool: SqlitePool,
}

impl EventStore {
    pub async fn new(database_path: &str) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path);

        // Create parent directory if needed
        if let Some(parent) = std::path::Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| {
                format!("Failed to connect to SQLite database at: {}", database_path)
            })?;

        tracing::info!("SQLite connection established, running migrations...");

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!("Database initialization complete");

        Ok(Self { pool })
    }

    /// In-memory store, used by tests
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);

        // A second connection would see a separate empty database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?;

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                categories TEXT NOT NULL DEFAULT '[]',
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Create a new event from a raw `{name}` payload
    ///
    /// Mints the id and both timestamps server-side; categories always
    /// start empty regardless of what the payload carries.
    pub async fn create(&self, payload: &Value) -> Result<Event, StoreError> {
        let id = create_id();
        let name = sanitize_event_name(payload);
        let categories: Vec<Category> = Vec::new();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO events (id, name, categories, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&id)
        .bind(&name)
        .bind(serde_json::to_string(&categories)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Event {
            id,
            name,
            categories,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fetch an event by id; `None` means the id has no record, which is
    /// a normal outcome, not a fault
    pub async fn get(&self, id: &str) -> Result<Option<Event>, StoreError> {
        let row: Option<EventRow> = sqlx::query_as(
            r#"
            SELECT id, name, categories, created_at, updated_at
            FROM events WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    /// Replace the full document of an existing event
    ///
    /// Looks up the row first to confirm existence and recover
    /// `created_at`, then sanitizes the payload and overwrites name,
    /// categories, and `updated_at`. Returns `None` without writing if
    /// the id is unknown.
    ///
    /// The lookup and the update are deliberately not in a transaction:
    /// two concurrent replaces on the same id are last-write-wins, with
    /// the earlier caller's changes silently discarded.
    pub async fn replace(&self, id: &str, payload: &Value) -> Result<Option<Event>, StoreError> {
        let existing: Option<(DateTime<Utc>,)> =
            sqlx::query_as("SELECT created_at FROM events WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some((created_at,)) = existing else {
            return Ok(None);
        };

        let doc = sanitize_event_payload(payload);
        let updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE events
            SET name = ?2, categories = ?3, updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&doc.name)
        .bind(serde_json::to_string(&doc.categories)?)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(Some(Event {
            id: id.to_string(),
            name: doc.name,
            categories: doc.categories,
            created_at,
            updated_at,
        }))
    }
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct EventRow {
    id: String,
    name: String,
    categories: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(r: EventRow) -> Self {
        Event {
            id: r.id,
            name: r.name,
            categories: serde_json::from_str(&r.categories).unwrap_or_default(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = EventStore::in_memory().await.unwrap();

        let created = store.create(&json!({ "name": "Game Night" })).await.unwrap();
        assert_eq!(created.name, "Game Night");
        assert!(created.categories.is_empty());
        assert_eq!(created.created_at, created.updated_at);

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "Game Night");
        assert!(fetched.categories.is_empty());
        assert_eq!(
            fetched.created_at.timestamp_millis(),
            created.created_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn create_sanitizes_name_and_ignores_payload_categories() {
        let store = EventStore::in_memory().await.unwrap();

        let created = store
            .create(&json!({
                "name": "   ",
                "categories": [{ "name": "Smuggled", "items": [] }]
            }))
            .await
            .unwrap();

        assert_eq!(created.name, "Untitled Potluck");
        assert!(created.categories.is_empty());
    }

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let store = EventStore::in_memory().await.unwrap();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_unknown_id_writes_nothing() {
        let store = EventStore::in_memory().await.unwrap();

        let result = store
            .replace("nope", &json!({ "name": "Ghost" }))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_preserves_created_at_and_bumps_updated_at() {
        let store = EventStore::in_memory().await.unwrap();
        let created = store.create(&json!({ "name": "Picnic" })).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;

        let replaced = store
            .replace(
                &created.id,
                &json!({
                    "name": "Beach Picnic",
                    "categories": [{
                        "id": "c1",
                        "name": "Drinks",
                        "items": [{ "id": "i1", "label": "Lemonade", "person": "Ben" }]
                    }]
                }),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.name, "Beach Picnic");
        assert_eq!(
            replaced.created_at.timestamp_millis(),
            created.created_at.timestamp_millis()
        );
        assert!(replaced.updated_at > replaced.created_at);

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.categories.len(), 1);
        assert_eq!(fetched.categories[0].id, "c1");
        assert_eq!(fetched.categories[0].items[0].label, "Lemonade");
        assert_eq!(fetched.categories[0].items[0].person, "Ben");
    }

    #[tokio::test]
    async fn replace_sanitizes_the_whole_tree() {
        let store = EventStore::in_memory().await.unwrap();
        let created = store.create(&json!({ "name": "Brunch" })).await.unwrap();

        let replaced = store
            .replace(
                &created.id,
                &json!({
                    "name": null,
                    "categories": [{
                        "id": 42,
                        "items": [{ "label": "Chips" }]
                    }]
                }),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced.name, "Untitled Potluck");
        assert_eq!(replaced.categories[0].name, "Category");
        assert_ne!(replaced.categories[0].id, "42");
        assert_eq!(replaced.categories[0].items[0].person, "Someone");
    }

    #[tokio::test]
    async fn replace_is_full_document_not_a_merge() {
        let store = EventStore::in_memory().await.unwrap();
        let created = store.create(&json!({ "name": "Dinner" })).await.unwrap();

        store
            .replace(
                &created.id,
                &json!({
                    "name": "Dinner",
                    "categories": [{ "id": "a", "name": "Mains", "items": [] }]
                }),
            )
            .await
            .unwrap()
            .unwrap();

        // Second writer did not include the first writer's category
        let second = store
            .replace(
                &created.id,
                &json!({
                    "name": "Dinner",
                    "categories": [{ "id": "b", "name": "Desserts", "items": [] }]
                }),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(second.categories.len(), 1);
        assert_eq!(second.categories[0].id, "b");

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.categories.len(), 1);
        assert_eq!(fetched.categories[0].id, "b");
    }

    #[tokio::test]
    async fn category_order_survives_storage() {
        let store = EventStore::in_memory().await.unwrap();
        let created = store.create(&json!({ "name": "Fiesta" })).await.unwrap();

        let names = ["Starters", "Mains", "Desserts", "Drinks"];
        let categories: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, n)| json!({ "id": format!("c{i}"), "name": n, "items": [] }))
            .collect();

        store
            .replace(&created.id, &json!({ "name": "Fiesta", "categories": categories }))
            .await
            .unwrap()
            .unwrap();

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        let fetched_names: Vec<_> = fetched.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(fetched_names, names);
    }
}
