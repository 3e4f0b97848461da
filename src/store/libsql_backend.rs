//! libSQL backend: async `PhotoStore` implementation.
//!
//! Supports local file and in-memory databases. One connection is opened at
//! startup and shared by every request for the life of the process.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::classify::DetectedObject;
use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{PhotoRecord, PhotoStore};

/// libSQL database backend.
///
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Fixed-width RFC 3339 so that text order matches time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Serialization(format!("bad timestamp '{s}': {e}")))
}

fn opt_real(value: Option<f64>) -> libsql::Value {
    match value {
        Some(v) => libsql::Value::Real(v),
        None => libsql::Value::Null,
    }
}

const PHOTO_COLUMNS: &str =
    "id, username, photo_url, chat_id, timestamp, safe_score, detected_objects, recognized_brands";

/// Map a libsql Row to a PhotoRecord. Column order matches PHOTO_COLUMNS.
fn row_to_photo(row: &libsql::Row) -> Result<PhotoRecord, DatabaseError> {
    let query_err = |e: libsql::Error| DatabaseError::Query(format!("row parse: {e}"));

    let id_str: String = row.get(0).map_err(query_err)?;
    let username: String = row.get(1).map_err(query_err)?;
    let photo_url: String = row.get(2).map_err(query_err)?;
    let chat_id: i64 = row.get(3).map_err(query_err)?;
    let timestamp_str: String = row.get(4).map_err(query_err)?;
    let safe_score = match row.get_value(5).map_err(query_err)? {
        libsql::Value::Real(v) => Some(v),
        libsql::Value::Integer(v) => Some(v as f64),
        _ => None,
    };
    let objects_json: String = row.get(6).map_err(query_err)?;
    let brands_json: String = row.get(7).map_err(query_err)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DatabaseError::Serialization(format!("bad id '{id_str}': {e}")))?;
    let detected_objects: Vec<DetectedObject> = serde_json::from_str(&objects_json)
        .map_err(|e| DatabaseError::Serialization(format!("detected_objects: {e}")))?;
    let recognized_brands: Vec<String> = serde_json::from_str(&brands_json)
        .map_err(|e| DatabaseError::Serialization(format!("recognized_brands: {e}")))?;

    Ok(PhotoRecord {
        id,
        username,
        photo_url,
        chat_id,
        timestamp: parse_timestamp(&timestamp_str)?,
        safe_score,
        detected_objects,
        recognized_brands,
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl PhotoStore for LibSqlBackend {
    async fn insert_photo(&self, record: &PhotoRecord) -> Result<Uuid, DatabaseError> {
        let objects_json = serde_json::to_string(&record.detected_objects)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let brands_json = serde_json::to_string(&record.recognized_brands)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                &format!("INSERT INTO photos ({PHOTO_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                params![
                    record.id.to_string(),
                    record.username.as_str(),
                    record.photo_url.as_str(),
                    record.chat_id,
                    format_timestamp(&record.timestamp),
                    opt_real(record.safe_score),
                    objects_json,
                    brands_json,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_photo: {e}")))?;

        debug!(id = %record.id, chat_id = record.chat_id, "Photo record inserted");
        Ok(record.id)
    }

    async fn list_photos(&self) -> Result<Vec<PhotoRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PHOTO_COLUMNS} FROM photos ORDER BY timestamp DESC, rowid DESC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_photos: {e}")))?;

        let mut photos = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_photos: {e}")))?
        {
            photos.push(row_to_photo(&row)?);
        }
        Ok(photos)
    }
}
