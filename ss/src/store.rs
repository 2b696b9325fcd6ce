//! Core SpecStore implementation

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS specifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    feature TEXT,
    json_output TEXT,
    markdown_output TEXT,
    created_at TEXT
);
";

/// A specification about to be stored
#[derive(Debug, Clone)]
pub struct NewSpec {
    pub title: String,
    pub feature: String,
    pub json_output: String,
    pub markdown_output: String,
}

impl NewSpec {
    pub fn new(
        title: impl Into<String>,
        feature: impl Into<String>,
        json_output: impl Into<String>,
        markdown_output: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            feature: feature.into(),
            json_output: json_output.into(),
            markdown_output: markdown_output.into(),
        }
    }
}

/// Row summary used for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSummary {
    pub id: i64,
    pub title: String,
    pub feature: String,
    pub created_at: String,
}

/// A fully loaded stored specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSpec {
    pub id: i64,
    pub title: String,
    pub feature: String,
    pub json_output: String,
    pub markdown_output: String,
    pub created_at: String,
}

impl StoredSpec {
    /// Parse the stored JSON output
    pub fn json_value(&self) -> Result<serde_json::Value> {
        debug!(id = self.id, "StoredSpec::json_value: called");
        serde_json::from_str(&self.json_output).context(format!("Stored JSON for spec {} is not valid", self.id))
    }
}

/// SQLite-backed history of generated specifications
pub struct SpecStore {
    path: PathBuf,
    conn: Connection,
}

impl SpecStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!(?path, "SpecStore::open: called");

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).context("Failed to create store directory")?;
        }

        let conn = Connection::open(&path).context(format!("Failed to open database {}", path.display()))?;
        conn.execute_batch(SCHEMA).context("Failed to initialize schema")?;

        info!(path = %path.display(), "Opened spec store");
        Ok(Self { path, conn })
    }

    /// Open an in-memory store (used by tests)
    pub fn open_in_memory() -> Result<Self> {
        debug!("SpecStore::open_in_memory: called");
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        conn.execute_batch(SCHEMA).context("Failed to initialize schema")?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a specification, returning its id
    pub fn save(&self, spec: &NewSpec) -> Result<i64> {
        debug!(title = %spec.title, "SpecStore::save: called");
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        self.conn
            .execute(
                "INSERT INTO specifications (title, feature, json_output, markdown_output, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    spec.title,
                    spec.feature,
                    spec.json_output,
                    spec.markdown_output,
                    created_at
                ],
            )
            .context("Failed to insert specification")?;

        let id = self.conn.last_insert_rowid();
        info!(id, "Saved specification");
        Ok(id)
    }

    /// List all specifications, newest first
    pub fn list(&self) -> Result<Vec<SpecSummary>> {
        debug!("SpecStore::list: called");
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, feature, created_at FROM specifications ORDER BY id DESC")?;

        let rows = stmt.query_map([], |row| {
            Ok(SpecSummary {
                id: row.get(0)?,
                title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                feature: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                created_at: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            })
        })?;

        let summaries = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read specification rows")?;
        debug!(count = summaries.len(), "SpecStore::list: loaded");
        Ok(summaries)
    }

    /// Fetch a full specification by id
    pub fn get(&self, id: i64) -> Result<Option<StoredSpec>> {
        debug!(id, "SpecStore::get: called");
        self.conn
            .query_row(
                "SELECT id, title, feature, json_output, markdown_output, created_at
                 FROM specifications WHERE id = ?1",
                params![id],
                |row| {
                    Ok(StoredSpec {
                        id: row.get(0)?,
                        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        feature: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        json_output: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                        markdown_output: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                        created_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    })
                },
            )
            .optional()
            .context(format!("Failed to load specification {}", id))
    }

    /// Delete a specification, returning whether a row was removed
    pub fn delete(&self, id: i64) -> Result<bool> {
        debug!(id, "SpecStore::delete: called");
        let removed = self
            .conn
            .execute("DELETE FROM specifications WHERE id = ?1", params![id])
            .context(format!("Failed to delete specification {}", id))?;
        if removed > 0 {
            info!(id, "Deleted specification");
        }
        Ok(removed > 0)
    }
}

/// Derive a short title from a feature goal
///
/// Uses the first line, cut on a word boundary at [`crate::MAX_TITLE_CHARS`].
pub fn derive_title(feature: &str) -> String {
    let first_line = feature.trim().lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= crate::MAX_TITLE_CHARS {
        return first_line.to_string();
    }

    let cut: String = first_line.chars().take(crate::MAX_TITLE_CHARS).collect();
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => cut[..pos].trim_end(),
        _ => cut.as_str(),
    };
    format!("{}...", trimmed)
}
