// SQLite table store - one SQLite table per logical table
//
// Each row holds an item's `id` and the whole item as a JSON document, which
// mirrors DynamoDB's schemaless items closely enough for local runs.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use super::TableStore;
use crate::error::StorageError;
use crate::models::{AttrValue, Item, ATTR_ID};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file, creating parent directories
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Open(format!("{}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| StorageError::Open(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, String> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| "sqlite connection poisoned".to_string())?;
        f(&conn).map_err(|e| e.to_string())
    }

    /// All items of a table, in insertion order
    pub fn items(&self, table: &str) -> Result<Vec<Item>, String> {
        let docs = self.with_conn(|conn| {
            let exists: Option<String> = conn
                .query_row(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Ok(Vec::new());
            }
            let mut stmt = conn.prepare(&format!("SELECT item FROM \"{}\" ORDER BY rowid", table))?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let mut docs = Vec::new();
            for row in rows {
                docs.push(row?);
            }
            Ok(docs)
        })?;

        docs.iter()
            .map(|doc| serde_json::from_str::<Item>(doc).map_err(|e| e.to_string()))
            .collect()
    }
}

impl TableStore for SqliteStore {
    async fn put(&self, table: &str, item: &Item) -> Result<(), String> {
        let id = match item.get(ATTR_ID) {
            Some(AttrValue::S(id)) if !id.is_empty() => id.clone(),
            _ => return Err("item has no string id".to_string()),
        };
        let doc = serde_json::to_string(item).map_err(|e| e.to_string())?;
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS \"{}\" (
                        id TEXT PRIMARY KEY,
                        item TEXT NOT NULL
                    )",
                    table
                ),
                [],
            )?;
            // Same-key puts replace the item, as DynamoDB's PutItem does
            conn.execute(
                &format!("INSERT OR REPLACE INTO \"{}\" (id, item) VALUES (?1, ?2)", table),
                params![id, doc],
            )
        })?;
        debug!("Put item {} into {}", id, table);
        Ok(())
    }

    async fn delete_table(&self, table: &str) -> Result<(), String> {
        self.with_conn(|conn| conn.execute(&format!("DROP TABLE \"{}\"", table), []))?;
        Ok(())
    }
}
