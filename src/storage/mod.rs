//! Table storage
//!
//! Records land in a key-value table addressed by name. [`TableStore`] is the
//! two operations we need (put one item, drop a whole table); DynamoDB is the
//! production backend and SQLite the local one.

pub mod dynamo;
pub mod sqlite;

use tracing::{error, info};

use crate::config::StorageBackend;
use crate::error::StorageError;
use crate::models::{Item, RankingRecord};

pub use dynamo::DynamoStore;
pub use sqlite::SqliteStore;

/// A key-value table service
#[allow(async_fn_in_trait)]
pub trait TableStore {
    async fn put(&self, table: &str, item: &Item) -> Result<(), String>;

    async fn delete_table(&self, table: &str) -> Result<(), String>;
}

/// Backend chosen by configuration
pub enum Storage {
    Dynamo(DynamoStore),
    Sqlite(SqliteStore),
}

impl Storage {
    pub async fn open(backend: &StorageBackend) -> Result<Self, StorageError> {
        match backend {
            StorageBackend::DynamoDb { region } => {
                info!("Initializing dynamodb connection with region: {}", region);
                Ok(Storage::Dynamo(DynamoStore::connect(region).await))
            }
            StorageBackend::Sqlite { path } => {
                info!("Opening sqlite table store at {:?}", path);
                Ok(Storage::Sqlite(SqliteStore::open(path)?))
            }
        }
    }
}

impl TableStore for Storage {
    async fn put(&self, table: &str, item: &Item) -> Result<(), String> {
        match self {
            Storage::Dynamo(s) => s.put(table, item).await,
            Storage::Sqlite(s) => s.put(table, item).await,
        }
    }

    async fn delete_table(&self, table: &str) -> Result<(), String> {
        match self {
            Storage::Dynamo(s) => s.delete_table(table).await,
            Storage::Sqlite(s) => s.delete_table(table).await,
        }
    }
}

/// Table names follow DynamoDB's rules so both backends accept the same set
pub fn validate_table_name(name: &str) -> Result<(), StorageError> {
    let valid_len = (3..=255).contains(&name.len());
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid_len && valid_chars {
        Ok(())
    } else {
        Err(StorageError::InvalidTableName(name.to_string()))
    }
}

/// Insert each record as its own item, stopping at the first rejection.
///
/// There is no batching and no atomicity: items written before a failure
/// stay written. Returns the number of items written.
pub async fn write_many<S: TableStore>(
    store: &S,
    table: &str,
    records: &[RankingRecord],
) -> Result<usize, StorageError> {
    validate_table_name(table)?;
    for (index, record) in records.iter().enumerate() {
        let item = record.to_item();
        if let Err(reason) = store.put(table, &item).await {
            let err = StorageError::Put {
                table: table.to_string(),
                index,
                id: record.id.clone(),
                reason,
            };
            error!("Error saving to table store: {}", err);
            return Err(err);
        }
    }
    info!("Saved {} items to table: {}", records.len(), table);
    Ok(records.len())
}

/// Drop a whole table (administrative teardown)
pub async fn delete_table<S: TableStore>(store: &S, table: &str) -> Result<(), StorageError> {
    validate_table_name(table)?;
    store.delete_table(table).await.map_err(|reason| {
        let err = StorageError::Delete {
            table: table.to_string(),
            reason,
        };
        error!("Error deleting table: {}", err);
        err
    })?;
    info!("Deleted table: {}", table);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_rules() {
        assert!(validate_table_name("coingecko-trends").is_ok());
        assert!(validate_table_name("cmc_trends.v2").is_ok());
        assert!(validate_table_name("ab").is_err());
        assert!(validate_table_name("drop table;").is_err());
        assert!(validate_table_name(&"x".repeat(256)).is_err());
        assert!(validate_table_name("\"quoted\"").is_err());
    }
}
