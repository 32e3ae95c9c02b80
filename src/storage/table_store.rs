use crate::models::CanonicalRateRow;
use crate::processor::rows_from_dataframe;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use polars::prelude::*;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Named rate tables. Writing a table always replaces it in full.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn replace_table(&self, name: &str, table: &DataFrame) -> Result<()>;

    /// Table names starting with `prefix`, sorted.
    async fn list_tables(&self, prefix: &str) -> Result<Vec<String>>;

    async fn read_table(&self, name: &str) -> Result<DataFrame>;
}

/// Reads every table under `prefix` into typed rows. Unreadable tables are
/// skipped with a warning so one bad table does not hide the rest.
pub async fn load_rate_rows(store: &dyn TableStore, prefix: &str) -> Result<Vec<CanonicalRateRow>> {
    let names = store.list_tables(prefix).await?;
    info!("Found {} table(s) with prefix '{}'", names.len(), prefix);

    let mut rows = Vec::new();
    for name in names {
        let table = match store.read_table(&name).await {
            Ok(table) => table,
            Err(e) => {
                warn!("⚠️ Skipping table {}: {}", name, e);
                continue;
            }
        };
        match rows_from_dataframe(&table, &name) {
            Ok(mut table_rows) => {
                info!("Loaded {} rows from {}", table_rows.len(), name);
                rows.append(&mut table_rows);
            }
            Err(e) => warn!("⚠️ Skipping table {}: {}", name, e),
        }
    }

    Ok(rows)
}

/// Process-local store, used by tests and dry runs.
#[derive(Default)]
pub struct InMemoryTableStore {
    tables: RwLock<BTreeMap<String, DataFrame>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn replace_table(&self, name: &str, table: &DataFrame) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.remove(name);
        tables.insert(name.to_string(), table.clone());
        Ok(())
    }

    async fn list_tables(&self, prefix: &str) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        Ok(tables
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn read_table(&self, name: &str) -> Result<DataFrame> {
        let tables = self.tables.read().await;
        tables
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Table not found: {}", name))
    }
}
