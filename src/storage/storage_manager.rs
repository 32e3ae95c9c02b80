/// Object key layout for persisted tables: `<folder>/<table>.parquet`.
pub struct StorageManager;

impl StorageManager {
    pub fn table_key(folder: &str, table_name: &str) -> String {
        format!("{}/{}.parquet", folder, table_name)
    }

    pub fn table_listing_prefix(folder: &str, table_prefix: &str) -> String {
        format!("{}/{}", folder, table_prefix)
    }

    /// Inverse of `table_key`; `None` for keys outside `folder` or not parquet.
    pub fn table_name_from_key(folder: &str, key: &str) -> Option<String> {
        let rest = key.strip_prefix(folder)?.strip_prefix('/')?;
        let name = rest.strip_suffix(".parquet")?;
        if name.is_empty() || name.contains('/') {
            return None;
        }
        Some(name.to_string())
    }
}
