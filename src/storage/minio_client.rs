use crate::config::MinioConfig;
use crate::storage::{StorageManager, TableStore};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use polars::prelude::*;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use std::io::Cursor;
use tracing::info;

/// Rate tables as parquet objects in a MinIO/S3 bucket.
pub struct MinioStorage {
    bucket: Bucket,
    tables_folder: String,
}

impl MinioStorage {
    pub fn from_config(config: &MinioConfig) -> Result<Self> {
        config.validate()?;

        let region = Region::Custom {
            region: config.get_region().to_owned(),
            endpoint: config.endpoint.clone(),
        };

        let credentials = Credentials::new(
            Some(config.get_access_key()?),
            Some(config.get_secret_key()?),
            None, // security_token
            None, // session_token
            None, // expiration
        )?;

        let bucket = Bucket::new(&config.bucket_name, region, credentials)?;

        let bucket = if config.is_path_style() {
            *bucket.with_path_style()
        } else {
            *bucket
        };

        Ok(MinioStorage {
            bucket,
            tables_folder: config.get_tables_folder().to_string(),
        })
    }

    pub async fn ensure_bucket(&self) -> Result<()> {
        match self.bucket.exists().await {
            Ok(true) => {
                info!("Bucket '{}' already exists", self.bucket.name);
            }
            Ok(false) => {
                let config = s3::BucketConfiguration::default();
                let response = s3::Bucket::create(
                    &self.bucket.name,
                    self.bucket.region.clone(),
                    self.bucket.credentials().await?,
                    config,
                )
                .await;
                match response {
                    Ok(_) => {
                        info!("Created bucket: {}", self.bucket.name);
                    }
                    Err(e) => {
                        return Err(anyhow!("Failed to create bucket: {}", e));
                    }
                }
            }
            Err(e) => {
                return Err(anyhow!("Failed to check bucket existence: {}", e));
            }
        }
        Ok(())
    }

    pub fn table_key(&self, table_name: &str) -> String {
        StorageManager::table_key(&self.tables_folder, table_name)
    }

    async fn put_object(&self, key: &str, data: &[u8]) -> Result<()> {
        let response = self.bucket.put_object(key, data).await?;

        if response.status_code() == 200 {
            info!("Stored object: {} ({} bytes)", key, data.len());
            Ok(())
        } else {
            Err(anyhow!(
                "Failed to store object {}: HTTP {}",
                key,
                response.status_code()
            ))
        }
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let response = self.bucket.get_object(key).await?;

        if response.status_code() == 200 {
            Ok(response.bytes().to_vec())
        } else {
            Err(anyhow!(
                "Failed to get object {}: HTTP {}",
                key,
                response.status_code()
            ))
        }
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        let response = self.bucket.delete_object(key).await?;

        if response.status_code() == 204 || response.status_code() == 200 {
            info!("Deleted object: {}", key);
            Ok(())
        } else {
            Err(anyhow!(
                "Failed to delete object {}: HTTP {}",
                key,
                response.status_code()
            ))
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let list = self.bucket.list(prefix.to_string(), None).await?;

        let mut keys = Vec::new();
        for result in list {
            for object in result.contents {
                keys.push(object.key);
            }
        }
        Ok(keys)
    }
}

#[async_trait]
impl TableStore for MinioStorage {
    /// Delete-then-put. A reader racing a reload can see the table missing.
    async fn replace_table(&self, name: &str, table: &DataFrame) -> Result<()> {
        let key = self.table_key(name);

        let mut df = table.clone();
        let mut buf = Vec::new();
        {
            let writer = ParquetWriter::new(&mut buf);
            writer
                .finish(&mut df)
                .with_context(|| format!("Failed to encode table {} as parquet", name))?;
        }

        self.delete_object(&key).await?;
        self.put_object(&key, &buf).await?;
        info!("🗄️ Replaced table {} with {} rows", name, df.height());
        Ok(())
    }

    async fn list_tables(&self, prefix: &str) -> Result<Vec<String>> {
        let listing = StorageManager::table_listing_prefix(&self.tables_folder, prefix);
        let mut names: Vec<String> = self
            .list_keys(&listing)
            .await?
            .iter()
            .filter_map(|key| StorageManager::table_name_from_key(&self.tables_folder, key))
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn read_table(&self, name: &str) -> Result<DataFrame> {
        let bytes = self
            .get_object(&self.table_key(name))
            .await
            .with_context(|| format!("Failed to fetch table {}", name))?;

        let df = ParquetReader::new(Cursor::new(bytes))
            .finish()
            .with_context(|| format!("Failed to decode table {}", name))?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CARRIER, GP20, POL};

    #[test]
    fn test_minio_from_config() {
        let config = MinioConfig {
            access_key: Some("test_access".to_string()),
            secret_key: Some("test_secret".to_string()),
            tables_folder: Some("rate_tables".to_string()),
            ..MinioConfig::default()
        };

        let storage = MinioStorage::from_config(&config).unwrap();
        assert_eq!(storage.bucket.name, "ratesheets");
        assert!(storage.bucket.is_path_style());
        assert_eq!(storage.table_key("cleaned_one"), "rate_tables/cleaned_one.parquet");
    }

    #[test]
    fn test_from_config_uses_region_and_addressing() {
        let config = MinioConfig {
            endpoint: "https://s3.example.com".to_string(),
            bucket_name: "rates-eu".to_string(),
            region: Some("eu-west-1".to_string()),
            path_style: Some(false),
            tables_folder: Some("/tables/".to_string()),
            access_key: Some("test_access".to_string()),
            secret_key: Some("test_secret".to_string()),
            ..MinioConfig::default()
        };

        let storage = MinioStorage::from_config(&config).unwrap();
        assert!(!storage.bucket.is_path_style());
        assert!(matches!(
            &storage.bucket.region,
            Region::Custom { region, endpoint }
                if region == "eu-west-1" && endpoint == "https://s3.example.com"
        ));
        assert_eq!(storage.table_key("cleaned_msc"), "tables/cleaned_msc.parquet");
    }

    #[test]
    fn test_from_config_requires_credentials() {
        assert!(MinioStorage::from_config(&MinioConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_table_round_trip() {
        // Needs a running MinIO instance
        if std::env::var("MINIO_TEST_ENABLED").is_err() {
            return;
        }

        let config = MinioConfig {
            bucket_name: "test-bucket".to_string(),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            ..MinioConfig::default()
        };
        let storage = MinioStorage::from_config(&config).unwrap();
        storage.ensure_bucket().await.unwrap();

        let first = df!(POL => ["NINGBO", "XIAMEN"], CARRIER => ["MSC", "ONE"], GP20 => [1000.0, 900.0]).unwrap();
        let second = df!(POL => ["YANTIAN"], CARRIER => ["CMA"], GP20 => [800.0]).unwrap();

        storage.replace_table("cleaned_test", &first).await.unwrap();
        storage.replace_table("cleaned_test", &second).await.unwrap();

        let read = storage.read_table("cleaned_test").await.unwrap();
        assert!(read.equals_missing(&second));

        let names = storage.list_tables("cleaned_").await.unwrap();
        assert!(names.contains(&"cleaned_test".to_string()));
    }
}
