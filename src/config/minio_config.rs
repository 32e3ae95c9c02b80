use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinioConfigFile {
    pub minio: MinioSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinioSection {
    pub endpoint: String,
    pub bucket_name: String,
    pub region: Option<String>,
    pub path_style: Option<bool>,
    // Object key folder holding one parquet object per rate table
    pub tables_folder: Option<String>,
    // Optional environment variable names for customization
    pub env_access_key: Option<String>,
    pub env_secret_key: Option<String>,
}

/// Where persisted rate tables live. Credentials come from the environment.
#[derive(Debug, Clone)]
pub struct MinioConfig {
    pub endpoint: String,
    pub bucket_name: String,
    pub region: Option<String>,
    pub path_style: Option<bool>,
    pub tables_folder: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub env_access_key: Option<String>,
    pub env_secret_key: Option<String>,
}

impl MinioConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read MinIO config file: {}", path))?;

        let config_file: MinioConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse MinIO config file: {}", path))?;

        let mut config = Self::from_section(config_file.minio);

        // Missing credentials are fatal at startup
        config.load_credentials()?;

        Ok(config)
    }

    fn from_section(section: MinioSection) -> Self {
        Self {
            endpoint: section.endpoint,
            bucket_name: section.bucket_name,
            region: section.region,
            path_style: section.path_style,
            tables_folder: section.tables_folder,
            access_key: None,
            secret_key: None,
            env_access_key: section.env_access_key,
            env_secret_key: section.env_secret_key,
        }
    }

    pub fn load_credentials(&mut self) -> Result<()> {
        let access_key_var = self.env_access_key.as_deref().unwrap_or("MINIO_ACCESS_KEY");
        let secret_key_var = self.env_secret_key.as_deref().unwrap_or("MINIO_SECRET_KEY");

        self.access_key = env::var(access_key_var)
            .with_context(|| format!("Missing environment variable: {}", access_key_var))?
            .into();

        self.secret_key = env::var(secret_key_var)
            .with_context(|| format!("Missing environment variable: {}", secret_key_var))?
            .into();

        Ok(())
    }

    pub fn get_access_key(&self) -> Result<&str> {
        self.access_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Access key not loaded"))
    }

    pub fn get_secret_key(&self) -> Result<&str> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Secret key not loaded"))
    }

    pub fn is_path_style(&self) -> bool {
        self.path_style.unwrap_or(true)
    }

    pub fn get_region(&self) -> &str {
        self.region.as_deref().unwrap_or("us-east-1")
    }

    pub fn get_tables_folder(&self) -> &str {
        self.tables_folder
            .as_deref()
            .map(|f| f.trim_matches('/'))
            .filter(|f| !f.is_empty())
            .unwrap_or("tables")
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(anyhow::anyhow!("MinIO endpoint cannot be empty"));
        }

        if self.bucket_name.is_empty() {
            return Err(anyhow::anyhow!("MinIO bucket name cannot be empty"));
        }

        if self.access_key.is_none() {
            return Err(anyhow::anyhow!("MinIO access key not loaded"));
        }

        if self.secret_key.is_none() {
            return Err(anyhow::anyhow!("MinIO secret key not loaded"));
        }

        Ok(())
    }
}

impl Default for MinioConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            bucket_name: "ratesheets".to_string(),
            region: Some("us-east-1".to_string()),
            path_style: Some(true),
            tables_folder: None,
            access_key: None,
            secret_key: None,
            env_access_key: None,
            env_secret_key: None,
        }
    }
}
