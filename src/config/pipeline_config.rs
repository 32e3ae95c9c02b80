use crate::models::{AliasKind, AliasTable, AliasTables};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfigFile {
    pub pipeline: PipelineConfig,
}

/// Settings for the ingest and quote runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input_dir: String,
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    #[serde(default = "default_header_scan_rows")]
    pub header_scan_rows: usize,
    #[serde(default = "default_fallback_year")]
    pub fallback_year: i32,
    #[serde(default = "default_fees_path")]
    pub fees_path: String,
    // Optional replacements for the built-in alias tables
    pub ports_path: Option<String>,
    pub carriers_path: Option<String>,
    pub cities_path: Option<String>,
}

fn default_table_prefix() -> String {
    "cleaned_".to_string()
}

fn default_header_scan_rows() -> usize {
    10
}

fn default_fallback_year() -> i32 {
    2025
}

fn default_fees_path() -> String {
    "src/configs/fees.toml".to_string()
}

impl PipelineConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config file: {}", path))?;

        let config_file: PipelineConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse pipeline config file: {}", path))?;

        let config = config_file.pipeline;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("Pipeline input_dir cannot be empty"));
        }

        if self.header_scan_rows == 0 {
            return Err(anyhow::anyhow!("header_scan_rows must be at least 1"));
        }

        if !(1900..=2999).contains(&self.fallback_year) {
            return Err(anyhow::anyhow!(
                "fallback_year {} is out of range",
                self.fallback_year
            ));
        }

        Ok(())
    }

    /// Loads the alias tables, preferring configured files over the built-ins.
    pub fn load_alias_tables(&self) -> Result<AliasTables> {
        let load = |path: &Option<String>, kind: AliasKind| -> Result<AliasTable> {
            match path {
                Some(p) => {
                    let table = AliasTable::from_file(p)?;
                    if table.kind != kind {
                        anyhow::bail!("{} declares {:?}, expected {:?}", p, table.kind, kind);
                    }
                    Ok(table)
                }
                None => AliasTable::builtin(kind),
            }
        };

        Ok(AliasTables {
            ports: load(&self.ports_path, AliasKind::Port)?,
            carriers: load(&self.carriers_path, AliasKind::Carrier)?,
            cities: load(&self.cities_path, AliasKind::City)?,
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: "RateSheetFiles".to_string(),
            table_prefix: default_table_prefix(),
            header_scan_rows: default_header_scan_rows(),
            fallback_year: default_fallback_year(),
            fees_path: default_fees_path(),
            ports_path: None,
            carriers_path: None,
            cities_path: None,
        }
    }
}
