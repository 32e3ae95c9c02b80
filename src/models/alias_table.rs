use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_PORTS: &str = include_str!("../configs/aliases/ports.toml");
const DEFAULT_CARRIERS: &str = include_str!("../configs/aliases/carriers.toml");
const DEFAULT_CITIES: &str = include_str!("../configs/aliases/cities.toml");

/// Which field an alias table canonicalizes. The kind decides how a value is
/// split and compared during matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasKind {
    Port,
    Carrier,
    City,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub label: String,
    pub aliases: Vec<String>,
}

/// Canonical label -> recognized aliases, in file order. Aliases are stored
/// upper-cased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasTable {
    pub kind: AliasKind,
    #[serde(rename = "entry", default)]
    pub entries: Vec<AliasEntry>,
}

impl AliasTable {
    pub fn new(kind: AliasKind, entries: &[(&str, &[&str])]) -> Self {
        let entries = entries
            .iter()
            .map(|(label, aliases)| AliasEntry {
                label: label.to_string(),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
            })
            .collect();

        Self { kind, entries }.upper_cased()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: AliasTable = toml::from_str(content).context("Failed to parse alias table")?;
        Ok(table.upper_cased())
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read alias table: {}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid alias table: {}", path))
    }

    /// Built-in table for `kind`, compiled into the binary.
    pub fn builtin(kind: AliasKind) -> Result<Self> {
        let content = match kind {
            AliasKind::Port => DEFAULT_PORTS,
            AliasKind::Carrier => DEFAULT_CARRIERS,
            AliasKind::City => DEFAULT_CITIES,
        };
        let table = Self::from_toml_str(content)?;
        if table.kind != kind {
            anyhow::bail!("Built-in alias table declares {:?}, expected {:?}", table.kind, kind);
        }
        Ok(table)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    /// Every alias paired with the label that owns it, in table order.
    pub fn alias_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|e| e.aliases.iter().map(move |a| (a.as_str(), e.label.as_str())))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn upper_cased(mut self) -> Self {
        for entry in &mut self.entries {
            for alias in &mut entry.aliases {
                *alias = alias.trim().to_uppercase();
            }
        }
        self
    }
}

/// The three tables used by the normalizer, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AliasTables {
    pub ports: AliasTable,
    pub carriers: AliasTable,
    pub cities: AliasTable,
}

impl AliasTables {
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            ports: AliasTable::builtin(AliasKind::Port)?,
            carriers: AliasTable::builtin(AliasKind::Carrier)?,
            cities: AliasTable::builtin(AliasKind::City)?,
        })
    }
}
