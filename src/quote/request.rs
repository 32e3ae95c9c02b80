use crate::models::{CanonicalRateRow, ServiceLevel};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Everything an operator picks for one quote run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub service_level: ServiceLevel,
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    pub carriers: Vec<String>,
    /// Only used for port-to-door quotes.
    #[serde(default)]
    pub trucking_fee: f64,
    #[serde(default = "default_max_shown")]
    pub max_shown: usize,
    /// Drop rows that expire before this date.
    #[serde(default)]
    pub valid_on: Option<NaiveDate>,
    #[serde(default)]
    pub adjustment: RateAdjustment,
    #[serde(default)]
    pub keyword: KeywordFilter,
    #[serde(default, rename = "carrier_choice")]
    pub carrier_choices: Vec<CarrierChoice>,
}

fn default_max_shown() -> usize {
    5
}

/// Signed flat deltas added to the base rates before all-in totals are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RateAdjustment {
    #[serde(default)]
    pub delta_20ft: f64,
    #[serde(default)]
    pub delta_40ft: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMode {
    #[default]
    #[serde(rename = "none")]
    NoFilter,
    Keep,
    Exclude,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordFilter {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub mode: KeywordMode,
}

impl KeywordFilter {
    /// Case-insensitive substring test against remark and commission text.
    /// An empty keyword filters nothing.
    pub fn accepts(&self, row: &CanonicalRateRow) -> bool {
        let needle = self.text.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let found = row.keyword_haystack().to_lowercase().contains(&needle);
        match self.mode {
            KeywordMode::NoFilter => true,
            KeywordMode::Keep => found,
            KeywordMode::Exclude => !found,
        }
    }
}

/// Per-carrier override of the default "cheapest 20ft sailing" pick. Without
/// `origin`/`destination` it applies to every lane of that carrier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarrierChoice {
    pub carrier: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub exclude: bool,
    /// Index into the carrier's sailings ranked by 20ft all-in, 0 = cheapest.
    #[serde(default)]
    pub sailing: usize,
}

impl CarrierChoice {
    pub fn applies_to(&self, origin: &str, destination: &str, carrier: &str) -> bool {
        let same = |a: &str, b: &str| normalize_label(a) == normalize_label(b);
        same(&self.carrier, carrier)
            && self.origin.as_deref().is_none_or(|o| same(o, origin))
            && self.destination.as_deref().is_none_or(|d| same(d, destination))
    }
}

/// Upper-cased with runs of whitespace collapsed, for lane comparisons.
pub fn normalize_label(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

impl QuoteRequest {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read quote request: {}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid quote request: {}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let request: QuoteRequest =
            toml::from_str(content).context("Failed to parse quote request")?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.origins.is_empty() || self.destinations.is_empty() || self.carriers.is_empty() {
            return Err(anyhow!(
                "A quote needs at least one origin, destination and carrier"
            ));
        }

        if self.max_shown == 0 {
            return Err(anyhow!("max_shown must be at least 1"));
        }

        if !self.trucking_fee.is_finite() || self.trucking_fee < 0.0 {
            return Err(anyhow!("trucking_fee must be a non-negative amount"));
        }

        Ok(())
    }

    /// Rows still valid on `valid_on`. Rows without an expiry date stay.
    pub fn is_current(&self, row: &CanonicalRateRow) -> bool {
        match (self.valid_on, row.expiring_date) {
            (Some(day), Some(expiry)) => expiry >= day,
            _ => true,
        }
    }

    pub fn choice_for(&self, origin: &str, destination: &str, carrier: &str) -> Option<&CarrierChoice> {
        self.carrier_choices
            .iter()
            .find(|c| c.applies_to(origin, destination, carrier))
    }
}
