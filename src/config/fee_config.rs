use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const AT_COST: &str = "AT COST";

/// An accessorial charge: a flat amount, or billed at cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFee", into = "RawFee")]
pub enum FeeAmount {
    Amount(f64),
    AtCost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawFee {
    Number(f64),
    Text(String),
}

impl TryFrom<RawFee> for FeeAmount {
    type Error = String;

    fn try_from(raw: RawFee) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawFee::Number(n) => Ok(FeeAmount::Amount(n)),
            RawFee::Text(s) if s.trim().eq_ignore_ascii_case(AT_COST) => Ok(FeeAmount::AtCost),
            RawFee::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(FeeAmount::Amount)
                .map_err(|_| format!("fee must be a number or \"{}\", got {:?}", AT_COST, s)),
        }
    }
}

impl From<FeeAmount> for RawFee {
    fn from(fee: FeeAmount) -> Self {
        match fee {
            FeeAmount::Amount(n) => RawFee::Number(n),
            FeeAmount::AtCost => RawFee::Text(AT_COST.to_string()),
        }
    }
}

impl FeeAmount {
    /// The amount that enters an all-in total. At-cost charges contribute nothing.
    pub fn as_amount(&self) -> Option<f64> {
        match self {
            FeeAmount::Amount(n) => Some(*n),
            FeeAmount::AtCost => None,
        }
    }
}

impl fmt::Display for FeeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeAmount::Amount(n) => write!(f, "{}", n),
            FeeAmount::AtCost => write!(f, "{}", AT_COST),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeScheduleFile {
    pub fees: FeeSchedule,
}

/// Accessorial charges added on top of base container rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub isf: FeeAmount,
    pub handling: FeeAmount,
    pub customs_clearance: FeeAmount,
    pub duty: FeeAmount,
    /// Port-to-door surcharge for 20ft containers (CTF/PP).
    pub ctf_pp_20ft: FeeAmount,
    pub ctf_pp_40ft: FeeAmount,
    pub chassis_fee: FeeAmount,
}

impl FeeSchedule {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fee schedule: {}", path))?;

        let file: FeeScheduleFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse fee schedule: {}", path))?;

        Ok(file.fees)
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            isf: FeeAmount::Amount(25.0),
            handling: FeeAmount::Amount(50.0),
            customs_clearance: FeeAmount::Amount(80.0),
            duty: FeeAmount::AtCost,
            ctf_pp_20ft: FeeAmount::Amount(48.0),
            ctf_pp_40ft: FeeAmount::Amount(48.0),
            chassis_fee: FeeAmount::Amount(100.0),
        }
    }
}
