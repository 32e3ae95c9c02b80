use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical column names, in persisted order.
pub const POL: &str = "POL";
pub const CARRIER: &str = "Carrier";
pub const TRANSIT_TIME: &str = "T_T_TO_POD";
pub const DESTINATION: &str = "Destination";
pub const EFFECTIVE_DATE: &str = "Effective_Date";
pub const EXPIRING_DATE: &str = "Expiring_Date";
pub const GP20: &str = "GP20";
pub const GP40: &str = "GP40";
pub const HQ40: &str = "HQ40";
pub const HQ45: &str = "HQ45";
pub const COMM: &str = "COMM";
pub const COMM_DETAILS: &str = "COMM_DETAILS";
pub const COMMODITY: &str = "COMMODITY";
pub const REMARK: &str = "remark";

pub const CANONICAL_COLUMNS: [&str; 14] = [
    POL,
    CARRIER,
    TRANSIT_TIME,
    DESTINATION,
    EFFECTIVE_DATE,
    EXPIRING_DATE,
    GP20,
    GP40,
    HQ40,
    HQ45,
    COMM,
    COMM_DETAILS,
    COMMODITY,
    REMARK,
];

pub const RATE_COLUMNS: [&str; 4] = [GP20, GP40, HQ40, HQ45];

/// Values that mean "nothing here" in rate sheets.
pub const BLANK_SENTINELS: [&str; 4] = ["", "NIL", "-", "—"];

pub fn is_blank_sentinel(value: &str) -> bool {
    let upper = value.trim().to_uppercase();
    BLANK_SENTINELS.contains(&upper.as_str())
}

/// One untyped spreadsheet cell as read from a workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Spreadsheet date serial (days since 1899-12-30).
    DateSerial(f64),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Number(_) | Cell::DateSerial(_))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) | Cell::DateSerial(n) => {
                // Whole numbers print without a trailing ".0"
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// First worksheet of one source workbook, row-major.
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub source_filename: String,
    pub rows: Vec<Vec<Cell>>,
}

/// A sheet after the header row has been picked: named columns over data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub source_filename: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Splits a sheet at `header_row`. Blank header cells become `Unnamed_<i>` and
    /// repeated names get `.1`, `.2`, ... suffixes.
    pub fn from_sheet(sheet: &RawSheet, header_row: usize) -> Self {
        let header_cells = sheet.rows.get(header_row).cloned().unwrap_or_default();
        let width = sheet
            .rows
            .iter()
            .skip(header_row)
            .map(|r| r.len())
            .max()
            .unwrap_or(0);

        let mut headers: Vec<String> = Vec::with_capacity(width);
        for i in 0..width {
            let raw = header_cells
                .get(i)
                .map(|c| c.to_string().trim().to_string())
                .unwrap_or_default();
            let base = if raw.is_empty() {
                format!("Unnamed_{}", i)
            } else {
                raw
            };

            let mut name = base.clone();
            let mut suffix = 1;
            while headers.contains(&name) {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            headers.push(name);
        }

        let rows = sheet
            .rows
            .iter()
            .skip(header_row + 1)
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .map(|row| {
                let mut padded = row.clone();
                padded.resize(width, Cell::Empty);
                padded
            })
            .collect();

        RawTable {
            source_filename: sheet.source_filename.clone(),
            headers,
            rows,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().map(move |row| row.get(index).unwrap_or(&Cell::Empty))
    }
}

/// The unit of record after normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRateRow {
    pub origin_port: String,
    pub destination: String,
    pub carrier: String,
    pub transit_time_days: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiring_date: Option<NaiveDate>,
    pub rate_20ft: Option<f64>,
    pub rate_40ft: Option<f64>,
    pub rate_40hc: Option<f64>,
    pub rate_45hc: Option<f64>,
    pub commission: Option<String>,
    pub commission_details: Option<String>,
    pub commodity: Option<String>,
    pub remark: Option<String>,
    pub source_table: String,
}

impl CanonicalRateRow {
    pub fn has_any_rate(&self) -> bool {
        self.rate_20ft.is_some()
            || self.rate_40ft.is_some()
            || self.rate_40hc.is_some()
            || self.rate_45hc.is_some()
    }

    /// Text searched by the quote keyword filter.
    pub fn keyword_haystack(&self) -> String {
        [&self.remark, &self.commission, &self.commission_details]
            .iter()
            .filter_map(|v| v.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceLevel {
    #[serde(rename = "Port to Port", alias = "port_to_port")]
    PortToPort,
    #[serde(rename = "Port to Door", alias = "port_to_door")]
    PortToDoor,
}

impl fmt::Display for ServiceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceLevel::PortToPort => write!(f, "Port to Port"),
            ServiceLevel::PortToDoor => write!(f, "Port to Door"),
        }
    }
}

/// A rate row priced for one service level. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRow {
    pub rate: CanonicalRateRow,
    pub service_level: ServiceLevel,
    pub adjusted_20ft: Option<f64>,
    pub adjusted_40ft: Option<f64>,
    pub all_in_20ft: Option<f64>,
    pub all_in_40ft_or_hc: Option<f64>,
    pub charges: AccessorialCharges,
}

/// Accessorial charges applied to one quote row; `None` means "AT COST".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessorialCharges {
    pub isf: Option<f64>,
    pub handling: Option<f64>,
    pub customs_clearance: Option<f64>,
    pub duty: Option<f64>,
    pub trucking_fee: Option<f64>,
    pub ctf_pp_20ft: Option<f64>,
    pub ctf_pp_40ft: Option<f64>,
    pub chassis_fee: Option<f64>,
}
