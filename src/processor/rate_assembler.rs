use crate::models::{
    CanonicalRateRow, Cell, CANONICAL_COLUMNS, CARRIER, COMM, COMMODITY, COMM_DETAILS, DESTINATION,
    EFFECTIVE_DATE, EXPIRING_DATE, GP20, GP40, HQ40, HQ45, POL, RATE_COLUMNS, REMARK, TRANSIT_TIME,
    is_blank_sentinel,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use regex::Regex;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Final stage before persistence: sentinel cleanup, rate parsing and projection
/// onto the fixed 14-column schema.
pub struct RateAssembler {
    table_prefix: String,
    invalid_chars: Regex,
    underscores: Regex,
}

impl RateAssembler {
    pub fn new(table_prefix: &str) -> Result<Self> {
        Ok(RateAssembler {
            table_prefix: table_prefix.to_string(),
            invalid_chars: Regex::new(r"[^a-z0-9_]")?,
            underscores: Regex::new(r"_+")?,
        })
    }

    /// `Rates - MSC (July) 2025.xlsx` -> `cleaned_rates_msc_july_2025`.
    /// A stem with nothing usable (e.g. `运价表.xlsx`) is named by its UTF-8
    /// bytes in hex so distinct files never share a table.
    pub fn table_name(&self, source_filename: &str) -> String {
        let stem = Path::new(source_filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| source_filename.to_string());

        let lowered = stem.to_lowercase();
        let replaced = self.invalid_chars.replace_all(&lowered, "_");
        let collapsed = self.underscores.replace_all(&replaced, "_");
        let cleaned = collapsed.trim_matches('_');
        if !cleaned.is_empty() {
            return format!("{}{}", self.table_prefix, cleaned);
        }

        let hex: String = stem.bytes().map(|b| format!("{:02x}", b)).collect();
        let name = format!("{}x{}", self.table_prefix, hex);
        warn!(
            "⚠️ {:?} has no letters or digits to name a table, using {}",
            source_filename, name
        );
        name
    }

    pub fn assemble(&self, mut df: DataFrame) -> Result<DataFrame> {
        let height = df.height();

        self.null_out_sentinels(&mut df)?;
        for col in RATE_COLUMNS {
            self.normalize_rate_column(&mut df, col)?;
        }

        for col in CANONICAL_COLUMNS {
            if df.column(col).is_err() {
                let dtype = if RATE_COLUMNS.contains(&col) {
                    DataType::Float64
                } else {
                    DataType::String
                };
                debug!("Column {} missing, filling with nulls", col);
                df.with_column(Series::full_null(col.into(), height, &dtype))?;
            } else if !RATE_COLUMNS.contains(&col) {
                self.normalize_text_column(&mut df, col)?;
            }
        }

        let dropped: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|name| !CANONICAL_COLUMNS.contains(&name.as_str()))
            .collect();
        if !dropped.is_empty() {
            debug!("Dropping non-canonical columns: {:?}", dropped);
        }

        let df = df.select(CANONICAL_COLUMNS)?;
        let df = drop_rows_without_rates(df)?;

        info!(
            "📦 Assembled {} of {} rows with a usable rate",
            df.height(),
            height
        );
        Ok(df)
    }

    /// Sentinel tokens in non-date text columns become nulls.
    fn null_out_sentinels(&self, df: &mut DataFrame) -> Result<()> {
        let text_columns: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|c| c.dtype() == &DataType::String)
            .map(|c| c.name().to_string())
            .filter(|name| !name.to_lowercase().contains("date"))
            .collect();

        for name in text_columns {
            let cleaned: Vec<Option<String>> = df
                .column(&name)?
                .str()?
                .into_iter()
                .map(|v| v.filter(|s| !is_blank_sentinel(s)).map(|s| s.to_string()))
                .collect();
            df.with_column(Series::new(name.as_str().into(), cleaned))?;
        }
        Ok(())
    }

    fn normalize_rate_column(&self, df: &mut DataFrame, col_name: &str) -> Result<()> {
        let Ok(column) = df.column(col_name) else {
            return Ok(());
        };
        if column.dtype() == &DataType::Float64 {
            return Ok(());
        }

        let text = column.cast(&DataType::String)?;
        let normalized: Vec<Option<f64>> = text
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_rate))
            .collect();

        df.with_column(Series::new(col_name.into(), normalized))?;
        Ok(())
    }

    fn normalize_text_column(&self, df: &mut DataFrame, col_name: &str) -> Result<()> {
        let column = df.column(col_name)?;
        if column.dtype() == &DataType::String {
            return Ok(());
        }

        let numeric = matches!(
            column.dtype(),
            DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
        );
        let rendered: Vec<Option<String>> = if numeric {
            column
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.map(|n| Cell::Number(n).to_string()))
                .collect()
        } else {
            column
                .cast(&DataType::String)?
                .str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        };

        df.with_column(Series::new(col_name.into(), rendered))?;
        Ok(())
    }
}

/// `"$1,250.00"` -> 1250.0. Anything non-numeric is missing, never zero.
pub fn parse_rate(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(['$', ','], "");
    let trimmed = cleaned.trim();
    f64::from_str(trimmed).ok().filter(|v| v.is_finite())
}

fn drop_rows_without_rates(df: DataFrame) -> Result<DataFrame> {
    let has_rate = RATE_COLUMNS
        .iter()
        .fold(lit(false), |acc, c| acc.or(col(*c).is_not_null()));

    Ok(df.lazy().filter(has_rate).collect()?)
}

/// Decodes a persisted table back into typed rows tagged with `table_name`.
pub fn rows_from_dataframe(df: &DataFrame, table_name: &str) -> Result<Vec<CanonicalRateRow>> {
    let pol = text_values(df, POL)?;
    let carrier = text_values(df, CARRIER)?;
    let transit = text_values(df, TRANSIT_TIME)?;
    let destination = text_values(df, DESTINATION)?;
    let effective = text_values(df, EFFECTIVE_DATE)?;
    let expiring = text_values(df, EXPIRING_DATE)?;
    let gp20 = rate_values(df, GP20)?;
    let gp40 = rate_values(df, GP40)?;
    let hq40 = rate_values(df, HQ40)?;
    let hq45 = rate_values(df, HQ45)?;
    let comm = text_values(df, COMM)?;
    let comm_details = text_values(df, COMM_DETAILS)?;
    let commodity = text_values(df, COMMODITY)?;
    let remark = text_values(df, REMARK)?;

    let rows = (0..df.height())
        .map(|i| CanonicalRateRow {
            origin_port: pol[i].clone().unwrap_or_default(),
            destination: destination[i].clone().unwrap_or_default(),
            carrier: carrier[i].clone().unwrap_or_default(),
            transit_time_days: transit[i].clone(),
            effective_date: parse_iso_date(&effective[i]),
            expiring_date: parse_iso_date(&expiring[i]),
            rate_20ft: gp20[i],
            rate_40ft: gp40[i],
            rate_40hc: hq40[i],
            rate_45hc: hq45[i],
            commission: comm[i].clone(),
            commission_details: comm_details[i].clone(),
            commodity: commodity[i].clone(),
            remark: remark[i].clone(),
            source_table: table_name.to_string(),
        })
        .collect();

    Ok(rows)
}

fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let Ok(column) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let text = column
        .cast(&DataType::String)
        .with_context(|| format!("Column {} is not readable as text", name))?;
    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

fn rate_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let Ok(column) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let rates = column
        .cast(&DataType::Float64)
        .with_context(|| format!("Column {} is not numeric", name))?;
    Ok(rates.f64()?.into_iter().collect())
}

fn parse_iso_date(value: &Option<String>) -> Option<NaiveDate> {
    value
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}
