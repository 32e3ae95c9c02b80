use crate::config::PipelineConfig;
use crate::models::{AliasTables, RawSheet, RawTable, CARRIER, DESTINATION, POL};
use crate::processor::{
    DateNormalizer, FuzzyMatcher, HeaderLocator, RateAssembler, SchemaNormalizer, SheetFlattener,
};
use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::info;

/// One source workbook after normalization, ready to replace its table.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub name: String,
    pub source_filename: String,
    pub data: DataFrame,
}

/// Runs every normalization stage over a sheet. Each stage takes the previous
/// stage's output by value and returns a new table.
pub struct RateSheetNormalizer {
    locator: HeaderLocator,
    schema: SchemaNormalizer,
    flattener: SheetFlattener,
    dates: DateNormalizer,
    assembler: RateAssembler,
    aliases: AliasTables,
}

impl RateSheetNormalizer {
    pub fn new(config: &PipelineConfig, aliases: AliasTables) -> Result<Self> {
        Ok(RateSheetNormalizer {
            locator: HeaderLocator::new(config.header_scan_rows),
            schema: SchemaNormalizer::new()?,
            flattener: SheetFlattener::new(),
            dates: DateNormalizer::new(config.fallback_year)?,
            assembler: RateAssembler::new(&config.table_prefix)?,
            aliases,
        })
    }

    pub fn table_name(&self, source_filename: &str) -> String {
        self.assembler.table_name(source_filename)
    }

    /// Header row and cleaned column names, without touching the data.
    pub fn resolve_columns(&self, sheet: &RawSheet) -> (usize, RawTable) {
        let header_row = self.locator.detect_header_row(&sheet.rows);
        let table = RawTable::from_sheet(sheet, header_row);
        (header_row, self.schema.normalize(table))
    }

    pub fn normalize(&self, sheet: &RawSheet) -> Result<NormalizedTable> {
        let filename = sheet.source_filename.as_str();
        info!("📥 Normalizing {} ({} raw rows)", filename, sheet.rows.len());

        let (_, table) = self.resolve_columns(sheet);
        let df = self
            .flattener
            .flatten_to_dataframe(&table)
            .with_context(|| format!("Failed to flatten {}", filename))?;

        let df = FuzzyMatcher::new(&self.aliases.ports).apply_to_column(df, POL)?;
        let df = FuzzyMatcher::new(&self.aliases.carriers).apply_to_column(df, CARRIER)?;
        let df = FuzzyMatcher::new(&self.aliases.cities).apply_to_column(df, DESTINATION)?;

        let df = self
            .dates
            .normalize_dataframe(df, filename)
            .with_context(|| format!("Failed to normalize dates in {}", filename))?;

        let data = self
            .assembler
            .assemble(df)
            .with_context(|| format!("Failed to assemble rate rows for {}", filename))?;

        Ok(NormalizedTable {
            name: self.assembler.table_name(filename),
            source_filename: filename.to_string(),
            data,
        })
    }
}
