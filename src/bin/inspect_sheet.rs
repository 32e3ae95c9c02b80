use anyhow::{Result, anyhow};
use ratesheet_pipeline::config::PipelineConfig;
use ratesheet_pipeline::fetcher::SheetFetcher;
use ratesheet_pipeline::processor::RateSheetNormalizer;
use std::env;
use std::path::Path;

/// Prints how one workbook is read and normalized, without storing anything.
fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: inspect_sheet <workbook.xlsx> [pipeline.toml]"))?;
    let config = match env::args().nth(2) {
        Some(config_path) => PipelineConfig::from_file(&config_path)?,
        None => PipelineConfig::default(),
    };

    let path = Path::new(&path);
    let fetcher = SheetFetcher::new(path.parent().unwrap_or(Path::new(".")));
    let sheet = fetcher.read_sheet(path)?;
    let normalizer = RateSheetNormalizer::new(&config, config.load_alias_tables()?)?;

    println!("=== INSPECTING {} ===\n", sheet.source_filename);
    println!("Raw rows: {}", sheet.rows.len());

    let (header_row, table) = normalizer.resolve_columns(&sheet);
    println!("Header row: {}", header_row);
    println!("Normalized columns: {:?}", table.headers);
    println!("Data rows: {}\n", table.rows.len());

    let normalized = normalizer.normalize(&sheet)?;
    println!("Table name: {}", normalized.name);
    println!("Rows with a usable rate: {}\n", normalized.data.height());
    println!("{}", normalized.data.head(Some(10)));

    Ok(())
}
