use anyhow::{Context, Result, anyhow};
use ratesheet_pipeline::config::{FeeSchedule, MinioConfig, PipelineConfig};
use ratesheet_pipeline::fetcher::SheetFetcher;
use ratesheet_pipeline::processor::RateSheetNormalizer;
use ratesheet_pipeline::quote::{QuoteComposer, QuoteRequest, quote_frame, write_quote_csv};
use ratesheet_pipeline::storage::{MinioStorage, TableStore, load_rate_rows};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const PIPELINE_CONFIG: &str = "src/configs/pipeline.toml";
const MINIO_CONFIG: &str = "src/configs/minio.toml";

enum Mode {
    Ingest,
    Quote { request: String, out: PathBuf },
}

fn parse_args(args: &[String]) -> Result<Mode> {
    let value_after = |flag: &str| -> Option<&String> {
        args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1))
    };

    if args.iter().any(|a| a == "--quote" || a == "-q") {
        let request = value_after("--quote")
            .or_else(|| value_after("-q"))
            .ok_or_else(|| anyhow!("--quote needs a request file, e.g. --quote src/configs/quote_request.toml"))?;
        let out = value_after("--out").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("quote.csv"));
        return Ok(Mode::Quote {
            request: request.clone(),
            out,
        });
    }

    Ok(Mode::Ingest)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let mode = parse_args(&args)?;

    // Everything below fails fast before any file is touched
    let config = PipelineConfig::from_file(PIPELINE_CONFIG)
        .context("Failed to load pipeline configuration")?;
    let fees = FeeSchedule::from_file(&config.fees_path).context("Failed to load fee schedule")?;
    let minio_config = MinioConfig::from_file(MINIO_CONFIG)
        .context("Failed to load MinIO configuration")?;

    info!(
        "Loaded MinIO configuration: {}@{}",
        minio_config.endpoint, minio_config.bucket_name
    );

    let storage = MinioStorage::from_config(&minio_config)
        .context("Failed to initialize MinIO storage")
        .with_context(|| {
            "Please ensure MinIO is running and MINIO_ACCESS_KEY / MINIO_SECRET_KEY are set"
        })?;
    storage.ensure_bucket().await?;

    match mode {
        Mode::Ingest => {
            info!("🚀 Starting rate sheet ingest from {}", config.input_dir);
            run_ingest(&config, &storage).await
        }
        Mode::Quote { request, out } => {
            info!("🚀 Composing quotes for {}", request);
            run_quote(&config, &fees, &storage, &request, &out).await
        }
    }
}

async fn run_ingest(config: &PipelineConfig, store: &dyn TableStore) -> Result<()> {
    let aliases = config.load_alias_tables().context("Failed to load alias tables")?;
    info!(
        "Alias tables: {} ports, {} carriers, {} cities",
        aliases.ports.len(),
        aliases.carriers.len(),
        aliases.cities.len()
    );

    let normalizer = RateSheetNormalizer::new(config, aliases)?;
    let fetcher = SheetFetcher::from_config(config);
    let files = fetcher.discover()?;

    let mut total_rows = 0;
    let mut successful = 0;

    for path in &files {
        info!("\n=== Processing {} ===", path.display());

        match ingest_file(path, &fetcher, &normalizer, store).await {
            Ok(rows) => {
                info!("✅ Loaded {} rows from {}", rows, path.display());
                total_rows += rows;
                successful += 1;
            }
            Err(e) => {
                // One bad workbook must not stop the batch
                error!("❌ Failed to process {}: {:#}", path.display(), e);
            }
        }
    }

    info!("\n=== Ingest Summary ===");
    info!("✅ Successfully processed {} out of {} files", successful, files.len());
    info!("📊 Total rate rows loaded: {}", total_rows);

    if successful == 0 && !files.is_empty() {
        warn!("⚠️ No rate sheets were processed successfully");
    }
    Ok(())
}

async fn ingest_file(
    path: &Path,
    fetcher: &SheetFetcher,
    normalizer: &RateSheetNormalizer,
    store: &dyn TableStore,
) -> Result<usize> {
    let sheet = fetcher.read_sheet(path)?;
    let table = normalizer.normalize(&sheet)?;

    if table.data.height() == 0 {
        warn!("⚠️ {} has no rows with a usable rate", table.source_filename);
    }

    store
        .replace_table(&table.name, &table.data)
        .await
        .with_context(|| format!("Failed to replace table {}", table.name))?;

    Ok(table.data.height())
}

async fn run_quote(
    config: &PipelineConfig,
    fees: &FeeSchedule,
    store: &dyn TableStore,
    request_path: &str,
    out: &Path,
) -> Result<()> {
    let request = QuoteRequest::from_file(request_path)?;

    // Read once for the whole request
    let rows = load_rate_rows(store, &config.table_prefix).await?;
    info!("Loaded {} rate rows", rows.len());

    let outcome = QuoteComposer::new(fees).compose(&rows, &request);

    if !outcome.unmatched.is_empty() {
        warn!(
            "⚠️ {} lane(s) without rates:\n{}",
            outcome.unmatched.len(),
            serde_json::to_string_pretty(&outcome.unmatched)?
        );
    }
    if !outcome.filtered_out.is_empty() {
        warn!(
            "⚠️ {} lane(s) emptied by the keyword filter:\n{}",
            outcome.filtered_out.len(),
            serde_json::to_string_pretty(&outcome.filtered_out)?
        );
    }

    let mut df = quote_frame(outcome.shown_rows(), request.service_level)?;
    write_quote_csv(&mut df, out)?;

    info!(
        "🎉 Quote ready: {} lane(s), {} row(s) shown",
        outcome.lanes.len(),
        df.height()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_default_mode_is_ingest() {
        assert!(matches!(parse_args(&args(&[])).unwrap(), Mode::Ingest));
    }

    #[test]
    fn test_quote_mode() {
        match parse_args(&args(&["--quote", "req.toml", "--out", "out.csv"])).unwrap() {
            Mode::Quote { request, out } => {
                assert_eq!(request, "req.toml");
                assert_eq!(out, PathBuf::from("out.csv"));
            }
            Mode::Ingest => panic!("expected quote mode"),
        }

        match parse_args(&args(&["-q", "req.toml"])).unwrap() {
            Mode::Quote { out, .. } => assert_eq!(out, PathBuf::from("quote.csv")),
            Mode::Ingest => panic!("expected quote mode"),
        }

        assert!(parse_args(&args(&["--quote"])).is_err());
    }
}
