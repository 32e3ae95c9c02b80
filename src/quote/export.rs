use crate::config::AT_COST;
use crate::models::{QuoteRow, ServiceLevel};
use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

const PORT_TO_DOOR_COLUMNS: [&str; 4] = ["Trucking Fee", "CTF/PP 20'", "CTF/PP 40'", "Chassis Fee"];

/// Header row of the export for one service level.
pub fn export_columns(service_level: ServiceLevel) -> Vec<&'static str> {
    let mut columns = vec![
        "Origin",
        "Destination",
        "Carrier",
        "Service Level",
        "Transit Time",
        "Effective Date",
        "Expiring Date",
        "20GP",
        "40GP/HC",
        "ISF",
        "Handling",
        "Customs Clearance",
        "Duty",
    ];
    if service_level == ServiceLevel::PortToDoor {
        columns.extend(PORT_TO_DOOR_COLUMNS);
    }
    columns.extend(["All-in 20'", "All-in 40'/HC", "Remark", "Source"]);
    columns
}

fn charge_text(amount: Option<f64>) -> String {
    match amount {
        Some(v) => format!("{:.2}", v),
        None => AT_COST.to_string(),
    }
}

/// Builds the export table. Rates are the adjusted base rates.
pub fn quote_frame<'a>(
    quotes: impl IntoIterator<Item = &'a QuoteRow>,
    service_level: ServiceLevel,
) -> Result<DataFrame> {
    let quotes: Vec<&QuoteRow> = quotes.into_iter().collect();

    let text = |f: &dyn Fn(&QuoteRow) -> Option<String>| -> Vec<Option<String>> {
        quotes.iter().map(|q| f(q)).collect()
    };
    let amount = |f: &dyn Fn(&QuoteRow) -> Option<f64>| -> Vec<Option<f64>> {
        quotes.iter().map(|q| f(q)).collect()
    };
    let charge = |f: &dyn Fn(&QuoteRow) -> Option<f64>| -> Vec<String> {
        quotes.iter().map(|q| charge_text(f(q))).collect()
    };
    let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());

    let mut columns: Vec<Column> = vec![
        Series::new("Origin".into(), text(&|q| Some(q.rate.origin_port.clone()))).into_column(),
        Series::new("Destination".into(), text(&|q| Some(q.rate.destination.clone()))).into_column(),
        Series::new("Carrier".into(), text(&|q| Some(q.rate.carrier.clone()))).into_column(),
        Series::new("Service Level".into(), text(&|q| Some(q.service_level.to_string()))).into_column(),
        Series::new("Transit Time".into(), text(&|q| q.rate.transit_time_days.clone())).into_column(),
        Series::new("Effective Date".into(), text(&|q| date(q.rate.effective_date))).into_column(),
        Series::new("Expiring Date".into(), text(&|q| date(q.rate.expiring_date))).into_column(),
        Series::new("20GP".into(), amount(&|q| q.adjusted_20ft)).into_column(),
        Series::new("40GP/HC".into(), amount(&|q| q.adjusted_40ft)).into_column(),
        Series::new("ISF".into(), charge(&|q| q.charges.isf)).into_column(),
        Series::new("Handling".into(), charge(&|q| q.charges.handling)).into_column(),
        Series::new("Customs Clearance".into(), charge(&|q| q.charges.customs_clearance)).into_column(),
        Series::new("Duty".into(), charge(&|q| q.charges.duty)).into_column(),
    ];

    if service_level == ServiceLevel::PortToDoor {
        columns.extend([
            Series::new("Trucking Fee".into(), charge(&|q| q.charges.trucking_fee)).into_column(),
            Series::new("CTF/PP 20'".into(), charge(&|q| q.charges.ctf_pp_20ft)).into_column(),
            Series::new("CTF/PP 40'".into(), charge(&|q| q.charges.ctf_pp_40ft)).into_column(),
            Series::new("Chassis Fee".into(), charge(&|q| q.charges.chassis_fee)).into_column(),
        ]);
    }

    columns.extend([
        Series::new("All-in 20'".into(), amount(&|q| q.all_in_20ft)).into_column(),
        Series::new("All-in 40'/HC".into(), amount(&|q| q.all_in_40ft_or_hc)).into_column(),
        Series::new("Remark".into(), text(&|q| q.rate.remark.clone())).into_column(),
        Series::new("Source".into(), text(&|q| Some(q.rate.source_table.clone()))).into_column(),
    ]);

    Ok(DataFrame::new(columns)?)
}

pub fn write_quote_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create quote file: {}", path.display()))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write quote file: {}", path.display()))?;

    info!("💾 Wrote {} quote row(s) to {}", df.height(), path.display());
    Ok(())
}
