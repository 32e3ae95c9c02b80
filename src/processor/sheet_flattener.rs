use crate::models::{Cell, RawTable};
use anyhow::{Result, anyhow};
use polars::prelude::*;
use tracing::info;

/// Turns a header-resolved sheet into a DataFrame. Columns whose non-empty cells
/// are all numeric become Float64; everything else becomes String.
pub struct SheetFlattener;

impl SheetFlattener {
    pub fn new() -> Self {
        SheetFlattener
    }

    pub fn flatten_to_dataframe(&self, table: &RawTable) -> Result<DataFrame> {
        if table.headers.is_empty() {
            return Ok(DataFrame::empty());
        }

        let mut columns: Vec<Column> = Vec::with_capacity(table.headers.len());
        let mut numeric_count = 0;

        for (idx, header) in table.headers.iter().enumerate() {
            let cells: Vec<&Cell> = table.column(idx).collect();
            let series = if is_numeric_column(&cells) {
                numeric_count += 1;
                numeric_series(header, &cells)
            } else {
                text_series(header, &cells)
            };
            columns.push(series.into_column());
        }

        let df = DataFrame::new(columns)
            .map_err(|e| anyhow!("Failed to build DataFrame for {}: {}", table.source_filename, e))?;

        info!(
            "Flattened {} into {} rows x {} columns ({} numeric)",
            table.source_filename,
            df.height(),
            df.width(),
            numeric_count
        );

        Ok(df)
    }
}

impl Default for SheetFlattener {
    fn default() -> Self {
        Self::new()
    }
}

fn is_numeric_column(cells: &[&Cell]) -> bool {
    let mut saw_value = false;
    for cell in cells {
        if cell.is_empty() {
            continue;
        }
        if !cell.is_numeric() {
            return false;
        }
        saw_value = true;
    }
    saw_value
}

fn numeric_series(name: &str, cells: &[&Cell]) -> Series {
    let values: Vec<Option<f64>> = cells
        .iter()
        .map(|cell| match cell {
            Cell::Number(n) | Cell::DateSerial(n) => Some(*n),
            _ => None,
        })
        .collect();
    Series::new(name.into(), values)
}

fn text_series(name: &str, cells: &[&Cell]) -> Series {
    let values: Vec<Option<String>> = cells
        .iter()
        .map(|cell| match cell {
            Cell::Empty => None,
            other => Some(other.to_string()),
        })
        .collect();
    Series::new(name.into(), values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_types_are_inferred() {
        let table = RawTable {
            source_filename: "x.xlsx".to_string(),
            headers: vec!["POL".into(), "GP20".into(), "Effective_Date".into(), "Empty".into()],
            rows: vec![
                vec![
                    Cell::Text("YANTIAN".into()),
                    Cell::Number(1000.0),
                    Cell::DateSerial(45658.0),
                    Cell::Empty,
                ],
                vec![
                    Cell::Text("NINGBO".into()),
                    Cell::Empty,
                    Cell::Text("NIL".into()),
                    Cell::Empty,
                ],
            ],
        };

        let df = SheetFlattener::new().flatten_to_dataframe(&table).unwrap();
        assert_eq!(df.shape(), (2, 4));
        assert_eq!(df.column("POL").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("GP20").unwrap().dtype(), &DataType::Float64);
        // A sentinel mixed into a serial column keeps the whole column textual
        assert_eq!(df.column("Effective_Date").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("Empty").unwrap().dtype(), &DataType::String);

        let dates: Vec<Option<&str>> = df
            .column("Effective_Date")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(dates, vec![Some("45658"), Some("NIL")]);

        let rates: Vec<Option<f64>> = df.column("GP20").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(rates, vec![Some(1000.0), None]);
    }
}
