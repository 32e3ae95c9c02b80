use crate::config::PipelineConfig;
use crate::models::{Cell, RawSheet};
use anyhow::{Context, Result, anyhow};
use calamine::{open_workbook_auto, Data, Reader};
use glob::glob;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Finds rate-sheet workbooks and reads their first worksheet.
pub struct SheetFetcher {
    input_dir: PathBuf,
}

impl SheetFetcher {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        SheetFetcher {
            input_dir: input_dir.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.input_dir)
    }

    /// `*.xlsx` files in the input directory, sorted by path. Office lock files
    /// (`~$name.xlsx`) are skipped.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.input_dir.is_dir() {
            return Err(anyhow!(
                "Input directory does not exist: {}",
                self.input_dir.display()
            ));
        }

        let pattern = format!("{}/*.xlsx", self.input_dir.display());
        let mut files: Vec<PathBuf> = glob(&pattern)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("⚠️ Unreadable entry in {}: {}", self.input_dir.display(), e);
                    None
                }
            })
            .filter(|path| {
                !path
                    .file_name()
                    .map(|n| n.to_string_lossy().starts_with("~$"))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        info!("📂 Found {} rate sheet(s) in {}", files.len(), self.input_dir.display());
        Ok(files)
    }

    pub fn read_sheet(&self, path: &Path) -> Result<RawSheet> {
        let source_filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Not a file path: {}", path.display()))?;

        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook {}", path.display()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| anyhow!("No worksheet found in {}", source_filename))?
            .with_context(|| format!("Failed to read first worksheet of {}", source_filename))?;

        // The range starts at the first used cell; pad back to sheet coordinates
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; col_offset];
            cells.extend(row.iter().map(to_cell));
            rows.push(cells);
        }

        debug!(
            "Read {} rows from {} (first used cell at {},{})",
            rows.len(),
            source_filename,
            row_offset,
            col_offset
        );

        Ok(RawSheet {
            source_filename,
            rows,
        })
    }
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::DateSerial(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{Format, Workbook};
    use tempfile::tempdir;

    fn write_workbook(path: &Path) {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");

        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "ACME RATE SHEET").unwrap();
        sheet.write_string(2, 0, "POL").unwrap();
        sheet.write_string(2, 1, "20GP").unwrap();
        sheet.write_string(2, 2, "EFFECTIVE DATE").unwrap();
        sheet.write_string(3, 0, "NINGBO").unwrap();
        sheet.write_number(3, 1, 1200.0).unwrap();
        sheet
            .write_number_with_format(3, 2, 45839.0, &date_format)
            .unwrap();
        sheet.write_boolean(4, 0, true).unwrap();

        // Only the first worksheet is read
        let second = workbook.add_worksheet();
        second.write_string(0, 0, "ignored").unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn test_read_first_worksheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("carrier_2025.xlsx");
        write_workbook(&path);

        let sheet = SheetFetcher::new(dir.path()).read_sheet(&path).unwrap();
        assert_eq!(sheet.source_filename, "carrier_2025.xlsx");
        assert_eq!(sheet.rows.len(), 5);
        assert_eq!(sheet.rows[0][0], Cell::Text("ACME RATE SHEET".to_string()));
        assert!(sheet.rows[1].iter().all(|c| c.is_empty()));
        assert_eq!(sheet.rows[2][0], Cell::Text("POL".to_string()));
        assert_eq!(sheet.rows[3][1], Cell::Number(1200.0));
        assert_eq!(sheet.rows[3][2], Cell::DateSerial(45839.0));
        assert_eq!(sheet.rows[4][0], Cell::Bool(true));
    }

    #[test]
    fn test_leading_blank_rows_and_columns_are_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 1, "POL").unwrap();
        sheet.write_string(3, 1, "XIAMEN").unwrap();
        workbook.save(&path).unwrap();

        let sheet = SheetFetcher::new(dir.path()).read_sheet(&path).unwrap();
        assert_eq!(sheet.rows.len(), 4);
        assert!(sheet.rows[0].is_empty());
        assert_eq!(sheet.rows[2], vec![Cell::Empty, Cell::Text("POL".to_string())]);
    }

    #[test]
    fn test_discover_only_workbooks() {
        let dir = tempdir().unwrap();
        write_workbook(&dir.path().join("b_rates.xlsx"));
        write_workbook(&dir.path().join("a_rates.xlsx"));
        std::fs::write(dir.path().join("notes.txt"), "not a sheet").unwrap();
        std::fs::write(dir.path().join("~$a_rates.xlsx"), "lock").unwrap();

        let files = SheetFetcher::new(dir.path()).discover().unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a_rates.xlsx", "b_rates.xlsx"]);
    }

    #[test]
    fn test_missing_input_dir() {
        let dir = tempdir().unwrap();
        let fetcher = SheetFetcher::new(dir.path().join("nope"));
        assert!(fetcher.discover().is_err());
    }

    #[test]
    fn test_corrupt_workbook_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, "definitely not a zip").unwrap();

        assert!(SheetFetcher::new(dir.path()).read_sheet(&path).is_err());
    }
}
