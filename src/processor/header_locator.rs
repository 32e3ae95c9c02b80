use crate::models::Cell;
use tracing::{debug, info, warn};

/// Every known rate-sheet header row carries this token somewhere.
pub const HEADER_MARKER: &str = "POL";

pub struct HeaderLocator {
    scan_rows: usize,
}

impl HeaderLocator {
    pub fn new(scan_rows: usize) -> Self {
        HeaderLocator { scan_rows }
    }

    /// Index of the header row within the first `scan_rows` rows. Falls back to 0
    /// (with a warning) when no row carries the marker.
    pub fn detect_header_row(&self, rows: &[Vec<Cell>]) -> usize {
        let window = &rows[..rows.len().min(self.scan_rows)];

        for (i, row) in window.iter().enumerate() {
            let row_str = row
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            debug!("🔍 Check row {}: {}", i, row_str);

            if row_str.to_uppercase().contains(HEADER_MARKER) {
                info!("✅ Found '{}' at row {}", HEADER_MARKER, i);
                return i;
            }
        }

        warn!(
            "⚠️ Cannot find '{}' in the first {} rows, assuming row 0 is the header",
            HEADER_MARKER,
            window.len()
        );
        0
    }
}

impl Default for HeaderLocator {
    fn default() -> Self {
        Self::new(10)
    }
}
