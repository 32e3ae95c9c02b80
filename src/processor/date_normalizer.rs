use crate::models::is_blank_sentinel;
use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use regex::Regex;
use tracing::{debug, info, warn};

/// Text date layouts, tried in order; the first that parses wins.
const DATE_FORMATS: [&str; 11] = [
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%Y.%m.%d",
    "%d.%m.%Y",
    "%m/%d/%y",
    "%d/%m/%y",
    "%d-%b-%y",
];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// Largest serial we accept (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

/// Rewrites every `*date*` column into `YYYY-MM-DD` strings. Years more than one
/// away from the year in the file name are replaced by that year.
pub struct DateNormalizer {
    fallback_year: i32,
    year_regex: Regex,
}

impl DateNormalizer {
    pub fn new(fallback_year: i32) -> Result<Self> {
        Ok(DateNormalizer {
            fallback_year,
            year_regex: Regex::new(r"(?:^|[^0-9])(20[2-3][0-9])(?:[^0-9]|$)")?,
        })
    }

    /// Year declared by the source file name, or the configured fallback.
    pub fn expected_year(&self, filename: &str) -> i32 {
        self.year_regex
            .captures(filename)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(self.fallback_year)
    }

    pub fn normalize_dataframe(&self, mut df: DataFrame, filename: &str) -> Result<DataFrame> {
        let expected_year = self.expected_year(filename);
        let date_columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|name| name.to_lowercase().contains("date"))
            .collect();

        for name in date_columns {
            let column = df.column(&name)?;
            debug!("Column {}, Type: {:?}", name, column.dtype());

            let dates: Vec<Option<NaiveDate>> = if column.dtype() == &DataType::Float64 {
                column
                    .f64()?
                    .into_iter()
                    .map(|v| v.and_then(|serial| self.parse_serial(serial, expected_year)))
                    .collect()
            } else {
                let text = column.cast(&DataType::String)?;
                let mut failed = 0usize;
                let parsed: Vec<Option<NaiveDate>> = text
                    .str()?
                    .into_iter()
                    .map(|v| {
                        let v = v?;
                        let parsed = self.parse_text(v, expected_year);
                        if parsed.is_none() && !is_blank_sentinel(v) {
                            failed += 1;
                            warn!("⚠️ Unparseable date {:?} in {} ({}), left empty", v, name, filename);
                        }
                        parsed
                    })
                    .collect();
                if failed > 0 {
                    warn!("⚠️ {} value(s) in {} could not be parsed as dates", failed, name);
                }
                parsed
            };

            let rendered: Vec<Option<String>> = dates
                .iter()
                .map(|d| d.map(|d| d.format("%Y-%m-%d").to_string()))
                .collect();

            info!(
                "✅ Cleaned {} (expected year {}): {:?}",
                name,
                expected_year,
                rendered.iter().take(3).collect::<Vec<_>>()
            );
            df.with_column(Series::new(name.as_str().into(), rendered))?;
        }

        Ok(df)
    }

    /// Spreadsheet serial (days since 1899-12-30) to a year-corrected date.
    pub fn parse_serial(&self, serial: f64, expected_year: i32) -> Option<NaiveDate> {
        serial_to_date(serial).map(|d| correct_year(d, expected_year))
    }

    /// Parses one textual date. Sentinels, blanks and unknown layouts give `None`.
    pub fn parse_text(&self, value: &str, expected_year: i32) -> Option<NaiveDate> {
        let value = value.trim();
        if is_blank_sentinel(value) {
            return None;
        }

        // Serials that ended up in a text column next to sentinels
        if let Ok(serial) = value.parse::<f64>() {
            return self.parse_serial(serial, expected_year);
        }

        // %Y also takes "26", which the two-digit layouts must read as 2026
        let four_digit_year = |date: &NaiveDate| date.year() >= 100;
        let parsed = DATE_FORMATS
            .iter()
            .find_map(|fmt| {
                NaiveDate::parse_from_str(value, fmt)
                    .ok()
                    .filter(|d| fmt.contains("%y") || four_digit_year(d))
            })
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                    .map(|dt| dt.date())
                    .filter(four_digit_year)
            })?;

        Some(correct_year(parsed, expected_year))
    }
}

pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::try_days(serial.floor() as i64)?)
}

/// Forces the year to `expected_year` when the date is more than a year off.
/// 29 February moved into a non-leap year becomes the 28th.
pub fn correct_year(date: NaiveDate, expected_year: i32) -> NaiveDate {
    if (date.year() - expected_year).abs() <= 1 {
        return date;
    }

    date.with_year(expected_year)
        .or_else(|| NaiveDate::from_ymd_opt(expected_year, date.month(), 28))
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_expected_year_from_filename() {
        let normalizer = DateNormalizer::new(2025).unwrap();
        assert_eq!(normalizer.expected_year("MSC_rates_2024_July.xlsx"), 2024);
        assert_eq!(normalizer.expected_year("RateSheet2026.xlsx"), 2026);
        assert_eq!(normalizer.expected_year("rates_july.xlsx"), 2025);
        // Part of a longer number is not a year
        assert_eq!(normalizer.expected_year("quote_120245.xlsx"), 2025);
    }

    #[test]
    fn test_text_year_correction() {
        let normalizer = DateNormalizer::new(2025).unwrap();

        assert_eq!(normalizer.parse_text("03/14/2019", 2025), Some(ymd(2025, 3, 14)));
        assert_eq!(normalizer.parse_text("03/14/2025", 2025), Some(ymd(2025, 3, 14)));
        // Within one year of the expected year is left alone
        assert_eq!(normalizer.parse_text("12/31/2024", 2025), Some(ymd(2024, 12, 31)));
    }

    #[test]
    fn test_text_formats() {
        let normalizer = DateNormalizer::new(2025).unwrap();

        assert_eq!(normalizer.parse_text("2025-07-01", 2025), Some(ymd(2025, 7, 1)));
        assert_eq!(normalizer.parse_text("14/03/2025", 2025), Some(ymd(2025, 3, 14)));
        assert_eq!(normalizer.parse_text("2025/07/31", 2025), Some(ymd(2025, 7, 31)));
        assert_eq!(normalizer.parse_text("05-Aug-2025", 2025), Some(ymd(2025, 8, 5)));
        assert_eq!(normalizer.parse_text("2025.08.15", 2025), Some(ymd(2025, 8, 15)));
        assert_eq!(normalizer.parse_text("2025-07-01 00:00:00", 2025), Some(ymd(2025, 7, 1)));
        assert_eq!(normalizer.parse_text("2025-07-01T00:00:00", 2025), Some(ymd(2025, 7, 1)));
        // Month/day wins when both readings are valid
        assert_eq!(normalizer.parse_text("07/08/2025", 2025), Some(ymd(2025, 7, 8)));
    }

    #[test]
    fn test_two_digit_years() {
        let normalizer = DateNormalizer::new(2025).unwrap();

        // Next January on a 2025 sheet stays in 2026
        assert_eq!(normalizer.parse_text("15-Jan-26", 2025), Some(ymd(2026, 1, 15)));
        assert_eq!(normalizer.parse_text("01/15/26", 2025), Some(ymd(2026, 1, 15)));
        assert_eq!(normalizer.parse_text("25/12/24", 2025), Some(ymd(2024, 12, 25)));
        assert_eq!(normalizer.parse_text("03/14/19", 2025), Some(ymd(2025, 3, 14)));
        assert_eq!(normalizer.parse_text("05-Aug-2025", 2025), Some(ymd(2025, 8, 5)));
    }

    #[test]
    fn test_sentinels_and_garbage_are_missing() {
        let normalizer = DateNormalizer::new(2025).unwrap();

        for value in ["NIL", "nil", "-", "—", "", "   "] {
            assert_eq!(normalizer.parse_text(value, 2025), None, "{:?}", value);
        }
        assert_eq!(normalizer.parse_text("until further notice", 2025), None);
        assert_eq!(normalizer.parse_text("31/31/2025", 2025), None);
    }

    #[test]
    fn test_serials() {
        assert_eq!(serial_to_date(45658.0), Some(ymd(2025, 1, 1)));
        assert_eq!(serial_to_date(45658.75), Some(ymd(2025, 1, 1)));
        assert_eq!(serial_to_date(-1.0), None);
        assert_eq!(serial_to_date(f64::NAN), None);

        let normalizer = DateNormalizer::new(2025).unwrap();
        // 2019-03-14 is serial 43538
        assert_eq!(normalizer.parse_serial(43538.0, 2025), Some(ymd(2025, 3, 14)));
        assert_eq!(normalizer.parse_text("45658", 2025), Some(ymd(2025, 1, 1)));
    }

    #[test]
    fn test_leap_day_correction() {
        assert_eq!(correct_year(ymd(2020, 2, 29), 2025), ymd(2025, 2, 28));
        assert_eq!(correct_year(ymd(2020, 2, 29), 2024), ymd(2024, 2, 29));
    }

    #[test]
    fn test_normalize_dataframe() {
        let normalizer = DateNormalizer::new(2025).unwrap();
        let df = df!(
            "Effective_Date" => [Some(43538.0), None, Some(45870.0)],
            "Expiring_Date" => [Some("03/14/2019"), Some("NIL"), Some("garbage")],
            "POL" => [Some("03/14/2019"), None, None]
        )
        .unwrap();

        let df = normalizer.normalize_dataframe(df, "carrier_2025.xlsx").unwrap();

        let eff: Vec<Option<&str>> = df.column("Effective_Date").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(eff, vec![Some("2025-03-14"), None, Some("2025-08-01")]);

        let exp: Vec<Option<&str>> = df.column("Expiring_Date").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(exp, vec![Some("2025-03-14"), None, None]);

        // Non-date columns are untouched
        let pol: Vec<Option<&str>> = df.column("POL").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(pol, vec![Some("03/14/2019"), None, None]);
    }
}
