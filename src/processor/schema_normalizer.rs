use crate::models::{Cell, RawTable, CARRIER, DESTINATION, EFFECTIVE_DATE, EXPIRING_DATE, POL, REMARK, TRANSIT_TIME};
use anyhow::Result;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Remark headers, after lower-casing and turning spaces into underscores.
/// Earlier spellings win when several are present.
const REMARK_SPELLINGS: [&str; 4] = ["rate_remarks", "rate_remark", "remark", "remarks"];

/// Renames raw spreadsheet headers into the canonical vocabulary. Each step
/// takes a table and returns a new one; unknown columns pass through.
pub struct SchemaNormalizer {
    canonical_renames: HashMap<String, String>,
    size_type_regex: Regex,
    underscore_regex: Regex,
}

impl SchemaNormalizer {
    pub fn new() -> Result<Self> {
        let mut canonical_renames = HashMap::new();

        canonical_renames.insert("CARRIER".to_string(), CARRIER.to_string());
        canonical_renames.insert("DESTINATION".to_string(), DESTINATION.to_string());
        canonical_renames.insert("T_T".to_string(), TRANSIT_TIME.to_string());
        canonical_renames.insert("EFFECTIVE_DATE".to_string(), EFFECTIVE_DATE.to_string());
        canonical_renames.insert("EXPIRY_DATE".to_string(), EXPIRING_DATE.to_string());
        canonical_renames.insert("Pol".to_string(), POL.to_string());
        canonical_renames.insert("pol".to_string(), POL.to_string());

        Ok(SchemaNormalizer {
            canonical_renames,
            // 20GP -> GP20, 40HQ.1 -> HQ40.1
            size_type_regex: Regex::new(r"^(\d+)([A-Za-z]+)(\.\d+)?$")?,
            underscore_regex: Regex::new(r"_+")?,
        })
    }

    pub fn normalize(&self, table: RawTable) -> RawTable {
        let before = table.headers.clone();

        let table = self.unify_remark_columns(table);
        let table = self.clean_headers(table);
        // Cleanup can turn "Rate remarks" into "Rate_remarks", so unify again
        let table = self.unify_remark_columns(table);
        let table = self.apply_canonical_renames(table);
        let table = drop_duplicate_columns(table);

        info!(
            "📄 {} cleaned header row: {:?}",
            table.source_filename, table.headers
        );
        debug!("Raw header row was: {:?}", before);
        table
    }

    /// Cleans one header token.
    pub fn clean_column_name(&self, name: &str) -> String {
        let col = name
            .trim()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .replace('/', "_")
            .replace(['(', ')', '\''], "");
        let col = self.underscore_regex.replace_all(&col, "_").to_string();

        self.size_type_regex.replace(&col, "$2$1$3").to_string()
    }

    /// Merges every remark-like column into a single `remark` column. The
    /// highest-priority column keeps its values; blanks are backfilled from
    /// the others in priority order.
    pub fn unify_remark_columns(&self, table: RawTable) -> RawTable {
        let mut candidates: Vec<(usize, usize)> = table
            .headers
            .iter()
            .enumerate()
            .filter_map(|(idx, header)| {
                let key = header.trim().to_lowercase().replace(' ', "_");
                REMARK_SPELLINGS
                    .iter()
                    .position(|s| *s == key)
                    .map(|priority| (priority, idx))
            })
            .collect();

        if candidates.is_empty() {
            return table;
        }
        candidates.sort();

        let primary = candidates[0].1;
        let others: Vec<usize> = candidates[1..].iter().map(|(_, idx)| *idx).collect();

        let RawTable {
            source_filename,
            mut headers,
            rows,
        } = table;

        let rows = rows
            .into_iter()
            .map(|mut row| {
                for &other in &others {
                    if row[primary].is_empty() && !row[other].is_empty() {
                        row[primary] = row[other].clone();
                    }
                }
                row
            })
            .collect();

        headers[primary] = REMARK.to_string();
        if !others.is_empty() {
            debug!(
                "Merged {} duplicate remark column(s) into '{}'",
                others.len(),
                REMARK
            );
        }

        let drop: HashSet<usize> = others.into_iter().collect();
        remove_columns(
            RawTable {
                source_filename,
                headers,
                rows,
            },
            &drop,
        )
    }

    fn clean_headers(&self, mut table: RawTable) -> RawTable {
        table.headers = table
            .headers
            .iter()
            .map(|h| self.clean_column_name(h))
            .collect();
        table
    }

    fn apply_canonical_renames(&self, mut table: RawTable) -> RawTable {
        for header in &mut table.headers {
            if let Some(canonical) = self.canonical_renames.get(header.as_str()) {
                *header = canonical.clone();
            }
        }
        table
    }
}

/// Keeps only the first column for every repeated header name.
fn drop_duplicate_columns(table: RawTable) -> RawTable {
    let mut seen = HashSet::new();
    let drop: HashSet<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !seen.insert(h.as_str()))
        .map(|(idx, _)| idx)
        .collect();

    if !drop.is_empty() {
        debug!("Dropping {} duplicate column(s)", drop.len());
    }
    remove_columns(table, &drop)
}

fn remove_columns(table: RawTable, drop: &HashSet<usize>) -> RawTable {
    if drop.is_empty() {
        return table;
    }

    let keep = |idx: &usize| !drop.contains(idx);
    let headers = table
        .headers
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| keep(idx))
        .map(|(_, h)| h)
        .collect();
    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .filter(|(idx, _)| keep(idx))
                .map(|(_, c)| c)
                .collect::<Vec<Cell>>()
        })
        .collect();

    RawTable {
        source_filename: table.source_filename,
        headers,
        rows,
    }
}
