use crate::models::{AliasKind, AliasTable};
use anyhow::Result;
use polars::prelude::*;
use std::collections::HashMap;
use strsim::normalized_levenshtein;
use tracing::{debug, info, warn};

/// Approximate matches must score strictly above this (0-100 scale).
pub const MATCH_THRESHOLD: f64 = 75.0;

/// How a single value was resolved against an alias table.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Blank input, passed through untouched.
    Blank,
    /// An alias of `label` was found in the value.
    Alias { label: String },
    /// Closest candidate cleared the threshold.
    Approximate { label: String, score: f64 },
    /// Nothing cleared the threshold; the raw value is kept.
    Unmatched { best: Option<(String, f64)> },
}

/// Similarity in 0..=100: the better of plain and token-sorted normalized
/// Levenshtein, so "KONG HONG" still scores against "HONG KONG".
pub fn similarity(a: &str, b: &str) -> f64 {
    let direct = normalized_levenshtein(a, b);
    let sorted = normalized_levenshtein(&sort_tokens(a), &sort_tokens(b));
    direct.max(sorted) * 100.0
}

pub fn is_confident(score: f64) -> bool {
    score > MATCH_THRESHOLD
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Part of a location before the first comma or hyphen ("NINGBO, ZHEJIANG" -> "NINGBO").
fn location_head(value: &str) -> &str {
    let head = value.split([',', '-']).next().unwrap_or(value).trim();
    if head.is_empty() { value } else { head }
}

/// Maps free-text values to canonical labels of one alias table.
pub struct FuzzyMatcher<'a> {
    table: &'a AliasTable,
}

impl<'a> FuzzyMatcher<'a> {
    pub fn new(table: &'a AliasTable) -> Self {
        FuzzyMatcher { table }
    }

    pub fn kind(&self) -> AliasKind {
        self.table.kind
    }

    /// Canonical label for `raw`, or `raw` itself when nothing is confident enough.
    pub fn canonicalize(&self, raw: &str) -> String {
        match self.match_value(raw) {
            MatchOutcome::Alias { label } | MatchOutcome::Approximate { label, .. } => label,
            MatchOutcome::Blank | MatchOutcome::Unmatched { .. } => raw.to_string(),
        }
    }

    pub fn match_value(&self, raw: &str) -> MatchOutcome {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return MatchOutcome::Blank;
        }

        let key = match self.table.kind {
            AliasKind::Port | AliasKind::City => location_head(&normalized),
            AliasKind::Carrier => normalized.as_str(),
        };

        if let Some(label) = self.exact_alias(key) {
            return MatchOutcome::Alias {
                label: label.to_string(),
            };
        }

        match self.best_candidate(key) {
            Some((label, score)) if is_confident(score) => MatchOutcome::Approximate {
                label: label.to_string(),
                score,
            },
            best => MatchOutcome::Unmatched {
                best: best.map(|(label, score)| (label.to_string(), score)),
            },
        }
    }

    /// First entry (in table order) with an alias found in `key`. Cities need
    /// the whole key to equal an alias; ports and carriers accept substrings.
    fn exact_alias(&self, key: &str) -> Option<&'a str> {
        let table: &'a AliasTable = self.table;
        table
            .entries
            .iter()
            .find(|entry| {
                entry.aliases.iter().filter(|a| !a.is_empty()).any(|alias| match table.kind {
                    AliasKind::City => alias == key,
                    AliasKind::Port | AliasKind::Carrier => key.contains(alias.as_str()),
                })
            })
            .map(|entry| entry.label.as_str())
    }

    /// Highest scoring candidate. Cities score against every alias, ports and
    /// carriers against the labels. Ties keep the earlier candidate.
    fn best_candidate(&self, key: &str) -> Option<(&'a str, f64)> {
        let table: &'a AliasTable = self.table;
        let mut best: Option<(&'a str, f64)> = None;

        let mut consider = |label: &'a str, score: f64| match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((label, score)),
        };

        match table.kind {
            AliasKind::City => {
                for (alias, label) in table.alias_pairs() {
                    consider(label, similarity(key, alias));
                }
            }
            AliasKind::Port => {
                for label in table.labels() {
                    let upper = label.to_uppercase();
                    let score = similarity(key, &upper).max(similarity(key, location_head(&upper)));
                    consider(label, score);
                }
            }
            AliasKind::Carrier => {
                for label in table.labels() {
                    consider(label, similarity(key, &label.to_uppercase()));
                }
            }
        }

        best
    }

    /// Rewrites `column` of `df` in place of the raw values. A missing column is
    /// logged and the frame is returned unchanged.
    pub fn apply_to_column(&self, mut df: DataFrame, column: &str) -> Result<DataFrame> {
        if df.column(column).is_err() {
            warn!("⚠️ No {} column to match against {:?} aliases", column, self.kind());
            return Ok(df);
        }
        let series = df.column(column)?.cast(&DataType::String)?;

        let values = series.str()?;
        let mut cache: HashMap<&str, String> = HashMap::new();
        let mut unmatched: Vec<String> = Vec::new();

        let cleaned: Vec<Option<String>> = values
            .into_iter()
            .map(|opt| {
                opt.map(|raw| {
                    cache
                        .entry(raw)
                        .or_insert_with(|| match self.match_value(raw) {
                            MatchOutcome::Alias { label } => label,
                            MatchOutcome::Approximate { label, score } => {
                                debug!("≈ {:?} -> {:?} (score {:.1})", raw, label, score);
                                label
                            }
                            MatchOutcome::Unmatched { best } => {
                                if !raw.trim().is_empty() {
                                    debug!("✗ {:?} unmatched, best candidate {:?}", raw, best);
                                    unmatched.push(raw.to_string());
                                }
                                raw.to_string()
                            }
                            MatchOutcome::Blank => raw.to_string(),
                        })
                        .clone()
                })
            })
            .collect();

        info!("🔍 Old {}: {:?}", column, sample_unique(values.into_iter().flatten()));
        info!("✅ Cleaned {}: {:?}", column, sample_unique(cleaned.iter().flatten().map(|s| s.as_str())));
        if !unmatched.is_empty() {
            warn!(
                "⚠️ {} {} value(s) kept verbatim (no confident match): {:?}",
                unmatched.len(),
                column,
                unmatched
            );
        }

        df.with_column(Series::new(column.into(), cleaned))?;
        Ok(df)
    }
}

fn sample_unique<'s>(values: impl Iterator<Item = &'s str>) -> Vec<&'s str> {
    let mut seen: Vec<&str> = Vec::new();
    for v in values {
        if !seen.contains(&v) {
            seen.push(v);
            if seen.len() == 10 {
                break;
            }
        }
    }
    seen
}
