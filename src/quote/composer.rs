use crate::config::FeeSchedule;
use crate::models::{AccessorialCharges, CanonicalRateRow, QuoteRow, ServiceLevel};
use crate::quote::{QuoteRequest, RateAdjustment, normalize_label};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{info, warn};

/// A lane dimension that a table has no row for at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDimension {
    Origin,
    Destination,
    Carrier,
}

impl fmt::Display for MissingDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingDimension::Origin => write!(f, "no such origin (POL)"),
            MissingDimension::Destination => write!(f, "no such destination"),
            MissingDimension::Carrier => write!(f, "no such carrier"),
        }
    }
}

/// Why one table had no row for a lane. An empty `missing` set means every
/// value exists in the table, just never on the same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDiagnostic {
    pub table: String,
    pub missing: BTreeSet<MissingDimension>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Lane {
    pub origin: String,
    pub destination: String,
    pub carrier: String,
}

impl Lane {
    pub fn new(origin: &str, destination: &str, carrier: &str) -> Self {
        Lane {
            origin: origin.to_string(),
            destination: destination.to_string(),
            carrier: carrier.to_string(),
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.origin, self.destination, self.carrier)
    }
}

/// Rows of every table matching one lane, plus a diagnostic for each table
/// that had none.
#[derive(Debug, Clone)]
pub struct LaneMatch {
    pub lane: Lane,
    pub rows: Vec<CanonicalRateRow>,
    pub diagnostics: Vec<TableDiagnostic>,
}

impl LaneMatch {
    pub fn is_unmatched(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Scans every source table for `lane`, comparing case- and
/// whitespace-normalized labels.
pub fn match_lane(rows: &[CanonicalRateRow], lane: &Lane) -> LaneMatch {
    let origin = normalize_label(&lane.origin);
    let destination = normalize_label(&lane.destination);
    let carrier = normalize_label(&lane.carrier);

    let mut tables: Vec<&str> = Vec::new();
    for row in rows {
        if !tables.contains(&row.source_table.as_str()) {
            tables.push(&row.source_table);
        }
    }

    let mut matched = Vec::new();
    let mut diagnostics = Vec::new();

    for table in tables {
        let table_rows: Vec<&CanonicalRateRow> =
            rows.iter().filter(|r| r.source_table == table).collect();

        let mut has_origin = false;
        let mut has_destination = false;
        let mut has_carrier = false;
        let before = matched.len();

        for row in &table_rows {
            let o = normalize_label(&row.origin_port) == origin;
            let d = normalize_label(&row.destination) == destination;
            let c = normalize_label(&row.carrier) == carrier;
            has_origin |= o;
            has_destination |= d;
            has_carrier |= c;
            if o && d && c {
                matched.push((*row).clone());
            }
        }

        if matched.len() == before {
            let mut missing = BTreeSet::new();
            if !has_origin {
                missing.insert(MissingDimension::Origin);
            }
            if !has_destination {
                missing.insert(MissingDimension::Destination);
            }
            if !has_carrier {
                missing.insert(MissingDimension::Carrier);
            }
            diagnostics.push(TableDiagnostic {
                table: table.to_string(),
                missing,
            });
        }
    }

    LaneMatch {
        lane: lane.clone(),
        rows: matched,
        diagnostics,
    }
}

/// Derives all-in totals for one service level. Totals are always rebuilt
/// from the stored base rate, so re-applying an adjustment never compounds.
pub struct QuotePricer<'a> {
    fees: &'a FeeSchedule,
    service_level: ServiceLevel,
    trucking_fee: f64,
}

impl<'a> QuotePricer<'a> {
    pub fn new(fees: &'a FeeSchedule, service_level: ServiceLevel, trucking_fee: f64) -> Self {
        QuotePricer {
            fees,
            service_level,
            trucking_fee,
        }
    }

    /// Charges shown on a quote. Port-to-door-only charges are `None` for
    /// port-to-port, as are AT COST charges.
    pub fn charges(&self) -> AccessorialCharges {
        let door = self.service_level == ServiceLevel::PortToDoor;
        AccessorialCharges {
            isf: self.fees.isf.as_amount(),
            handling: self.fees.handling.as_amount(),
            customs_clearance: self.fees.customs_clearance.as_amount(),
            duty: self.fees.duty.as_amount(),
            trucking_fee: door.then_some(self.trucking_fee),
            ctf_pp_20ft: self.fees.ctf_pp_20ft.as_amount().filter(|_| door),
            ctf_pp_40ft: self.fees.ctf_pp_40ft.as_amount().filter(|_| door),
            chassis_fee: self.fees.chassis_fee.as_amount().filter(|_| door),
        }
    }

    pub fn price(&self, rate: &CanonicalRateRow, adjustment: &RateAdjustment) -> QuoteRow {
        let charges = self.charges();

        let adjusted_20ft = rate.rate_20ft.map(|r| r + adjustment.delta_20ft);
        let adjusted_40ft = rate
            .rate_40ft
            .or(rate.rate_40hc)
            .map(|r| r + adjustment.delta_40ft);

        // Duty is never part of the all-in total
        let common = [charges.isf, charges.handling, charges.customs_clearance]
            .iter()
            .flatten()
            .sum::<f64>();
        let door_20ft = [charges.trucking_fee, charges.ctf_pp_20ft, charges.chassis_fee]
            .iter()
            .flatten()
            .sum::<f64>();
        let door_40ft = [charges.trucking_fee, charges.ctf_pp_40ft, charges.chassis_fee]
            .iter()
            .flatten()
            .sum::<f64>();

        QuoteRow {
            rate: rate.clone(),
            service_level: self.service_level,
            adjusted_20ft,
            adjusted_40ft,
            all_in_20ft: adjusted_20ft.map(|b| b + common + door_20ft),
            all_in_40ft_or_hc: adjusted_40ft.map(|b| b + common + door_40ft),
            charges,
        }
    }

    /// Prices `quote` again from its base rate with a new adjustment.
    pub fn reprice(&self, quote: &QuoteRow, adjustment: &RateAdjustment) -> QuoteRow {
        self.price(&quote.rate, adjustment)
    }
}

fn cmp_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ascending 20ft all-in; unpriced sailings last.
pub fn rank_by_20ft(sailings: &mut [QuoteRow]) {
    sailings.sort_by(|a, b| cmp_missing_last(a.all_in_20ft, b.all_in_20ft));
}

/// Ascending 40ft/HC all-in, keeping at most `max_shown`.
pub fn rank_by_40ft(mut selected: Vec<QuoteRow>, max_shown: usize) -> Vec<QuoteRow> {
    selected.sort_by(|a, b| cmp_missing_last(a.all_in_40ft_or_hc, b.all_in_40ft_or_hc));
    selected.truncate(max_shown);
    selected
}

/// One carrier's candidate sailings on a lane, ranked by 20ft all-in.
#[derive(Debug, Clone)]
pub struct CarrierSailings {
    pub carrier: String,
    pub sailings: Vec<QuoteRow>,
    /// Index into `sailings`; `None` when the carrier is excluded.
    pub selected: Option<usize>,
}

impl CarrierSailings {
    pub fn selected_sailing(&self) -> Option<&QuoteRow> {
        self.selected.and_then(|i| self.sailings.get(i))
    }
}

#[derive(Debug, Clone)]
pub struct LaneQuote {
    pub origin: String,
    pub destination: String,
    pub carriers: Vec<CarrierSailings>,
    /// Selected sailings ranked by 40ft/HC all-in and truncated.
    pub shown: Vec<QuoteRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedLane {
    pub lane: Lane,
    pub diagnostics: Vec<TableDiagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct QuoteOutcome {
    pub lanes: Vec<LaneQuote>,
    pub unmatched: Vec<UnmatchedLane>,
    /// Lanes that had rates, all of them removed by the keyword filter.
    pub filtered_out: Vec<Lane>,
}

impl QuoteOutcome {
    pub fn shown_rows(&self) -> impl Iterator<Item = &QuoteRow> {
        self.lanes.iter().flat_map(|lane| lane.shown.iter())
    }
}

pub struct QuoteComposer<'a> {
    fees: &'a FeeSchedule,
}

impl<'a> QuoteComposer<'a> {
    pub fn new(fees: &'a FeeSchedule) -> Self {
        QuoteComposer { fees }
    }

    pub fn compose(&self, rows: &[CanonicalRateRow], request: &QuoteRequest) -> QuoteOutcome {
        let current: Vec<CanonicalRateRow> = rows
            .iter()
            .filter(|r| request.is_current(r))
            .cloned()
            .collect();
        if current.len() < rows.len() {
            info!(
                "Dropped {} expired row(s) (valid on {:?})",
                rows.len() - current.len(),
                request.valid_on
            );
        }

        let pricer = QuotePricer::new(self.fees, request.service_level, request.trucking_fee);
        let mut outcome = QuoteOutcome::default();

        for origin in &request.origins {
            for destination in &request.destinations {
                let mut carriers = Vec::new();

                for carrier in &request.carriers {
                    let lane = Lane::new(origin, destination, carrier);
                    let found = match_lane(&current, &lane);

                    if found.is_unmatched() {
                        let reasons: Vec<String> = found
                            .diagnostics
                            .iter()
                            .map(|d| {
                                let missing: Vec<String> =
                                    d.missing.iter().map(|m| m.to_string()).collect();
                                format!("{}: [{}]", d.table, missing.join(", "))
                            })
                            .collect();
                        warn!("⚠️ No rates for {}: {:?}", lane, reasons);
                        outcome.unmatched.push(UnmatchedLane {
                            lane,
                            diagnostics: found.diagnostics,
                        });
                        continue;
                    }

                    let mut sailings: Vec<QuoteRow> = found
                        .rows
                        .iter()
                        .filter(|r| request.keyword.accepts(r))
                        .map(|r| pricer.price(r, &request.adjustment))
                        .collect();
                    if sailings.is_empty() {
                        warn!(
                            "⚠️ All {} sailing(s) for {} removed by keyword filter {:?} ({:?})",
                            found.rows.len(),
                            lane,
                            request.keyword.text,
                            request.keyword.mode
                        );
                        outcome.filtered_out.push(lane);
                        continue;
                    }
                    rank_by_20ft(&mut sailings);

                    let selected = match request.choice_for(origin, destination, carrier) {
                        Some(choice) if choice.exclude => {
                            info!("Carrier {} excluded on {} -> {}", carrier, origin, destination);
                            None
                        }
                        Some(choice) if choice.sailing >= sailings.len() => {
                            warn!(
                                "⚠️ Sailing {} does not exist for {} ({} available), using the cheapest",
                                choice.sailing,
                                lane,
                                sailings.len()
                            );
                            Some(0)
                        }
                        Some(choice) => Some(choice.sailing),
                        None => Some(0),
                    };

                    carriers.push(CarrierSailings {
                        carrier: carrier.clone(),
                        sailings,
                        selected,
                    });
                }

                if carriers.is_empty() {
                    continue;
                }

                let selected: Vec<QuoteRow> = carriers
                    .iter()
                    .filter_map(|c| c.selected_sailing().cloned())
                    .collect();
                let shown = rank_by_40ft(selected, request.max_shown);
                info!(
                    "✅ {} -> {}: {} carrier(s), showing {}",
                    origin,
                    destination,
                    carriers.len(),
                    shown.len()
                );

                outcome.lanes.push(LaneQuote {
                    origin: origin.clone(),
                    destination: destination.clone(),
                    carriers,
                    shown,
                });
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeeAmount;
    use crate::quote::{CarrierChoice, KeywordFilter, KeywordMode};
    use chrono::NaiveDate;

    fn rate(table: &str, origin: &str, destination: &str, carrier: &str, gp20: f64, gp40: f64) -> CanonicalRateRow {
        CanonicalRateRow {
            origin_port: origin.to_string(),
            destination: destination.to_string(),
            carrier: carrier.to_string(),
            rate_20ft: Some(gp20),
            rate_40ft: Some(gp40),
            source_table: table.to_string(),
            ..Default::default()
        }
    }

    fn request(carriers: &[&str]) -> QuoteRequest {
        QuoteRequest {
            service_level: ServiceLevel::PortToPort,
            origins: vec!["SHENZHEN, GUANGDONG".to_string()],
            destinations: vec!["NEW YORK, NY".to_string()],
            carriers: carriers.iter().map(|c| c.to_string()).collect(),
            trucking_fee: 0.0,
            max_shown: 5,
            valid_on: None,
            adjustment: RateAdjustment::default(),
            keyword: KeywordFilter::default(),
            carrier_choices: vec![],
        }
    }

    #[test]
    fn test_missing_origin_diagnostic() {
        let rows = vec![rate("cleaned_a", "SHENZHEN, GUANGDONG", "NEW YORK, NY", "MSC", 1000.0, 1500.0)];

        let found = match_lane(&rows, &Lane::new("ATLANTIS", "NEW YORK, NY", "MSC"));
        assert!(found.is_unmatched());
        assert_eq!(found.diagnostics.len(), 1);
        assert_eq!(found.diagnostics[0].table, "cleaned_a");
        assert_eq!(
            found.diagnostics[0].missing,
            BTreeSet::from([MissingDimension::Origin])
        );
    }

    #[test]
    fn test_diagnostics_are_per_table() {
        let rows = vec![
            rate("cleaned_a", "SHENZHEN, GUANGDONG", "CHICAGO, IL", "MSC", 1000.0, 1500.0),
            rate("cleaned_a", "NINGBO, ZHEJIANG", "NEW YORK, NY", "CMA", 1000.0, 1500.0),
            rate("cleaned_b", "XIAMEN", "DALLAS, TX", "ONE", 1000.0, 1500.0),
            rate("cleaned_c", "shenzhen,  guangdong", "new york, ny", "msc", 900.0, 1400.0),
        ];

        let found = match_lane(&rows, &Lane::new("SHENZHEN, GUANGDONG", "NEW YORK, NY", "MSC"));
        // Case and whitespace differences still match
        assert_eq!(found.rows.len(), 1);
        assert_eq!(found.rows[0].source_table, "cleaned_c");

        assert_eq!(found.diagnostics.len(), 2);
        // Every value exists in table a, never together
        assert!(found.diagnostics[0].missing.is_empty());
        assert_eq!(
            found.diagnostics[1].missing,
            BTreeSet::from([
                MissingDimension::Origin,
                MissingDimension::Destination,
                MissingDimension::Carrier
            ])
        );
    }

    #[test]
    fn test_all_in_port_to_port_and_door() {
        let fees = FeeSchedule::default();
        let row = rate("cleaned_a", "A", "B", "MSC", 1000.0, 1500.0);

        let p2p = QuotePricer::new(&fees, ServiceLevel::PortToPort, 200.0)
            .price(&row, &RateAdjustment::default());
        assert_eq!(p2p.all_in_20ft, Some(1155.0));
        assert_eq!(p2p.all_in_40ft_or_hc, Some(1655.0));
        assert_eq!(p2p.charges.trucking_fee, None);
        assert_eq!(p2p.charges.duty, None);

        let p2d = QuotePricer::new(&fees, ServiceLevel::PortToDoor, 200.0)
            .price(&row, &RateAdjustment::default());
        assert_eq!(p2d.all_in_20ft, Some(1503.0));
        assert_eq!(p2d.all_in_40ft_or_hc, Some(2003.0));
        assert_eq!(p2d.charges.trucking_fee, Some(200.0));
        assert_eq!(p2d.charges.chassis_fee, Some(100.0));
    }

    #[test]
    fn test_numeric_duty_is_not_added() {
        let fees = FeeSchedule {
            duty: FeeAmount::Amount(999.0),
            ..FeeSchedule::default()
        };
        let row = rate("cleaned_a", "A", "B", "MSC", 1000.0, 1500.0);

        let quote = QuotePricer::new(&fees, ServiceLevel::PortToPort, 0.0)
            .price(&row, &RateAdjustment::default());
        assert_eq!(quote.charges.duty, Some(999.0));
        assert_eq!(quote.all_in_20ft, Some(1155.0));
    }

    #[test]
    fn test_missing_rate_is_never_zero() {
        let fees = FeeSchedule::default();
        let row = CanonicalRateRow {
            rate_20ft: None,
            rate_40ft: None,
            rate_40hc: Some(1700.0),
            ..Default::default()
        };

        let quote = QuotePricer::new(&fees, ServiceLevel::PortToPort, 0.0)
            .price(&row, &RateAdjustment::default());
        assert_eq!(quote.all_in_20ft, None);
        // 40ft falls back to the HQ40 rate
        assert_eq!(quote.all_in_40ft_or_hc, Some(1855.0));
    }

    #[test]
    fn test_adjustments_do_not_compound() {
        let fees = FeeSchedule::default();
        let pricer = QuotePricer::new(&fees, ServiceLevel::PortToPort, 0.0);
        let adjustment = RateAdjustment {
            delta_20ft: -50.0,
            delta_40ft: 25.0,
        };

        let once = pricer.price(&rate("t", "A", "B", "MSC", 1000.0, 1500.0), &adjustment);
        let twice = pricer.reprice(&once, &adjustment);
        assert_eq!(once.all_in_20ft, Some(1105.0));
        assert_eq!(once.all_in_40ft_or_hc, Some(1680.0));
        assert_eq!(twice, once);

        let reset = pricer.reprice(&twice, &RateAdjustment::default());
        assert_eq!(reset.all_in_20ft, Some(1155.0));
    }

    #[test]
    fn test_rank_by_40ft_keeps_cheapest() {
        let fees = FeeSchedule::default();
        let pricer = QuotePricer::new(&fees, ServiceLevel::PortToPort, 0.0);
        let gp40 = [1900.0, 1200.0, 1700.0, 1100.0, 2100.0, 1300.0, 1600.0, 1400.0];
        let quotes: Vec<QuoteRow> = gp40
            .iter()
            .map(|g| pricer.price(&rate("t", "A", "B", "MSC", 1000.0, *g), &RateAdjustment::default()))
            .collect();

        let shown = rank_by_40ft(quotes, 5);
        let bases: Vec<f64> = shown.iter().filter_map(|q| q.rate.rate_40ft).collect();
        assert_eq!(bases, vec![1100.0, 1200.0, 1300.0, 1400.0, 1600.0]);
    }

    #[test]
    fn test_unpriced_sailings_rank_last() {
        let fees = FeeSchedule::default();
        let pricer = QuotePricer::new(&fees, ServiceLevel::PortToPort, 0.0);
        let mut unpriced = rate("t", "A", "B", "MSC", 1000.0, 0.0);
        unpriced.rate_40ft = None;
        unpriced.rate_20ft = None;

        let mut sailings = vec![
            pricer.price(&unpriced, &RateAdjustment::default()),
            pricer.price(&rate("t", "A", "B", "MSC", 900.0, 1500.0), &RateAdjustment::default()),
        ];
        rank_by_20ft(&mut sailings);
        assert_eq!(sailings[0].rate.rate_20ft, Some(900.0));

        let shown = rank_by_40ft(sailings, 5);
        assert_eq!(shown[1].all_in_40ft_or_hc, None);
    }

    #[test]
    fn test_compose_selects_one_sailing_per_carrier() {
        let fees = FeeSchedule::default();
        let lane = ("SHENZHEN, GUANGDONG", "NEW YORK, NY");
        let rows = vec![
            rate("cleaned_a", lane.0, lane.1, "MSC", 1200.0, 1500.0),
            rate("cleaned_a", lane.0, lane.1, "MSC", 1000.0, 1900.0),
            rate("cleaned_b", lane.0, lane.1, "CMA", 1100.0, 1400.0),
            rate("cleaned_b", lane.0, lane.1, "ONE", 1300.0, 1300.0),
        ];

        let mut req = request(&["MSC", "CMA", "ONE", "OOCL"]);
        req.max_shown = 2;
        let outcome = QuoteComposer::new(&fees).compose(&rows, &req);

        assert_eq!(outcome.lanes.len(), 1);
        let lane_quote = &outcome.lanes[0];
        assert_eq!(lane_quote.carriers.len(), 3);

        // MSC defaults to its cheapest 20ft sailing
        let msc = &lane_quote.carriers[0];
        assert_eq!(msc.sailings.len(), 2);
        assert_eq!(msc.selected_sailing().unwrap().rate.rate_20ft, Some(1000.0));

        // Shown: cheapest 40ft among selected (ONE 1300, CMA 1400), MSC's 1900 cut
        let carriers: Vec<&str> = lane_quote.shown.iter().map(|q| q.rate.carrier.as_str()).collect();
        assert_eq!(carriers, vec!["ONE", "CMA"]);

        assert_eq!(outcome.unmatched.len(), 1);
        assert_eq!(outcome.unmatched[0].lane.carrier, "OOCL");
        assert_eq!(
            outcome.unmatched[0].diagnostics[0].missing,
            BTreeSet::from([MissingDimension::Carrier])
        );
    }

    #[test]
    fn test_compose_applies_choices_keyword_and_expiry() {
        let fees = FeeSchedule::default();
        let lane = ("SHENZHEN, GUANGDONG", "NEW YORK, NY");

        let mut soc = rate("cleaned_a", lane.0, lane.1, "MSC", 900.0, 1500.0);
        soc.remark = Some("SOC only".to_string());
        let mut expired = rate("cleaned_a", lane.0, lane.1, "MSC", 800.0, 1500.0);
        expired.expiring_date = NaiveDate::from_ymd_opt(2025, 6, 30);
        let rows = vec![
            soc,
            expired,
            rate("cleaned_a", lane.0, lane.1, "MSC", 1000.0, 1600.0),
            rate("cleaned_a", lane.0, lane.1, "MSC", 1100.0, 1700.0),
            rate("cleaned_a", lane.0, lane.1, "CMA", 1000.0, 1000.0),
        ];

        let mut req = request(&["MSC", "CMA"]);
        req.valid_on = NaiveDate::from_ymd_opt(2025, 7, 15);
        req.keyword = KeywordFilter {
            text: "soc".to_string(),
            mode: KeywordMode::Exclude,
        };
        req.carrier_choices = vec![
            CarrierChoice {
                carrier: "MSC".to_string(),
                sailing: 1,
                ..Default::default()
            },
            CarrierChoice {
                carrier: "cma".to_string(),
                exclude: true,
                ..Default::default()
            },
        ];

        let outcome = QuoteComposer::new(&fees).compose(&rows, &req);
        let lane_quote = &outcome.lanes[0];

        let msc = &lane_quote.carriers[0];
        let msc_bases: Vec<Option<f64>> = msc.sailings.iter().map(|q| q.rate.rate_20ft).collect();
        assert_eq!(msc_bases, vec![Some(1000.0), Some(1100.0)]);
        assert_eq!(msc.selected, Some(1));

        let cma = &lane_quote.carriers[1];
        assert_eq!(cma.selected, None);

        assert_eq!(lane_quote.shown.len(), 1);
        assert_eq!(lane_quote.shown[0].rate.rate_20ft, Some(1100.0));
    }

    #[test]
    fn test_keyword_filter_reports_emptied_lanes() {
        let fees = FeeSchedule::default();
        let lane = ("SHENZHEN, GUANGDONG", "NEW YORK, NY");

        let mut soc = rate("cleaned_a", lane.0, lane.1, "ONE", 900.0, 1500.0);
        soc.remark = Some("SOC only".to_string());
        let rows = vec![soc, rate("cleaned_a", lane.0, lane.1, "MSC", 1000.0, 1600.0)];

        let mut req = request(&["ONE", "MSC"]);
        req.keyword = KeywordFilter {
            text: "SOC".to_string(),
            mode: KeywordMode::Exclude,
        };

        let outcome = QuoteComposer::new(&fees).compose(&rows, &req);

        assert!(outcome.unmatched.is_empty());
        assert_eq!(outcome.filtered_out, vec![Lane::new(lane.0, lane.1, "ONE")]);
        assert_eq!(outcome.lanes[0].carriers.len(), 1);
        assert_eq!(outcome.lanes[0].carriers[0].carrier, "MSC");
    }
}
