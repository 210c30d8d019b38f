//! Independent-contractor payout aggregation.
//!
//! The IC sheet mixes audit/contractor payments with recurring notetaker
//! rows for the Arborist calls; the payout report covers only the former.

use crate::coerce::{self, clean_text, normalize_key};
use crate::model::Money;
use crate::source::Record;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Project text that marks a row as a notetaker payment.
const NOTETAKER_MARKER: &str = "arborist call meeting notes";

/// One IC payout row with every field coerced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IcPayoutRow {
    pub project: String,
    pub contractor: String,
    pub amount_usd: Option<Money>,
    pub zec: Option<Decimal>,
    pub zec_usd_rate: Option<Decimal>,
    pub paid_date: Option<NaiveDate>,
}

impl IcPayoutRow {
    pub fn from_record(record: &Record) -> Self {
        Self {
            project: record
                .get("Project")
                .map(|c| clean_text(&c.text()))
                .unwrap_or_default(),
            contractor: record
                .get("Independent Contractor (IC)")
                .map(|c| clean_text(&c.text()))
                .unwrap_or_default(),
            amount_usd: record
                .get("Amount (USD)")
                .and_then(coerce::coerce_number)
                .map(Money::new),
            zec: record.get("ZEC Disbursed").and_then(coerce::coerce_number),
            zec_usd_rate: record.get("ZEC/USD").and_then(coerce::coerce_number),
            paid_date: record.get("Paid Out").and_then(coerce::coerce_date),
        }
    }

    pub fn is_notetaker(&self) -> bool {
        normalize_key(&self.project).contains(NOTETAKER_MARKER)
    }
}

/// One calendar month of IC payouts, USD and ZEC side by side.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IcMonthBucket {
    pub month_key: String,
    pub usd_total: Money,
    pub zec_total: Decimal,
}

/// Totals, ZEC-weighted average rate, and monthly series over IC payouts.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IcPayoutReport {
    pub total_usd: Money,
    pub total_zec: Decimal,
    /// Average ZEC/USD rate weighted by ZEC disbursed; `None` when no row
    /// carried both a positive ZEC amount and a positive rate.
    pub weighted_avg_rate: Option<Decimal>,
    pub monthly: Vec<IcMonthBucket>,
}

impl IcPayoutReport {
    /// Computes the report over contractor rows; notetaker rows must be
    /// filtered out by the caller.
    pub fn compute(rows: &[IcPayoutRow]) -> Self {
        let mut total_usd = Money::ZERO;
        let mut total_zec = Decimal::ZERO;
        let mut weighted_numer = Decimal::ZERO;
        let mut weighted_denom = Decimal::ZERO;
        let mut monthly: BTreeMap<String, (Money, Decimal)> = BTreeMap::new();

        for row in rows {
            let usd = row.amount_usd.unwrap_or_default();
            let zec = row.zec.unwrap_or_default();
            total_usd += usd;
            total_zec += zec;

            if let Some(rate) = row.zec_usd_rate {
                if zec > Decimal::ZERO && rate > Decimal::ZERO {
                    weighted_numer += zec * rate;
                    weighted_denom += zec;
                }
            }

            if let Some(paid) = row.paid_date {
                let key = format!("{:04}-{:02}", paid.year(), paid.month());
                let slot = monthly.entry(key).or_default();
                slot.0 += usd;
                slot.1 += zec;
            }
        }

        let weighted_avg_rate = if weighted_denom > Decimal::ZERO {
            Some(weighted_numer / weighted_denom)
        } else {
            None
        };

        Self {
            total_usd,
            total_zec,
            weighted_avg_rate,
            monthly: monthly
                .into_iter()
                .map(|(month_key, (usd_total, zec_total))| IcMonthBucket {
                    month_key,
                    usd_total,
                    zec_total,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(project: &str, usd: i64, zec: i64, rate: Option<i64>, paid: Option<(i32, u32, u32)>) -> IcPayoutRow {
        IcPayoutRow {
            project: project.to_string(),
            contractor: "Jo".to_string(),
            amount_usd: Some(Money::from(usd)),
            zec: Some(Decimal::from(zec)),
            zec_usd_rate: rate.map(Decimal::from),
            paid_date: paid.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        }
    }

    #[test]
    fn test_totals_and_monthly() {
        let rows = vec![
            row("Audit A", 1_000, 20, Some(50), Some((2024, 1, 10))),
            row("Audit B", 3_000, 100, Some(30), Some((2024, 1, 20))),
            row("Audit C", 500, 10, Some(50), Some((2024, 2, 5))),
        ];
        let report = IcPayoutReport::compute(&rows);
        assert_eq!(report.total_usd, Money::from(4_500));
        assert_eq!(report.total_zec, Decimal::from(130));
        assert_eq!(report.monthly.len(), 2);
        assert_eq!(report.monthly[0].month_key, "2024-01");
        assert_eq!(report.monthly[0].usd_total, Money::from(4_000));
        assert_eq!(report.monthly[0].zec_total, Decimal::from(120));
    }

    #[test]
    fn test_weighted_average_rate() {
        // 20 ZEC at 50 plus 100 ZEC at 30: (1000 + 3000) / 120.
        let rows = vec![
            row("A", 0, 20, Some(50), None),
            row("B", 0, 100, Some(30), None),
        ];
        let report = IcPayoutReport::compute(&rows);
        let rate = report.weighted_avg_rate.unwrap();
        assert_eq!(rate, Decimal::from(4_000) / Decimal::from(120));
    }

    #[test]
    fn test_rate_ignores_zero_zec_and_zero_rate_rows() {
        let rows = vec![
            row("A", 100, 0, Some(50), None),
            row("B", 100, 10, Some(0), None),
        ];
        assert_eq!(IcPayoutReport::compute(&rows).weighted_avg_rate, None);
    }

    #[test]
    fn test_undated_rows_count_in_totals_but_not_monthly() {
        let rows = vec![row("A", 100, 1, None, None)];
        let report = IcPayoutReport::compute(&rows);
        assert_eq!(report.total_usd, Money::from(100));
        assert!(report.monthly.is_empty());
    }

    #[test]
    fn test_notetaker_detection() {
        let mut r = row("Arborist Call Meeting Notes #42", 0, 0, None, None);
        assert!(r.is_notetaker());
        r.project = "Wallet Audit".to_string();
        assert!(!r.is_notetaker());
    }

    #[test]
    fn test_row_from_record() {
        use crate::coerce::Cell;
        let record = Record::new([
            ("Project".to_string(), Cell::from("Audit")),
            ("Independent Contractor (IC)".to_string(), Cell::from("Jo")),
            ("Amount (USD)".to_string(), Cell::from("$1,500")),
            ("ZEC Disbursed".to_string(), Cell::from("30")),
            ("ZEC/USD".to_string(), Cell::from("50")),
            ("Paid Out".to_string(), Cell::from("1/10/2024")),
        ]);
        let r = IcPayoutRow::from_record(&record);
        assert_eq!(r.contractor, "Jo");
        assert_eq!(r.amount_usd, Some(Money::from(1_500)));
        assert_eq!(r.zec_usd_rate, Some(Decimal::from(50)));
        assert_eq!(r.paid_date, NaiveDate::from_ymd_opt(2024, 1, 10));
    }
}
