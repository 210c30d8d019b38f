//! Buckets dated, amounted records into chart-ready series.

use crate::coerce::{self, Cell};
use crate::model::Money;
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One calendar month of activity. The `month_key` is `YYYY-MM`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthBucket {
    pub month_key: String,
    pub amount_total: Money,
    pub count: usize,
}

/// Groups records into calendar-month buckets, summing amounts and counting
/// records. Records whose date is absent are excluded silently. Buckets come
/// out sorted ascending by key.
///
/// Invariant: the zero-padded `YYYY-MM` key makes lexicographic order equal
/// chronological order, which is what the BTreeMap below relies on. Changing
/// the key format breaks the sort.
pub fn bucket_by_month<T>(
    records: &[T],
    date_of: impl Fn(&T) -> Option<NaiveDate>,
    amount_of: impl Fn(&T) -> Money,
) -> Vec<MonthBucket> {
    let mut months: BTreeMap<String, (Money, usize)> = BTreeMap::new();
    for record in records {
        let Some(date) = date_of(record) else {
            continue;
        };
        let key = format!("{:04}-{:02}", date.year(), date.month());
        let slot = months.entry(key).or_default();
        slot.0 += amount_of(record);
        slot.1 += 1;
    }
    months
        .into_iter()
        .map(|(month_key, (amount_total, count))| MonthBucket {
            month_key,
            amount_total,
            count,
        })
        .collect()
}

/// Rolling/YTD windows for the payout charts.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeWindow {
    OneMonth,
    ThreeMonths,
    OneYear,
    #[default]
    YearToDate,
    Max,
}

serde_plain::derive_display_from_serialize!(TimeWindow);
serde_plain::derive_fromstr_from_deserialize!(TimeWindow);

impl TimeWindow {
    /// The cutoff instant for this window relative to `today`, or `None` for
    /// the unbounded window.
    pub fn cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            TimeWindow::OneMonth => today.checked_sub_days(Days::new(30)),
            TimeWindow::ThreeMonths => today.checked_sub_days(Days::new(90)),
            TimeWindow::OneYear => today.checked_sub_months(Months::new(12)),
            TimeWindow::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            TimeWindow::Max => None,
        }
    }
}

/// Retains records dated on or after the window's cutoff. Undated records
/// are excluded except by the unbounded window, which passes everything
/// through. Recomputed in full on every filter change.
pub fn filter_by_window<'a, T>(
    records: &'a [T],
    date_of: impl Fn(&T) -> Option<NaiveDate>,
    window: TimeWindow,
    today: NaiveDate,
) -> Vec<&'a T> {
    let cutoff = window.cutoff(today);
    records
        .iter()
        .filter(|r| match cutoff {
            None => true,
            Some(cutoff) => date_of(r).map(|d| d >= cutoff).unwrap_or(false),
        })
        .collect()
}

/// Groups records by a string label and sums amounts, ordered descending by
/// amount for chart display.
pub fn category_totals<T>(
    records: &[T],
    label_of: impl Fn(&T) -> Option<String>,
    amount_of: impl Fn(&T) -> Money,
) -> Vec<(String, Money)> {
    let mut totals: BTreeMap<String, Money> = BTreeMap::new();
    for record in records {
        let Some(label) = label_of(record) else {
            continue;
        };
        if label.is_empty() {
            continue;
        }
        *totals.entry(label).or_default() += amount_of(record);
    }
    let mut out: Vec<(String, Money)> = totals.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

// The funds-distribution sheet keeps its category breakdown in columns M:N,
// off to the side of the main table.
const FUNDS_LABEL_COL: usize = 12;
const FUNDS_VALUE_COL: usize = 13;

/// A label longer than this is assumed to be stray prose, not a category.
const MAX_CATEGORY_LABEL_LEN: usize = 60;

/// Scans the funds-distribution sheet's positional M:N columns into category
/// totals. Only short text labels with a positive amount are treated as
/// categories.
pub fn funds_category_totals(rows: &[Vec<Cell>]) -> Vec<(String, Money)> {
    let mut labeled: Vec<(String, Money)> = Vec::new();
    for row in rows {
        let Some(Cell::Text(label)) = row.get(FUNDS_LABEL_COL) else {
            continue;
        };
        let label = coerce::clean_text(label);
        if label.is_empty() || label.len() > MAX_CATEGORY_LABEL_LEN {
            continue;
        }
        let amount = row
            .get(FUNDS_VALUE_COL)
            .and_then(coerce::coerce_number)
            .unwrap_or_default();
        if amount > rust_decimal::Decimal::ZERO {
            labeled.push((label, Money::new(amount)));
        }
    }
    category_totals(
        &labeled,
        |(label, _)| Some(label.clone()),
        |(_, amount)| *amount,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rec {
        date: Option<NaiveDate>,
        amount: i64,
    }

    fn rec(date: Option<(i32, u32, u32)>, amount: i64) -> Rec {
        Rec {
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            amount,
        }
    }

    fn date_of(r: &Rec) -> Option<NaiveDate> {
        r.date
    }

    fn amount_of(r: &Rec) -> Money {
        Money::from(r.amount)
    }

    #[test]
    fn test_bucket_by_month_sums_and_counts() {
        let records = vec![rec(Some((2024, 1, 15)), 100), rec(Some((2024, 1, 20)), 200)];
        let buckets = bucket_by_month(&records, date_of, amount_of);
        assert_eq!(
            buckets,
            vec![MonthBucket {
                month_key: "2024-01".to_string(),
                amount_total: Money::from(300),
                count: 2,
            }]
        );
    }

    #[test]
    fn test_bucket_order_is_chronological() {
        let records = vec![
            rec(Some((2024, 2, 1)), 1),
            rec(Some((2023, 12, 1)), 1),
            rec(Some((2024, 1, 1)), 1),
        ];
        let keys: Vec<String> = bucket_by_month(&records, date_of, amount_of)
            .into_iter()
            .map(|b| b.month_key)
            .collect();
        assert_eq!(keys, vec!["2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn test_bucket_skips_undated_records() {
        let records = vec![rec(None, 500), rec(Some((2024, 1, 1)), 1)];
        let buckets = bucket_by_month(&records, date_of, amount_of);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 1);
    }

    #[test]
    fn test_window_max_passes_everything() {
        let records = vec![rec(None, 1), rec(Some((2019, 1, 1)), 1)];
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let kept = filter_by_window(&records, date_of, TimeWindow::Max, today);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_window_ytd_cutoff() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let records = vec![
            rec(Some((2023, 12, 31)), 1),
            rec(Some((2024, 1, 1)), 1),
            rec(None, 1),
        ];
        let kept = filter_by_window(&records, date_of, TimeWindow::YearToDate, today);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_window_one_month_is_thirty_days() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(
            TimeWindow::OneMonth.cutoff(today),
            NaiveDate::from_ymd_opt(2024, 5, 31)
        );
    }

    #[test]
    fn test_window_one_year_is_calendar_year() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            TimeWindow::OneYear.cutoff(today),
            NaiveDate::from_ymd_opt(2023, 2, 28)
        );
    }

    #[test]
    fn test_category_totals_descending() {
        let records = vec![
            ("Security".to_string(), 10),
            ("Ecosystem".to_string(), 50),
            ("Security".to_string(), 15),
        ];
        let totals = category_totals(
            &records,
            |(label, _)| Some(label.clone()),
            |(_, amount)| Money::from(*amount),
        );
        assert_eq!(
            totals,
            vec![
                ("Ecosystem".to_string(), Money::from(50)),
                ("Security".to_string(), Money::from(25)),
            ]
        );
    }

    fn funds_row(label: Cell, value: Cell) -> Vec<Cell> {
        let mut row = vec![Cell::Empty; FUNDS_LABEL_COL];
        row.push(label);
        row.push(value);
        row
    }

    #[test]
    fn test_funds_scan_reads_positional_columns() {
        let rows = vec![
            funds_row(Cell::from("Security"), Cell::Number(1000.0)),
            funds_row(Cell::from("Security"), Cell::from("$500")),
            funds_row(Cell::from("Ecosystem"), Cell::Number(2000.0)),
        ];
        let totals = funds_category_totals(&rows);
        assert_eq!(
            totals,
            vec![
                ("Ecosystem".to_string(), Money::from(2000)),
                ("Security".to_string(), Money::from(1500)),
            ]
        );
    }

    #[test]
    fn test_funds_scan_rejects_long_labels_and_nonpositive_amounts() {
        let long_label = "x".repeat(61);
        let rows = vec![
            funds_row(Cell::from(long_label.as_str()), Cell::Number(1000.0)),
            funds_row(Cell::from("Zeroed"), Cell::Number(0.0)),
            funds_row(Cell::Number(42.0), Cell::Number(1000.0)),
        ];
        assert!(funds_category_totals(&rows).is_empty());
    }
}
