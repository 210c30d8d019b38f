//! Per-grantee payout totals and future milestone liabilities.
//!
//! Two sources feed the paid-out chart: the milestone ledger (dated rows,
//! used for the bounded time windows) and the funds-distribution sheet
//! (pre-summed per recipient, used for the unbounded window). The funds
//! sheet's column names have drifted over time, so its columns are located
//! by keyword rather than exact name.

use crate::bucket::{category_totals, filter_by_window, TimeWindow};
use crate::coerce::{self, clean_text, normalize_key};
use crate::filter::BudgetFilter;
use crate::model::{GrantRow, Money};
use crate::source::{Workbook, FUNDS_DISTRIBUTION, FUNDS_HEADER_ROW};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// One payment attributed to a grantee.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PayoutEntry {
    pub grantee: String,
    pub amount: Money,
    pub date: Option<NaiveDate>,
}

/// Paid milestone-ledger rows as payout entries: positive amount and a
/// parsed paid date.
pub fn grants_payout_entries(rows: &[GrantRow]) -> Vec<PayoutEntry> {
    rows.iter()
        .filter(|r| r.paid_date.is_some())
        .filter_map(|r| {
            let amount = r.amount_usd?;
            if amount <= Money::ZERO {
                return None;
            }
            Some(PayoutEntry {
                grantee: r.grantee.clone(),
                amount,
                date: r.paid_date,
            })
        })
        .collect()
}

/// Finds the first funds-sheet header whose normalized text contains any of
/// the keywords, returning the cleaned header name for record lookup.
fn funds_header(workbook: &Workbook, keywords: &[&str]) -> Option<String> {
    let headers = workbook.rows(FUNDS_DISTRIBUTION).get(FUNDS_HEADER_ROW)?;
    headers.iter().map(|c| clean_text(&c.text())).find(|h| {
        let key = normalize_key(h);
        keywords.iter().any(|k| key.contains(k))
    })
}

/// Pre-summed payouts from the funds sheet, one entry per recipient row.
/// These carry no date; they exist for the unbounded window.
pub fn funds_payout_entries(workbook: &Workbook) -> Vec<PayoutEntry> {
    let Some(recipient_col) = funds_header(workbook, &["recipient", "classification"]) else {
        return Vec::new();
    };
    let Some(paid_col) = funds_header(workbook, &["paid out"]) else {
        return Vec::new();
    };

    workbook
        .records(FUNDS_DISTRIBUTION, FUNDS_HEADER_ROW)
        .iter()
        .filter_map(|record| {
            let grantee = record
                .get(&recipient_col)
                .map(|c| clean_text(&c.text()))
                .unwrap_or_default();
            let amount = record
                .get(&paid_col)
                .and_then(coerce::coerce_number)
                .unwrap_or_default();
            if grantee.is_empty() || amount <= Decimal::ZERO {
                return None;
            }
            Some(PayoutEntry {
                grantee,
                amount: Money::new(amount),
                date: None,
            })
        })
        .collect()
}

/// Outstanding future-milestone liabilities per grantee from the funds
/// sheet, descending by amount.
pub fn future_milestones_by_grantee(workbook: &Workbook) -> Vec<(String, Money)> {
    let Some(recipient_col) = funds_header(workbook, &["recipient", "classification"]) else {
        return Vec::new();
    };
    let Some(future_col) = funds_header(workbook, &["future milestones"]) else {
        return Vec::new();
    };

    let entries: Vec<PayoutEntry> = workbook
        .records(FUNDS_DISTRIBUTION, FUNDS_HEADER_ROW)
        .iter()
        .filter_map(|record| {
            let grantee = record
                .get(&recipient_col)
                .map(|c| clean_text(&c.text()))
                .unwrap_or_default();
            let amount = record
                .get(&future_col)
                .and_then(coerce::coerce_number)
                .unwrap_or_default();
            if grantee.is_empty() || amount <= Decimal::ZERO {
                return None;
            }
            Some(PayoutEntry {
                grantee,
                amount: Money::new(amount),
                date: None,
            })
        })
        .collect();
    totals_by_grantee(&entries)
}

/// Sums entries per grantee, descending by total.
pub fn totals_by_grantee(entries: &[PayoutEntry]) -> Vec<(String, Money)> {
    category_totals(entries, |e| Some(e.grantee.clone()), |e| e.amount)
}

/// The paid-out chart pipeline: window the entries, sum per grantee, then
/// band the aggregated totals.
pub fn paid_by_grantee(
    entries: &[PayoutEntry],
    window: TimeWindow,
    band: BudgetFilter,
    today: NaiveDate,
) -> Vec<(String, Money)> {
    let windowed: Vec<PayoutEntry> = filter_by_window(entries, |e| e.date, window, today)
        .into_iter()
        .cloned()
        .collect();
    totals_by_grantee(&windowed)
        .into_iter()
        .filter(|(_, total)| band.matches(*total))
        .collect()
}
