//! Headline figures read from the dashboard sheet and activity stats derived
//! from the aggregated projects.

use crate::coerce::{self, normalize_key, Cell};
use crate::model::{LifecycleStatus, Money, Project};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Looks up a labeled value in a two-column metrics sheet: the first row
/// whose label column contains `label` (normalized) yields its value column.
pub fn metric_value(rows: &[Vec<Cell>], label: &str) -> Option<Cell> {
    let wanted = normalize_key(label);
    rows.iter()
        .find(|row| {
            row.first()
                .map(|c| normalize_key(&c.text()).contains(&wanted))
                .unwrap_or(false)
        })
        .and_then(|row| row.get(1))
        .cloned()
}

/// The funding figures the committee publishes on its dashboard sheet.
/// Any figure the sheet does not carry stays `None`; the view renders a
/// placeholder.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Overview {
    pub approved_total: Option<Money>,
    pub paid_out_total: Option<Money>,
    pub usd_balance: Option<Money>,
    pub future_liabilities: Option<Money>,
    pub unhedged_liabilities: Option<Money>,
    pub usd_reserves: Option<Money>,
    pub zec_balance: Option<Decimal>,
    pub zec_balance_usd: Option<Money>,
    pub zec_accrued_total: Option<Decimal>,
    pub zec_accrued_dev_fund_1: Option<Decimal>,
    pub zec_accrued_dev_fund_2: Option<Decimal>,
    pub zec_price: Option<Decimal>,
    pub as_of: Option<NaiveDate>,
}

impl Overview {
    pub fn from_rows(rows: &[Vec<Cell>]) -> Self {
        let money = |label: &str| {
            metric_value(rows, label)
                .as_ref()
                .and_then(coerce::coerce_number)
                .map(Money::new)
        };
        let number = |label: &str| {
            metric_value(rows, label)
                .as_ref()
                .and_then(coerce::coerce_number)
        };
        Self {
            approved_total: money("Total USD value of grants approved"),
            paid_out_total: money("USD value of grant milestones paid out so far"),
            usd_balance: money("Current USD balance"),
            future_liabilities: money("Future grant liabilities"),
            unhedged_liabilities: money("Unhedged grant liabilities (USD)"),
            usd_reserves: money("USD reserves"),
            zec_balance: number("Current ZEC balance"),
            zec_balance_usd: money("USD value of Current ZEC balance"),
            zec_accrued_total: number("Total ZEC accrued to date"),
            zec_accrued_dev_fund_1: number("ZEC accrued from 1st Dev Fund"),
            zec_accrued_dev_fund_2: number("ZEC accrued from 2nd Dev Fund"),
            zec_price: number("ZECUSD price"),
            as_of: metric_value(rows, "Block time (UTC)")
                .as_ref()
                .and_then(coerce::coerce_date),
        }
    }
}

/// Project-count and payout activity, lifetime and for one calendar year.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ActivityStats {
    pub year: i32,
    pub total_projects: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub waiting: usize,
    pub approved_ytd: usize,
    pub completed_ytd: usize,
    pub payouts_ytd: Money,
    pub zec_payouts_ytd: Decimal,
    pub lifetime_payouts: Money,
    pub first_payout: Option<NaiveDate>,
    pub last_payout: Option<NaiveDate>,
}

impl ActivityStats {
    /// Computes activity over the aggregated projects. "Approved YTD" counts
    /// projects whose earliest activity falls in `today`'s year, preferring
    /// the committee's decision date, then the submission date, then the
    /// first paid milestone; "completed YTD" counts projects whose final
    /// payment did.
    pub fn compute(projects: &[Project], today: NaiveDate) -> Self {
        let year = today.year();
        let mut stats = ActivityStats {
            year,
            total_projects: projects.len(),
            ..ActivityStats::default()
        };

        for project in projects {
            match project.status {
                LifecycleStatus::Completed => stats.completed += 1,
                LifecycleStatus::InProgress => stats.in_progress += 1,
                LifecycleStatus::Waiting => stats.waiting += 1,
            }

            let first_paid = project
                .milestones
                .iter()
                .filter_map(|m| m.paid_date)
                .min();
            let earliest_activity = project
                .decision_date
                .or(project.submission_date)
                .or(first_paid);
            if earliest_activity.map(|d| d.year() == year).unwrap_or(false) {
                stats.approved_ytd += 1;
            }

            if project.status == LifecycleStatus::Completed
                && project
                    .last_paid_date
                    .map(|d| d.year() == year)
                    .unwrap_or(false)
            {
                stats.completed_ytd += 1;
            }

            for milestone in &project.milestones {
                let Some(paid) = milestone.paid_date else {
                    continue;
                };
                stats.lifetime_payouts += milestone.amount;
                if paid.year() == year {
                    stats.payouts_ytd += milestone.amount;
                    if let Some(zec) = milestone.zec_amount {
                        stats.zec_payouts_ytd += zec;
                    }
                }
                if stats.first_payout.map(|d| paid < d).unwrap_or(true) {
                    stats.first_payout = Some(paid);
                }
                if stats.last_payout.map(|d| paid > d).unwrap_or(true) {
                    stats.last_payout = Some(paid);
                }
            }
        }
        stats
    }
}

/// Counts proposals received in `year` by scanning the tracking sheet's
/// first column for dates. Each dated row is one proposal; duplicate titles
/// count separately, matching how the sheet is maintained.
pub fn proposals_received(rows: &[Vec<Cell>], year: i32) -> usize {
    rows.iter()
        .filter_map(|row| row.first())
        .filter_map(coerce::coerce_date)
        .filter(|d| d.year() == year)
        .count()
}
