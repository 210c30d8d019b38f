//! The dashboard controller: owns the workbook handle, the aggregated
//! project collection, and the session filter state.

use crate::aggregate::aggregate;
use crate::bucket::{
    bucket_by_month, filter_by_window, funds_category_totals, MonthBucket, TimeWindow,
};
use crate::coerce::normalize_key;
use crate::filter::{BudgetFilter, FilterState, SortMode, StatusFilter};
use crate::ic_payouts::{IcPayoutReport, IcPayoutRow};
use crate::liquidity::LiquiditySummary;
use crate::model::{DecisionStatus, GrantRow, Money, Project};
use crate::overview::{self, ActivityStats, Overview};
use crate::payouts;
use crate::reconcile::{reconcile, TrackingIndex};
use crate::source::{
    FetchWorkbook, Workbook, WorkbookCache, ALL_GRANTS_TRACKING, DASHBOARD, FUNDS_DISTRIBUTION,
    GRANTS, IC_PAYOUTS, LIQUIDITY, STIPENDS,
};
use crate::stipends::{StipendReport, StipendRow};
use crate::Result;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Display theme. Persisted by the embedding UI, not by this crate.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

serde_plain::derive_display_from_serialize!(Theme);
serde_plain::derive_fromstr_from_deserialize!(Theme);

impl Theme {
    pub fn toggle(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Session-lived dashboard state. One `load` per session pulls the workbook,
/// aggregates the milestone ledger and reconciles it against the tracking
/// ledger; everything after that is pure derivation over the held collection.
pub struct Dashboard {
    source: WorkbookCache,
    projects: Vec<Project>,
    tracking: TrackingIndex,
    filters: FilterState,
}

impl Dashboard {
    pub fn new(fetcher: Box<dyn FetchWorkbook + Send + Sync>) -> Self {
        Self {
            source: WorkbookCache::new(fetcher),
            projects: Vec::new(),
            tracking: TrackingIndex::default(),
            filters: FilterState::default(),
        }
    }

    /// A dashboard over an already-parsed workbook. Never fetches.
    pub fn preloaded(workbook: Workbook) -> Self {
        Self {
            source: WorkbookCache::preloaded(workbook),
            projects: Vec::new(),
            tracking: TrackingIndex::default(),
            filters: FilterState::default(),
        }
    }

    /// Builds the project collection: milestone rows are typed, aggregated
    /// per (title, grantee), then reconciled against the tracking ledger.
    /// The collection is replaced wholesale, never patched.
    pub async fn load(&mut self) -> Result<()> {
        let workbook = self.source.load().await?;

        let rows: Vec<GrantRow> = workbook
            .records(GRANTS, 0)
            .iter()
            .filter_map(GrantRow::from_record)
            .collect();
        let mut projects = aggregate(&rows);

        let tracking = TrackingIndex::from_rows(workbook.rows(ALL_GRANTS_TRACKING));
        reconcile(&mut projects, &tracking);

        debug!(
            "loaded {} projects from {} ledger rows",
            projects.len(),
            rows.len()
        );
        self.projects = projects;
        self.tracking = tracking;
        Ok(())
    }

    /// Every project, unfiltered, in aggregation order.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// The filtered, sorted subset the list view shows.
    pub fn visible(&self) -> Vec<Project> {
        self.filters.apply(&self.projects)
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_status(&mut self, status: StatusFilter) {
        self.filters.status = status;
    }

    pub fn set_budget(&mut self, budget: BudgetFilter) {
        self.filters.budget = budget;
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.filters.category = category;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filters.search = search.into();
    }

    /// Advances the sort button to its next mode and returns it.
    pub fn cycle_sort(&mut self) -> SortMode {
        self.filters.sort = self.filters.sort.next();
        self.filters.sort
    }

    /// The distinct category labels across all projects, sorted, for the
    /// category dropdown.
    pub fn categories(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .projects
            .iter()
            .filter_map(|p| p.category.clone())
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }

    /// Headline figures from the published dashboard sheet.
    pub async fn overview(&self) -> Result<Overview> {
        let workbook = self.source.load().await?;
        Ok(Overview::from_rows(workbook.rows(DASHBOARD)))
    }

    /// Committee activity stats derived from the held collection.
    pub fn activity(&self, today: NaiveDate) -> ActivityStats {
        ActivityStats::compute(&self.projects, today)
    }

    /// Category totals from the funds-distribution sheet's side columns.
    pub async fn funds_breakdown(&self) -> Result<Vec<(String, Money)>> {
        let workbook = self.source.load().await?;
        Ok(funds_category_totals(workbook.rows(FUNDS_DISTRIBUTION)))
    }

    /// Committee stipend totals and monthly breakdown.
    pub async fn stipends(&self) -> Result<StipendReport> {
        let workbook = self.source.load().await?;
        let rows: Vec<StipendRow> = workbook
            .records(STIPENDS, 0)
            .iter()
            .map(StipendRow::from_record)
            .collect();
        Ok(StipendReport::compute(&rows))
    }

    /// Independent-contractor payout report, notetaker rows excluded.
    pub async fn ic_payouts(&self) -> Result<IcPayoutReport> {
        let workbook = self.source.load().await?;
        let rows: Vec<IcPayoutRow> = workbook
            .records(IC_PAYOUTS, 0)
            .iter()
            .map(IcPayoutRow::from_record)
            .filter(|r| !r.is_notetaker())
            .collect();
        Ok(IcPayoutReport::compute(&rows))
    }

    /// Liquidity-position summary from the liquidity sheet.
    pub async fn liquidity(&self) -> Result<LiquiditySummary> {
        let workbook = self.source.load().await?;
        Ok(LiquiditySummary::from_rows(workbook.rows(LIQUIDITY)))
    }

    /// Per-grantee paid-out totals for the window and budget band. Bounded
    /// windows draw from the dated milestone ledger; the unbounded window
    /// uses the funds sheet's pre-summed recipient rows.
    pub async fn paid_by_grantee(
        &self,
        window: TimeWindow,
        band: BudgetFilter,
        today: NaiveDate,
    ) -> Result<Vec<(String, Money)>> {
        let workbook = self.source.load().await?;
        let entries = match window {
            TimeWindow::Max => payouts::funds_payout_entries(workbook),
            _ => {
                let rows: Vec<GrantRow> = workbook
                    .records(GRANTS, 0)
                    .iter()
                    .filter_map(GrantRow::from_record)
                    .collect();
                payouts::grants_payout_entries(&rows)
            }
        };
        Ok(payouts::paid_by_grantee(&entries, window, band, today))
    }

    /// Outstanding future-milestone liabilities per grantee.
    pub async fn future_milestones(&self) -> Result<Vec<(String, Money)>> {
        let workbook = self.source.load().await?;
        Ok(payouts::future_milestones_by_grantee(workbook))
    }

    /// Proposals received in `today`'s year, counted from the tracking
    /// sheet's date column.
    pub async fn proposals_received_ytd(&self, today: NaiveDate) -> Result<usize> {
        let workbook = self.source.load().await?;
        Ok(overview::proposals_received(
            workbook.rows(ALL_GRANTS_TRACKING),
            today.year(),
        ))
    }

    /// Monthly payout series within the window: one record per paid
    /// milestone, dated by its paid date.
    pub fn payouts_by_month(&self, window: TimeWindow, today: NaiveDate) -> Vec<MonthBucket> {
        let payouts: Vec<(NaiveDate, Money)> = self
            .projects
            .iter()
            .flat_map(|p| p.milestones.iter())
            .filter_map(|m| m.paid_date.map(|d| (d, m.amount)))
            .collect();
        let windowed = filter_by_window(&payouts, |(d, _)| Some(*d), window, today);
        let windowed: Vec<(NaiveDate, Money)> = windowed.into_iter().copied().collect();
        bucket_by_month(&windowed, |(d, _)| Some(*d), |(_, m)| *m)
    }

    /// Monthly approvals series within the window: approved tracking entries
    /// dated by submission, valued at the matching project's total budget
    /// (zero when the title never entered the milestone ledger).
    pub fn approvals_by_month(&self, window: TimeWindow, today: NaiveDate) -> Vec<MonthBucket> {
        let totals: HashMap<String, Money> = self
            .projects
            .iter()
            .map(|p| (normalize_key(&p.title), p.total_amount))
            .collect();

        let approved: Vec<(Option<NaiveDate>, Money)> = self
            .tracking
            .entries()
            .filter(|e| e.decision == DecisionStatus::Approved)
            .map(|e| {
                let amount = totals
                    .get(&normalize_key(&e.title))
                    .copied()
                    .unwrap_or(Money::ZERO);
                (e.submission_date, amount)
            })
            .collect();
        let windowed = filter_by_window(&approved, |(d, _)| *d, window, today);
        let windowed: Vec<(Option<NaiveDate>, Money)> = windowed.into_iter().cloned().collect();
        bucket_by_month(&windowed, |(d, _)| *d, |(_, m)| *m)
    }
}
