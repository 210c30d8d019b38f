//! The user-driven filter pipeline over the project collection.
//!
//! Filtering is pure: the same `FilterState` applied to the same base
//! collection always yields the same ordered result, and the base collection
//! is never mutated. Predicates apply in a fixed order: free-text search,
//! then status, then budget band, then category, then the sort comparator.

use crate::coerce::normalize_key;
use crate::model::{LifecycleStatus, Money, Project};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    InProgress,
    Waiting,
}

serde_plain::derive_display_from_serialize!(StatusFilter);
serde_plain::derive_fromstr_from_deserialize!(StatusFilter);

impl StatusFilter {
    fn matches(&self, project: &Project) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => project.status == LifecycleStatus::Completed,
            StatusFilter::InProgress => project.status == LifecycleStatus::InProgress,
            StatusFilter::Waiting => project.status == LifecycleStatus::Waiting,
        }
    }
}

/// Three-tier classification of a grant's total budget.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetFilter {
    #[default]
    All,
    /// Below $50k.
    Small,
    /// $50k through $200k, both ends inclusive.
    Medium,
    /// Above $200k.
    Large,
}

serde_plain::derive_display_from_serialize!(BudgetFilter);
serde_plain::derive_fromstr_from_deserialize!(BudgetFilter);

impl BudgetFilter {
    /// Band membership for a total amount. Also used by the per-grantee
    /// payout charts, which band aggregated totals rather than projects.
    pub fn matches(&self, total: Money) -> bool {
        let small_cap = Money::from(50_000);
        let medium_cap = Money::from(200_000);
        match self {
            BudgetFilter::All => true,
            BudgetFilter::Small => total < small_cap,
            BudgetFilter::Medium => total >= small_cap && total <= medium_cap,
            BudgetFilter::Large => total > medium_cap,
        }
    }
}

/// The four sort modes the sort button cycles through.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    #[default]
    NewestPaid,
    OldestPaid,
    LargestTotal,
    SmallestTotal,
}

serde_plain::derive_display_from_serialize!(SortMode);
serde_plain::derive_fromstr_from_deserialize!(SortMode);

impl SortMode {
    /// The next mode in the cycle, wrapping after the last.
    pub fn next(self) -> SortMode {
        match self {
            SortMode::NewestPaid => SortMode::OldestPaid,
            SortMode::OldestPaid => SortMode::LargestTotal,
            SortMode::LargestTotal => SortMode::SmallestTotal,
            SortMode::SmallestTotal => SortMode::NewestPaid,
        }
    }

    fn compare(&self, a: &Project, b: &Project) -> Ordering {
        match self {
            SortMode::NewestPaid => cmp_dates_none_last(a.last_paid_date, b.last_paid_date, true),
            SortMode::OldestPaid => cmp_dates_none_last(a.last_paid_date, b.last_paid_date, false),
            SortMode::LargestTotal => b.total_amount.cmp(&a.total_amount),
            SortMode::SmallestTotal => a.total_amount.cmp(&b.total_amount),
        }
    }
}

/// Records with no paid date sort after all dated records regardless of
/// direction.
fn cmp_dates_none_last(a: Option<NaiveDate>, b: Option<NaiveDate>, newest_first: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            if newest_first {
                y.cmp(&x)
            } else {
                x.cmp(&y)
            }
        }
    }
}

/// The session-lived filter state. Mutated only by explicit user actions;
/// every change re-derives the visible subset from the full collection.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FilterState {
    pub status: StatusFilter,
    pub budget: BudgetFilter,
    /// `None` means all categories; compared case-insensitively.
    pub category: Option<String>,
    pub search: String,
    pub sort: SortMode,
}

impl FilterState {
    /// Derives the visible, ordered subset. Idempotent and side-effect free.
    pub fn apply(&self, projects: &[Project]) -> Vec<Project> {
        let query = normalize_key(&self.search);
        let category = self.category.as_deref().map(normalize_key);

        let mut visible: Vec<Project> = projects
            .iter()
            .filter(|p| query.is_empty() || self.search_matches(p, &query))
            .filter(|p| self.status.matches(p))
            .filter(|p| self.budget.matches(p.total_amount))
            .filter(|p| match &category {
                None => true,
                Some(wanted) => {
                    p.category.as_deref().map(normalize_key).as_deref() == Some(wanted.as_str())
                }
            })
            .cloned()
            .collect();
        visible.sort_by(|a, b| self.sort.compare(a, b));
        visible
    }

    fn search_matches(&self, project: &Project, query: &str) -> bool {
        normalize_key(&project.title).contains(query)
            || normalize_key(&project.grantee).contains(query)
            || project
                .category
                .as_deref()
                .map(|c| normalize_key(c).contains(query))
                .unwrap_or(false)
    }
}
