//! Folds milestone-level ledger rows into one aggregate record per
//! (project, grantee) pair.

use crate::coerce::normalize_key;
use crate::model::{GrantRow, Milestone, Project};
use std::collections::BTreeMap;
use tracing::debug;

/// Aggregates ledger rows into the project collection.
///
/// One row is one milestone. The identity key is the normalized
/// (project, grantee) pair; rows that could not produce a key never reach
/// this function. Category is first-write-wins per key. Paid totals and the
/// last-paid date move only when the row's paid date parsed; the decision
/// date keeps the earliest ruling seen. Lifecycle status is derived after
/// the fold.
///
/// Output order is deterministic: ascending by normalized key.
pub fn aggregate(rows: &[GrantRow]) -> Vec<Project> {
    let mut by_key: BTreeMap<(String, String), Project> = BTreeMap::new();

    for row in rows {
        let key = (normalize_key(&row.project), normalize_key(&row.grantee));
        let project = by_key.entry(key).or_insert_with(|| Project {
            title: row.project.clone(),
            grantee: row.grantee.clone(),
            ..Project::default()
        });

        if project.category.is_none() {
            project.category = row.category.clone();
        }

        let amount = row.amount_usd.unwrap_or_default();
        project.total_amount += amount;

        if let Some(paid) = row.paid_date {
            project.paid_amount += amount;
            if project.last_paid_date.map(|d| paid > d).unwrap_or(true) {
                project.last_paid_date = Some(paid);
            }
        }

        if let Some(decided) = row.decision_date {
            if project.decision_date.map(|d| decided < d).unwrap_or(true) {
                project.decision_date = Some(decided);
            }
        }

        project.milestones.push(Milestone {
            amount,
            zec_amount: row.zec_disbursed,
            due_date: row.due_date,
            paid_date: row.paid_date,
            estimate_date: row.estimate_date,
        });
    }

    let mut projects: Vec<Project> = by_key.into_values().collect();
    for project in &mut projects {
        project.derive_status();
    }
    debug!("aggregated {} projects", projects.len());
    projects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LifecycleStatus, Money};
    use chrono::NaiveDate;

    fn row(project: &str, grantee: &str, amount: i64, paid: Option<&str>) -> GrantRow {
        GrantRow {
            project: project.to_string(),
            grantee: grantee.to_string(),
            amount_usd: Some(Money::from(amount)),
            paid_date: paid.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
            ..GrantRow::default()
        }
    }

    #[test]
    fn test_two_rows_one_project() {
        // Ledger scenario: $10,000 paid 1/5/2024 plus $5,000 unpaid.
        let rows = vec![
            row("A", "X", 10_000, Some("2024-01-05")),
            row("A", "X", 5_000, None),
        ];
        let projects = aggregate(&rows);
        assert_eq!(projects.len(), 1);
        let p = &projects[0];
        assert_eq!(p.total_amount, Money::from(15_000));
        assert_eq!(p.paid_amount, Money::from(10_000));
        assert_eq!(p.completed_milestones(), 1);
        assert_eq!(p.total_milestones(), 2);
        assert_eq!(p.status, LifecycleStatus::InProgress);
    }

    #[test]
    fn test_total_equals_milestone_sum() {
        let rows = vec![
            row("A", "X", 3, Some("2024-02-01")),
            row("A", "X", 4, None),
            row("A", "X", 5, Some("2024-03-01")),
        ];
        let p = &aggregate(&rows)[0];
        let milestone_sum: Money = p.milestones.iter().map(|m| m.amount).sum();
        assert_eq!(p.total_amount, milestone_sum);
        assert!(p.paid_amount <= p.total_amount);
    }

    #[test]
    fn test_last_paid_date_is_max() {
        let rows = vec![
            row("A", "X", 1, Some("2024-03-01")),
            row("A", "X", 1, Some("2024-01-01")),
        ];
        let p = &aggregate(&rows)[0];
        assert_eq!(p.last_paid_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_key_distinguishes_grantees() {
        let rows = vec![row("A", "X", 1, None), row("A", "Y", 1, None)];
        assert_eq!(aggregate(&rows).len(), 2);
    }

    #[test]
    fn test_key_normalization_merges_spacing_variants() {
        let mut a = row("Wallet Audit", "ACME", 1, None);
        a.project = "Wallet\u{a0}Audit".to_string();
        let b = row("wallet audit", "acme", 2, None);
        let projects = aggregate(&[a, b]);
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].total_amount, Money::from(3));
    }

    #[test]
    fn test_category_first_write_wins() {
        let mut first = row("A", "X", 1, None);
        first.category = Some("Security".to_string());
        let mut second = row("A", "X", 1, None);
        second.category = Some("Ecosystem".to_string());
        let projects = aggregate(&[first, second]);
        assert_eq!(projects[0].category.as_deref(), Some("Security"));
    }

    #[test]
    fn test_category_fills_from_later_row_when_first_blank() {
        let first = row("A", "X", 1, None);
        let mut second = row("A", "X", 1, None);
        second.category = Some("Ecosystem".to_string());
        let projects = aggregate(&[first, second]);
        assert_eq!(projects[0].category.as_deref(), Some("Ecosystem"));
    }

    #[test]
    fn test_all_paid_is_completed() {
        let rows = vec![
            row("A", "X", 1, Some("2024-01-01")),
            row("A", "X", 1, Some("2024-02-01")),
        ];
        assert_eq!(aggregate(&rows)[0].status, LifecycleStatus::Completed);
    }

    #[test]
    fn test_none_paid_is_waiting() {
        let rows = vec![row("A", "X", 1, None)];
        assert_eq!(aggregate(&rows)[0].status, LifecycleStatus::Waiting);
    }

    #[test]
    fn test_earliest_decision_date_wins() {
        let mut late = row("A", "X", 1, None);
        late.decision_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        let mut early = row("A", "X", 1, None);
        early.decision_date = NaiveDate::from_ymd_opt(2024, 2, 1);
        let p = &aggregate(&[late, early])[0];
        assert_eq!(p.decision_date, NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn test_zec_carried_onto_milestones() {
        use rust_decimal::Decimal;
        let mut r = row("A", "X", 1, Some("2024-01-05"));
        r.zec_disbursed = Some(Decimal::new(125, 1));
        let p = &aggregate(&[r])[0];
        assert_eq!(p.milestones[0].zec_amount, Some(Decimal::new(125, 1)));
    }

    #[test]
    fn test_missing_amount_counts_as_zero() {
        let mut r = row("A", "X", 0, Some("2024-01-01"));
        r.amount_usd = None;
        let p = &aggregate(&[r])[0];
        assert!(p.total_amount.is_zero());
        assert_eq!(p.total_milestones(), 1);
    }
}
