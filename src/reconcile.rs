//! Joins the aggregated projects against the independently-maintained
//! tracking ledger.
//!
//! The two ledgers share no stable identifier, so the join key is the
//! normalized proposal title. The join is deliberately lossy and best-effort:
//! an unmatched title is not an error, the record simply keeps its pre-join
//! defaults. Conflict policy within the tracking ledger is first-write-wins
//! for submission dates (the earliest date is the submission) and
//! last-write-wins for the decision text (later rows reflect later rulings).

use crate::coerce::{self, clean_text, normalize_key, Cell};
use crate::model::{DecisionStatus, Project};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

// The tracking sheet is column-positional: A=submission date, B=proposal
// title, F=decision text, G=discussion link.
const COL_DATE: usize = 0;
const COL_TITLE: usize = 1;
const COL_DECISION: usize = 5;
const COL_LINK: usize = 6;

/// What the tracking ledger knows about one proposal title.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TrackingEntry {
    pub title: String,
    pub submission_date: Option<NaiveDate>,
    pub decision: DecisionStatus,
    pub forum_link: Option<Url>,
}

/// Lookup from normalized proposal title to tracking data, built in one scan
/// of the tracking sheet.
#[derive(Debug, Default)]
pub struct TrackingIndex {
    entries: HashMap<String, TrackingEntry>,
}

impl TrackingIndex {
    /// Scans positional tracking rows. The first row is the header and is
    /// skipped.
    pub fn from_rows(rows: &[Vec<Cell>]) -> Self {
        let mut entries: HashMap<String, TrackingEntry> = HashMap::new();

        for row in rows.iter().skip(1) {
            let title = row
                .get(COL_TITLE)
                .map(|c| clean_text(&c.text()))
                .unwrap_or_default();
            if title.is_empty() {
                continue;
            }
            let key = normalize_key(&title);
            let entry = entries.entry(key).or_insert_with(|| TrackingEntry {
                title: title.clone(),
                ..TrackingEntry::default()
            });

            // Earliest date seen for a title is its submission date.
            if let Some(date) = row.get(COL_DATE).and_then(coerce::coerce_date) {
                if entry.submission_date.map(|d| date < d).unwrap_or(true) {
                    entry.submission_date = Some(date);
                }
            }

            // Later rows overwrite the decision, but only when they carry one.
            let decision_text = row
                .get(COL_DECISION)
                .map(|c| clean_text(&c.text()))
                .unwrap_or_default();
            if !decision_text.is_empty() {
                entry.decision = classify_decision(&decision_text);
            }

            if let Some(link) = row
                .get(COL_LINK)
                .and_then(|c| Url::parse(c.text().trim()).ok())
            {
                entry.forum_link = Some(link);
            }
        }

        debug!("tracking index holds {} titles", entries.len());
        Self { entries }
    }

    pub fn get(&self, title: &str) -> Option<&TrackingEntry> {
        self.entries.get(&normalize_key(title))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &TrackingEntry> {
        self.entries.values()
    }
}

/// Classifies the free-text decision column. Substring rules, case
/// insensitive, checked in this precedence order.
pub fn classify_decision(raw: &str) -> DecisionStatus {
    let text = normalize_key(raw);
    if text.contains("approved") {
        DecisionStatus::Approved
    } else if text.contains("reject") || text.contains("decline") {
        DecisionStatus::Rejected
    } else if text.contains("withdraw") {
        DecisionStatus::Withdrawn
    } else if text.contains("filter") {
        DecisionStatus::Filtered
    } else if text.contains("discussion") {
        DecisionStatus::Discussion
    } else {
        DecisionStatus::Unknown
    }
}

/// Enriches the aggregated projects from the tracking index and appends
/// pipeline-only records.
///
/// Backfill touches only fields the project does not already have. Synthesis
/// adds a waiting, zero-amount project for every rejected or
/// discussion-status title that never entered the paid ledger.
pub fn reconcile(projects: &mut Vec<Project>, tracking: &TrackingIndex) {
    for project in projects.iter_mut() {
        let Some(entry) = tracking.get(&project.title) else {
            continue;
        };
        if project.submission_date.is_none() {
            project.submission_date = entry.submission_date;
        }
        if project.decision == DecisionStatus::Unknown {
            project.decision = entry.decision;
        }
        if project.forum_link.is_none() {
            project.forum_link = entry.forum_link.clone();
        }
    }

    let known: std::collections::HashSet<String> = projects
        .iter()
        .map(|p| normalize_key(&p.title))
        .collect();

    let mut synthesized = 0;
    for entry in tracking.entries() {
        let eligible = matches!(
            entry.decision,
            DecisionStatus::Rejected | DecisionStatus::Discussion
        );
        if !eligible || known.contains(&normalize_key(&entry.title)) {
            continue;
        }
        let mut project = Project {
            title: entry.title.clone(),
            submission_date: entry.submission_date,
            decision: entry.decision,
            forum_link: entry.forum_link.clone(),
            ..Project::default()
        };
        project.derive_status();
        projects.push(project);
        synthesized += 1;
    }
    if synthesized > 0 {
        debug!("synthesized {synthesized} pipeline-only projects");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LifecycleStatus, Money};

    fn tracking_row(date: &str, title: &str, decision: &str) -> Vec<Cell> {
        vec![
            Cell::from(date),
            Cell::from(title),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::from(decision),
            Cell::Empty,
        ]
    }

    fn header() -> Vec<Cell> {
        tracking_row("Date", "Proposal Title", "Decision")
    }

    #[test]
    fn test_classify_decision_precedence() {
        assert_eq!(classify_decision("Approved"), DecisionStatus::Approved);
        assert_eq!(classify_decision("REJECTED"), DecisionStatus::Rejected);
        assert_eq!(classify_decision("Declined by committee"), DecisionStatus::Rejected);
        assert_eq!(classify_decision("Withdrawn by applicant"), DecisionStatus::Withdrawn);
        assert_eq!(classify_decision("Filtered by FPF"), DecisionStatus::Filtered);
        assert_eq!(classify_decision("Discussion Required"), DecisionStatus::Discussion);
        assert_eq!(classify_decision("???"), DecisionStatus::Unknown);
    }

    #[test]
    fn test_earliest_submission_date_wins() {
        let rows = vec![
            header(),
            tracking_row("3/1/2024", "Wallet Audit", ""),
            tracking_row("1/15/2024", "Wallet Audit", "Approved"),
        ];
        let index = TrackingIndex::from_rows(&rows);
        let entry = index.get("wallet audit").unwrap();
        assert_eq!(entry.submission_date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_decision_last_write_wins() {
        let rows = vec![
            header(),
            tracking_row("1/1/2024", "Wallet Audit", "Discussion Required"),
            tracking_row("2/1/2024", "Wallet Audit", "Approved"),
        ];
        let index = TrackingIndex::from_rows(&rows);
        assert_eq!(
            index.get("Wallet Audit").unwrap().decision,
            DecisionStatus::Approved
        );
    }

    #[test]
    fn test_blank_decision_does_not_overwrite() {
        let rows = vec![
            header(),
            tracking_row("1/1/2024", "Wallet Audit", "Approved"),
            tracking_row("2/1/2024", "Wallet Audit", ""),
        ];
        let index = TrackingIndex::from_rows(&rows);
        assert_eq!(
            index.get("Wallet Audit").unwrap().decision,
            DecisionStatus::Approved
        );
    }

    #[test]
    fn test_backfill_only_fills_empty_fields() {
        let rows = vec![header(), tracking_row("1/15/2024", "Wallet Audit", "Approved")];
        let index = TrackingIndex::from_rows(&rows);

        let mut projects = vec![Project {
            title: "Wallet Audit".to_string(),
            grantee: "ACME".to_string(),
            submission_date: NaiveDate::from_ymd_opt(2023, 12, 1),
            ..Project::default()
        }];
        reconcile(&mut projects, &index);

        // Existing submission date is kept; the decision is backfilled.
        assert_eq!(
            projects[0].submission_date,
            NaiveDate::from_ymd_opt(2023, 12, 1)
        );
        assert_eq!(projects[0].decision, DecisionStatus::Approved);
    }

    #[test]
    fn test_unmatched_join_keeps_defaults() {
        let index = TrackingIndex::from_rows(&[header()]);
        let mut projects = vec![Project {
            title: "Nowhere To Be Found".to_string(),
            ..Project::default()
        }];
        reconcile(&mut projects, &index);
        assert_eq!(projects[0].decision, DecisionStatus::Unknown);
        assert_eq!(projects[0].submission_date, None);
    }

    #[test]
    fn test_synthesizes_rejected_and_discussion_only() {
        let rows = vec![
            header(),
            tracking_row("1/1/2024", "Rejected Idea", "Rejected"),
            tracking_row("1/2/2024", "Open Question", "Discussion Required"),
            tracking_row("1/3/2024", "Approved Elsewhere", "Approved"),
        ];
        let index = TrackingIndex::from_rows(&rows);
        let mut projects = Vec::new();
        reconcile(&mut projects, &index);

        let mut titles: Vec<&str> = projects.iter().map(|p| p.title.as_str()).collect();
        titles.sort_unstable();
        assert_eq!(titles, vec!["Open Question", "Rejected Idea"]);
        for p in &projects {
            assert!(p.milestones.is_empty());
            assert_eq!(p.total_amount, Money::ZERO);
            assert_eq!(p.status, LifecycleStatus::Waiting);
            assert!(p.submission_date.is_some());
        }
    }

    #[test]
    fn test_no_duplicate_for_existing_title() {
        let rows = vec![header(), tracking_row("1/1/2024", "Wallet Audit", "Rejected")];
        let index = TrackingIndex::from_rows(&rows);
        let mut projects = vec![Project {
            title: "wallet audit".to_string(),
            grantee: "ACME".to_string(),
            ..Project::default()
        }];
        reconcile(&mut projects, &index);
        assert_eq!(projects.len(), 1);
    }

    #[test]
    fn test_forum_link_parsed() {
        let mut row = tracking_row("1/1/2024", "Wallet Audit", "Approved");
        row[6] = Cell::from("https://forum.example.org/t/wallet-audit/42");
        let index = TrackingIndex::from_rows(&[header(), row]);
        let entry = index.get("Wallet Audit").unwrap();
        assert_eq!(
            entry.forum_link.as_ref().map(Url::as_str),
            Some("https://forum.example.org/t/wallet-audit/42")
        );
    }
}
