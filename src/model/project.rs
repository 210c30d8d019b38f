use crate::coerce::normalize_key;
use crate::model::{Milestone, Money};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

/// Where a grant sits in its payout lifecycle, derived from its milestones.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleStatus {
    Completed,
    InProgress,
    #[default]
    Waiting,
}

serde_plain::derive_display_from_serialize!(LifecycleStatus);
serde_plain::derive_fromstr_from_deserialize!(LifecycleStatus);

/// The committee's decision on a proposal, classified from the free-text
/// decision column of the tracking ledger.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionStatus {
    Approved,
    Rejected,
    Withdrawn,
    Filtered,
    Discussion,
    #[default]
    Unknown,
}

serde_plain::derive_display_from_serialize!(DecisionStatus);
serde_plain::derive_fromstr_from_deserialize!(DecisionStatus);

/// The per-(title, grantee) aggregate record the whole dashboard is built
/// around. Constructed once per data load; the collection is rebuilt from
/// scratch on every fetch.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Project {
    pub title: String,
    pub grantee: String,
    pub category: Option<String>,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub milestones: Vec<Milestone>,
    pub last_paid_date: Option<NaiveDate>,
    pub submission_date: Option<NaiveDate>,
    /// Earliest date the committee ruled on the grant, from the milestone
    /// ledger's decision-date column.
    pub decision_date: Option<NaiveDate>,
    pub decision: DecisionStatus,
    pub forum_link: Option<Url>,
    pub status: LifecycleStatus,
}

impl Project {
    /// Identity key within one load cycle: the normalized (title, grantee)
    /// pair.
    pub fn key(&self) -> (String, String) {
        (normalize_key(&self.title), normalize_key(&self.grantee))
    }

    pub fn completed_milestones(&self) -> usize {
        self.milestones.iter().filter(|m| m.is_paid()).count()
    }

    pub fn total_milestones(&self) -> usize {
        self.milestones.len()
    }

    /// Derives the lifecycle status from the milestone list: completed when
    /// every milestone of a non-empty list is paid, waiting when none are
    /// (including the empty list), in-progress otherwise.
    pub fn derive_status(&mut self) {
        let total = self.total_milestones();
        let completed = self.completed_milestones();
        self.status = if total > 0 && completed == total {
            LifecycleStatus::Completed
        } else if completed == 0 {
            LifecycleStatus::Waiting
        } else {
            LifecycleStatus::InProgress
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paid(amount: i64) -> Milestone {
        Milestone {
            amount: Money::from(amount),
            paid_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            ..Milestone::default()
        }
    }

    fn unpaid(amount: i64) -> Milestone {
        Milestone {
            amount: Money::from(amount),
            ..Milestone::default()
        }
    }

    #[test]
    fn test_status_completed() {
        let mut p = Project {
            milestones: vec![paid(1), paid(2)],
            ..Project::default()
        };
        p.derive_status();
        assert_eq!(p.status, LifecycleStatus::Completed);
    }

    #[test]
    fn test_status_in_progress() {
        let mut p = Project {
            milestones: vec![paid(1), unpaid(2)],
            ..Project::default()
        };
        p.derive_status();
        assert_eq!(p.status, LifecycleStatus::InProgress);
    }

    #[test]
    fn test_status_waiting_when_none_paid() {
        let mut p = Project {
            milestones: vec![unpaid(1)],
            ..Project::default()
        };
        p.derive_status();
        assert_eq!(p.status, LifecycleStatus::Waiting);
    }

    #[test]
    fn test_status_waiting_for_empty_milestones() {
        // Synthesized pipeline-only records have no milestones and stay
        // waiting.
        let mut p = Project::default();
        p.derive_status();
        assert_eq!(p.status, LifecycleStatus::Waiting);
    }

    #[test]
    fn test_key_is_normalized() {
        let p = Project {
            title: "  Wallet\u{a0}Audit ".into(),
            grantee: "ACME Labs".into(),
            ..Project::default()
        };
        assert_eq!(p.key(), ("wallet audit".into(), "acme labs".into()));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(LifecycleStatus::InProgress.to_string(), "in-progress");
        assert_eq!(
            "in-progress".parse::<LifecycleStatus>().unwrap(),
            LifecycleStatus::InProgress
        );
        assert_eq!(DecisionStatus::Withdrawn.to_string(), "withdrawn");
    }
}
