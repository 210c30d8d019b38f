//! Typed rows read from the milestone ledger.
//!
//! The ledger is header-keyed but the column names are not stable: the
//! grantee column alone has appeared under four different names. Each logical
//! field resolves against a fixed, ordered alias list here, so that nothing
//! downstream ever touches a raw untyped record.

use crate::coerce::{self, clean_text};
use crate::model::Money;
use crate::source::Record;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub(crate) const PROJECT_ALIASES: &[&str] = &["Project"];
pub(crate) const GRANTEE_ALIASES: &[&str] =
    &["Grantee", "Applicant(s)", "Applicant", "Recipient"];
pub(crate) const CATEGORY_ALIASES: &[&str] =
    &["Category (as determined by ZCG)", "Category"];
pub(crate) const AMOUNT_USD_ALIASES: &[&str] = &["Amount (USD)"];
// Precedence preserved from the source sheets even though they disagree on
// which spelling is current. See DESIGN.md.
pub(crate) const ZEC_ALIASES: &[&str] = &["ZEC Disbursed", "ZEC"];
pub(crate) const PAID_OUT_ALIASES: &[&str] = &["Paid Out"];
pub(crate) const DUE_DATE_ALIASES: &[&str] = &["Milestone Due Date"];
pub(crate) const ESTIMATE_ALIASES: &[&str] = &["Estimate"];
pub(crate) const DECISION_DATE_ALIASES: &[&str] = &[
    "Date Committee Approved/ Rejected",
    "Date Committee Approved/Rejected",
    "Approved Date",
    "Date",
];

/// One milestone-ledger row with every field already coerced. Rows that lack
/// either half of the (project, grantee) identity key are skipped upstream.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GrantRow {
    pub project: String,
    pub grantee: String,
    pub category: Option<String>,
    pub amount_usd: Option<Money>,
    pub zec_disbursed: Option<Decimal>,
    pub paid_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub estimate_date: Option<NaiveDate>,
    pub decision_date: Option<NaiveDate>,
}

impl GrantRow {
    /// Builds a typed row from a header-keyed record. `None` when the row has
    /// no usable (project, grantee) key; such rows are skipped, not erred.
    pub fn from_record(record: &Record) -> Option<Self> {
        let project = record
            .first_of(PROJECT_ALIASES)
            .map(|c| clean_text(&c.text()))
            .unwrap_or_default();
        let grantee = record
            .first_of(GRANTEE_ALIASES)
            .map(|c| clean_text(&c.text()))
            .unwrap_or_default();
        if project.is_empty() || grantee.is_empty() {
            return None;
        }

        let category = record
            .first_of(CATEGORY_ALIASES)
            .map(|c| clean_text(&c.text()))
            .filter(|c| !c.is_empty());

        Some(Self {
            project,
            grantee,
            category,
            amount_usd: record
                .first_of(AMOUNT_USD_ALIASES)
                .and_then(coerce::coerce_number)
                .map(Money::new),
            zec_disbursed: record.first_of(ZEC_ALIASES).and_then(coerce::coerce_number),
            paid_date: record
                .first_of(PAID_OUT_ALIASES)
                .and_then(coerce::coerce_date),
            due_date: record
                .first_of(DUE_DATE_ALIASES)
                .and_then(coerce::coerce_date),
            estimate_date: record
                .first_of(ESTIMATE_ALIASES)
                .and_then(coerce::coerce_date),
            decision_date: record
                .first_of(DECISION_DATE_ALIASES)
                .and_then(coerce::coerce_date),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::Cell;

    fn record(fields: &[(&str, &str)]) -> Record {
        Record::new(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), Cell::from(*v))),
        )
    }

    #[test]
    fn test_row_from_record() {
        let row = GrantRow::from_record(&record(&[
            ("Project", "Wallet Audit"),
            ("Grantee", "ACME"),
            ("Amount (USD)", "$10,000"),
            ("Paid Out", "1/5/2024"),
            ("Category (as determined by ZCG)", "Security"),
        ]))
        .unwrap();
        assert_eq!(row.project, "Wallet Audit");
        assert_eq!(row.grantee, "ACME");
        assert_eq!(row.amount_usd, Some(Money::from(10_000)));
        assert_eq!(row.paid_date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(row.category.as_deref(), Some("Security"));
    }

    #[test]
    fn test_grantee_alias_resolution() {
        let row = GrantRow::from_record(&record(&[
            ("Project", "Node Work"),
            ("Applicant(s)", "Beta Collective"),
        ]))
        .unwrap();
        assert_eq!(row.grantee, "Beta Collective");
    }

    #[test]
    fn test_missing_key_half_skips_row() {
        assert!(GrantRow::from_record(&record(&[("Project", "Orphan")])).is_none());
        assert!(GrantRow::from_record(&record(&[("Grantee", "ACME")])).is_none());
    }

    #[test]
    fn test_unparseable_cells_degrade_to_none() {
        let row = GrantRow::from_record(&record(&[
            ("Project", "Wallet Audit"),
            ("Grantee", "ACME"),
            ("Amount (USD)", "tbd"),
            ("Paid Out", "pending"),
        ]))
        .unwrap();
        assert_eq!(row.amount_usd, None);
        assert_eq!(row.paid_date, None);
    }

    #[test]
    fn test_zec_alias_precedence() {
        let row = GrantRow::from_record(&record(&[
            ("Project", "P"),
            ("Grantee", "G"),
            ("ZEC Disbursed", "12.5"),
            ("ZEC", "99"),
        ]))
        .unwrap();
        assert_eq!(row.zec_disbursed, Some(Decimal::new(125, 1)));
    }
}
