use crate::model::Money;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One payable unit of a grant: a single row of the milestone ledger.
///
/// Owned by its parent [`Project`](crate::model::Project) and immutable once
/// constructed. A milestone is "paid" exactly when its paid date parsed.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Milestone {
    pub amount: Money,
    /// ZEC disbursed for this milestone, when the ledger recorded it.
    pub zec_amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub estimate_date: Option<NaiveDate>,
}

impl Milestone {
    pub fn is_paid(&self) -> bool {
        self.paid_date.is_some()
    }
}
