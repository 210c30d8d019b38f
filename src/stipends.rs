//! Committee stipend aggregation over the stipend sheet.
//!
//! Each member receives a fixed USD amount plus 10 ZEC per month; the sheet
//! records the combined USD value per payment. The USD portion is fixed, so
//! whatever a month's total exceeds it by is the USD value of the ZEC
//! portion.

use crate::bucket::{bucket_by_month, MonthBucket};
use crate::coerce;
use crate::model::Money;
use crate::source::Record;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const COMMITTEE_MEMBERS: u32 = 5;
pub const USD_PER_MEMBER: u32 = 1_725;

/// One stipend payment row. Undated rows never contribute to totals.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StipendRow {
    pub date: Option<NaiveDate>,
    pub usd: Money,
}

impl StipendRow {
    pub fn from_record(record: &Record) -> Self {
        Self {
            date: record.get("Date").and_then(coerce::coerce_date),
            usd: record
                .get("USD Amount")
                .and_then(coerce::coerce_number)
                .map(Money::new)
                .unwrap_or_default(),
        }
    }
}

/// Totals and monthly breakdown of committee stipends.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StipendReport {
    pub total_paid: Money,
    pub per_member: Money,
    pub avg_monthly_per_member: Money,
    pub monthly: Vec<MonthBucket>,
}

impl StipendReport {
    pub fn compute(rows: &[StipendRow]) -> Self {
        let dated: Vec<&StipendRow> = rows.iter().filter(|r| r.date.is_some()).collect();
        let monthly = bucket_by_month(&dated, |r| r.date, |r| r.usd);
        let total_paid: Money = dated.iter().map(|r| r.usd).sum();

        let members = Decimal::from(COMMITTEE_MEMBERS);
        let per_member = Money::new(total_paid.value() / members);
        let month_count = Decimal::from(monthly.len().max(1) as u32);
        let avg_monthly_per_member = Money::new(per_member.value() / month_count);

        Self {
            total_paid,
            per_member,
            avg_monthly_per_member,
            monthly,
        }
    }
}

/// The USD value of one member's ZEC portion for a month: the month's total
/// minus the fixed USD portion across all members, split per member.
pub fn zec_portion_per_member(month_total: Money) -> Money {
    let fixed = Money::from((USD_PER_MEMBER * COMMITTEE_MEMBERS) as i64);
    Money::new((month_total - fixed).value() / Decimal::from(COMMITTEE_MEMBERS))
}
