//! External data feeds that enrich the workbook data.

mod issues;
mod price;

pub use issues::{extract_summary, Issue, IssueFeed, IssueRef};
pub use price::{PriceFeed, PricePoint};
