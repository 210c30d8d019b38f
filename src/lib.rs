mod aggregate;
mod app;
pub mod bucket;
pub mod coerce;
mod error;
pub mod feeds;
pub mod filter;
pub mod ic_payouts;
pub mod liquidity;
pub mod model;
mod overview;
pub mod payouts;
mod reconcile;
pub mod source;
pub mod stipends;

pub use aggregate::aggregate;
pub use app::Dashboard;
pub use app::Theme;
pub use error::Error;
pub use error::Result;
pub use overview::{metric_value, ActivityStats, Overview};
pub use reconcile::{classify_decision, reconcile, TrackingEntry, TrackingIndex};
