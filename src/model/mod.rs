//! Types that represent the core data model, such as `Project` and
//! `Milestone`.

mod grant_row;
mod milestone;
mod money;
mod project;

pub use grant_row::GrantRow;
pub use milestone::Milestone;
pub use money::Money;
pub use project::{DecisionStatus, LifecycleStatus, Project};
