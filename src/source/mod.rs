//! Fetching and caching of the published workbook.

mod http;
mod workbook;

use crate::Result;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use tokio::sync::OnceCell;
use tracing::debug;

pub use http::HttpFetch;
pub use workbook::{Record, Workbook};

/// Sheet names as published. The funds-distribution sheet opens with a title
/// block, so its header row sits two rows down.
pub const GRANTS: &str = "ZCG Grants";
pub const ALL_GRANTS_TRACKING: &str = "ZCG All Grants Tracking";
pub const FUNDS_DISTRIBUTION: &str = "ZCG Funds Distribution";
pub const DASHBOARD: &str = "ZCG Dashboard";
pub const LIQUIDITY: &str = "Liquidity";
pub const STIPENDS: &str = "ZCG 2025 Stipend";
pub const IC_PAYOUTS: &str = "ZCG IC Payouts";

pub const FUNDS_HEADER_ROW: usize = 2;

/// The workbook or a feed could not be fetched. This is the only error that
/// is surfaced to the user, and only as a per-view message.
#[derive(Debug)]
pub struct SourceUnavailable(pub String);

impl Display for SourceUnavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "source unavailable: {}", self.0)
    }
}

impl StdError for SourceUnavailable {}

/// Downloads the raw workbook bytes. The production implementation is
/// [`HttpFetch`]; tests provide their own.
#[async_trait::async_trait]
pub trait FetchWorkbook {
    async fn fetch(&self) -> Result<Vec<u8>>;
}

/// Session-lived workbook handle: the remote resource is fetched and parsed
/// at most once per process lifetime, and every later call returns the cached
/// workbook.
pub struct WorkbookCache {
    fetcher: Box<dyn FetchWorkbook + Send + Sync>,
    workbook: OnceCell<Workbook>,
}

impl WorkbookCache {
    pub fn new(fetcher: Box<dyn FetchWorkbook + Send + Sync>) -> Self {
        Self {
            fetcher,
            workbook: OnceCell::new(),
        }
    }

    /// A cache that never touches the network. Used by tests and offline
    /// tooling.
    pub fn preloaded(workbook: Workbook) -> Self {
        Self {
            fetcher: Box::new(NoFetch),
            workbook: OnceCell::new_with(Some(workbook)),
        }
    }

    /// Returns the cached workbook, fetching and parsing it on first use.
    /// A failed fetch is not cached; the next call retries.
    pub async fn load(&self) -> Result<&Workbook> {
        self.workbook
            .get_or_try_init(|| async {
                debug!("workbook not cached yet, fetching");
                let bytes = self.fetcher.fetch().await?;
                Workbook::from_xlsx_bytes(&bytes)
            })
            .await
    }
}

struct NoFetch;

#[async_trait::async_trait]
impl FetchWorkbook for NoFetch {
    async fn fetch(&self) -> Result<Vec<u8>> {
        Err(SourceUnavailable("no fetcher configured".to_string()).into())
    }
}
