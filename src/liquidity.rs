//! Liquidity-position summary from the liquidity sheet.
//!
//! The sheet is two side-by-side tables: a transaction list in columns A:B
//! and a labeled KPI block in columns H:I.

use crate::coerce::{self, normalize_key, Cell};
use crate::model::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const COL_PROJECT: usize = 0;
const COL_AMOUNT_USD: usize = 1;
const COL_KPI_LABEL: usize = 7;
const COL_KPI_VALUE: usize = 8;

/// Wallet balances and liquidity-pool performance.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LiquiditySummary {
    pub zec_balance: Decimal,
    pub cacao_balance: Decimal,
    pub wallet_usd: Money,
    /// Gain/loss as the sheet reports it, kept alongside the derived figure.
    pub reported_gain_loss: Money,
    pub total_added: Money,
    /// Wallet value minus liquidity added.
    pub profit_loss: Money,
}

impl LiquiditySummary {
    /// Scans the sheet in one pass: KPI labels resolve by normalized text,
    /// and every transaction row with a positive amount adds to the total.
    pub fn from_rows(rows: &[Vec<Cell>]) -> Self {
        let mut summary = LiquiditySummary::default();

        for row in rows {
            let label = row
                .get(COL_KPI_LABEL)
                .map(|c| normalize_key(&c.text()))
                .unwrap_or_default();
            if !label.is_empty() {
                let value = row
                    .get(COL_KPI_VALUE)
                    .and_then(coerce::coerce_number)
                    .unwrap_or_default();
                match label.as_str() {
                    "zec" => summary.zec_balance = value,
                    "cacao" => summary.cacao_balance = value,
                    "usd value in wallet" => summary.wallet_usd = Money::new(value),
                    _ if label.contains("gain/loss") => {
                        summary.reported_gain_loss = Money::new(value)
                    }
                    _ => {}
                }
            }

            let has_project = row
                .get(COL_PROJECT)
                .map(|c| !c.is_blank())
                .unwrap_or(false);
            if has_project {
                let amount = row
                    .get(COL_AMOUNT_USD)
                    .and_then(coerce::coerce_number)
                    .unwrap_or_default();
                if amount > Decimal::ZERO {
                    summary.total_added += Money::new(amount);
                }
            }
        }

        summary.profit_loss = summary.wallet_usd - summary.total_added;
        summary
    }
}
