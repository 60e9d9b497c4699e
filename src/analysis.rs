//! Ranked views over the aggregated products.
//!
//! Every mode clones the records it works on; the session's aggregate is
//! never modified here.

use crate::error::AnalysisError;
use crate::types::{Aggregate, ProductRecord, ReportRow};
use crate::util::format_number;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Items returned by the moving modes when no count is given.
pub const DEFAULT_ITEM_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnalysisMode {
    FastMoving { count: usize },
    SlowMoving { count: usize },
    Contribution,
    Profitability,
}

impl AnalysisMode {
    pub fn fast_moving(count: usize) -> Self {
        AnalysisMode::FastMoving {
            count: count.max(1),
        }
    }

    pub fn slow_moving(count: usize) -> Self {
        AnalysisMode::SlowMoving {
            count: count.max(1),
        }
    }

    /// Parse a mode name, using `count` for the moving modes.
    pub fn parse_with_count(name: &str, count: usize) -> Result<Self, AnalysisError> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "fastmoving" | "fast" => Ok(Self::fast_moving(count)),
            "slowmoving" | "slow" => Ok(Self::slow_moving(count)),
            "contribution" => Ok(Self::Contribution),
            "profitability" | "profit" => Ok(Self::Profitability),
            _ => Err(AnalysisError::UnsupportedAnalysisMode(name.to_string())),
        }
    }

    /// Stable identifier, used to pick export headers.
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisMode::FastMoving { .. } => "fastMoving",
            AnalysisMode::SlowMoving { .. } => "slowMoving",
            AnalysisMode::Contribution => "contribution",
            AnalysisMode::Profitability => "profitability",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AnalysisMode::FastMoving { .. } => "Fast Moving Products",
            AnalysisMode::SlowMoving { .. } => "Slow Moving Products",
            AnalysisMode::Contribution => "Sales Contribution",
            AnalysisMode::Profitability => "Profitability Analysis",
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_count(s, DEFAULT_ITEM_COUNT)
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A copied product plus the fields the producing mode computed.
///
/// `contribution` is set only by [`AnalysisMode::Contribution`];
/// `profit_margin` only by [`AnalysisMode::Profitability`], which also
/// overwrites `product.profit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisEntry {
    #[serde(flatten)]
    pub product: ProductRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contribution: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_margin: Option<f64>,
}

impl From<&ProductRecord> for AnalysisEntry {
    fn from(product: &ProductRecord) -> Self {
        Self {
            product: product.clone(),
            contribution: None,
            profit_margin: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub mode: AnalysisMode,
    pub entries: Vec<AnalysisEntry>,
}

impl AnalysisResult {
    /// Pre-formatted rows for the console table.
    pub fn table_rows(&self) -> Vec<ReportRow> {
        self.entries
            .iter()
            .map(|e| {
                let p = &e.product;
                let value = match self.mode {
                    AnalysisMode::Contribution => {
                        format!("{:.2}%", e.contribution.unwrap_or(0.0))
                    }
                    _ => format_number(p.profit.unwrap_or(0.0), 2),
                };
                ReportRow {
                    product: p.description.clone(),
                    quantity: format_number(p.quantity, 2),
                    sales: format_number(p.sales, 2),
                    unit_price: if p.quantity > 0.0 {
                        format_number(p.sales / p.quantity, 2)
                    } else {
                        "N/A".to_string()
                    },
                    value,
                }
            })
            .collect()
    }

    /// Header for the last table column.
    pub fn value_header(&self) -> &'static str {
        match self.mode {
            AnalysisMode::Contribution => "Contribution (%)",
            _ => "Profit",
        }
    }

    /// (label, value) pairs for charting: contribution share, profit, or
    /// quantity depending on the mode.
    pub fn chart_series(&self) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .map(|e| {
                let value = match self.mode {
                    AnalysisMode::Contribution => e.contribution.unwrap_or(0.0),
                    AnalysisMode::Profitability => e.product.profit.unwrap_or(0.0),
                    AnalysisMode::FastMoving { .. } | AnalysisMode::SlowMoving { .. } => {
                        e.product.quantity
                    }
                };
                (e.product.description.clone(), value)
            })
            .collect()
    }
}

fn by_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Build the view for `mode`. Sorting is stable, so equal keys keep their
/// first-seen order.
pub fn analyze(
    aggregate: &Aggregate,
    mode: AnalysisMode,
) -> Result<AnalysisResult, AnalysisError> {
    let mut entries: Vec<AnalysisEntry> =
        aggregate.products.iter().map(AnalysisEntry::from).collect();

    match mode {
        AnalysisMode::FastMoving { count } => {
            entries.sort_by(|a, b| by_desc(a.product.quantity, b.product.quantity));
            entries.truncate(count.max(1));
        }
        AnalysisMode::SlowMoving { count } => {
            entries.sort_by(|a, b| by_desc(b.product.quantity, a.product.quantity));
            entries.truncate(count.max(1));
        }
        AnalysisMode::Contribution => {
            let total: f64 = entries.iter().map(|e| e.product.sales).sum();
            for e in &mut entries {
                e.contribution = Some(if total > 0.0 {
                    100.0 * e.product.sales / total
                } else {
                    0.0
                });
            }
            entries.sort_by(|a, b| {
                by_desc(a.contribution.unwrap_or(0.0), b.contribution.unwrap_or(0.0))
            });
        }
        AnalysisMode::Profitability => {
            if !aggregate.cost_mapped {
                return Err(AnalysisError::MissingCostData);
            }
            for e in &mut entries {
                let p = &mut e.product;
                let profit = p.sales - p.cost.unwrap_or(0.0);
                p.profit = Some(profit);
                e.profit_margin = Some(if p.sales > 0.0 {
                    100.0 * profit / p.sales
                } else {
                    0.0
                });
            }
            entries.sort_by(|a, b| {
                by_desc(a.product.profit.unwrap_or(0.0), b.product.profit.unwrap_or(0.0))
            });
        }
    }

    info!(mode = %mode, entries = entries.len(), "analysis completed");
    Ok(AnalysisResult { mode, entries })
}
