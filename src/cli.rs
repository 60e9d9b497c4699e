//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::analysis::DEFAULT_ITEM_COUNT;
use crate::logging::LogFormat;
use crate::roles::ManualMapping;

#[derive(Parser, Debug)]
#[command(
    name = "sales_report",
    version,
    about = "Product sales analysis from spreadsheet exports",
    long_about = "Load one or more sales sheets (CSV, TSV, XLSX, XLS, ODS), detect the \
                  description/quantity/sales/cost columns, merge near-duplicate product \
                  names and report fast movers, slow movers, sales contribution or \
                  profitability."
)]
pub struct Cli {
    /// Input files, read in the given order. The first row of each is its header.
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,

    /// Analysis to run: fastMoving, slowMoving, contribution or profitability.
    /// Without it an interactive menu is shown.
    #[arg(short, long, value_name = "MODE")]
    pub analysis: Option<String>,

    /// Number of items for fast/slow moving analyses.
    #[arg(short = 'n', long, default_value_t = DEFAULT_ITEM_COUNT)]
    pub count: usize,

    /// Column index of the product description (skips header detection).
    #[arg(long, value_name = "INDEX")]
    pub description_col: Option<String>,

    /// Column index of the quantity sold.
    #[arg(long, value_name = "INDEX")]
    pub quantity_col: Option<String>,

    /// Column index of the total sales.
    #[arg(long, value_name = "INDEX")]
    pub sales_col: Option<String>,

    /// Column index of the cost; leave empty when there is no cost data.
    #[arg(long, value_name = "INDEX")]
    pub cost_col: Option<String>,

    /// Write the CSV table and JSON summary after a one-shot analysis.
    #[arg(long)]
    pub export: bool,

    /// Directory for exported files.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Rows shown in the console preview.
    #[arg(long, default_value_t = 10)]
    pub preview_rows: usize,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less log output.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,
}

impl Cli {
    /// Manual mapping from the `--*-col` flags, if any was given.
    pub fn manual_mapping(&self) -> Option<ManualMapping> {
        let given = [
            &self.description_col,
            &self.quantity_col,
            &self.sales_col,
            &self.cost_col,
        ];
        if given.iter().all(|v| v.is_none()) {
            return None;
        }
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Some(ManualMapping::from_inputs(
            &text(&self.description_col),
            &text(&self.quantity_col),
            &text(&self.sales_col),
            &text(&self.cost_col),
        ))
    }
}

/// CLI log format choices.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
