//! Per-upload session state.
//!
//! A `Session` owns everything derived from one set of uploaded files: the
//! reference header, the raw rows, the column mapping, the product aggregate
//! and the latest analysis. Starting over means replacing the session.

use crate::aggregate::{aggregate_with_report, AggregateReport};
use crate::analysis::{analyze, AnalysisMode, AnalysisResult};
use crate::error::AnalysisError;
use crate::roles::{resolve_roles, ManualMapping, RoleResolution};
use crate::types::{Aggregate, Cell, ColumnMapping, ProductRecord, RawRow, Sheet};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct Session {
    header: Vec<Cell>,
    rows: Vec<RawRow>,
    resolution: Option<RoleResolution>,
    mapping: Option<ColumnMapping>,
    aggregate: Option<Aggregate>,
    aggregate_report: Option<AggregateReport>,
    last_result: Option<AnalysisResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session's data with `sheets` and try automatic mapping.
    ///
    /// On `UnresolvedMapping` the rows stay pending so the caller can follow
    /// up with [`Session::apply_manual_mapping`].
    pub fn ingest(&mut self, sheets: Vec<Sheet>) -> Result<&Aggregate, AnalysisError> {
        self.replace_rows(sheets);
        let resolution = resolve_roles(&self.header);
        self.resolution = Some(resolution.clone());
        if resolution.mapping_required() {
            warn!(
                unresolved = ?resolution.unresolved,
                "column mapping required"
            );
        }
        let mapping = resolution.into_mapping()?;
        Ok(self.fold(mapping))
    }

    /// Replace the session's data with `sheets` using an explicit mapping,
    /// skipping header detection.
    pub fn ingest_with_mapping(
        &mut self,
        sheets: Vec<Sheet>,
        manual: ManualMapping,
    ) -> Result<&Aggregate, AnalysisError> {
        self.replace_rows(sheets);
        self.apply_manual_mapping(manual)
    }

    /// Map the pending rows with user-chosen columns.
    pub fn apply_manual_mapping(
        &mut self,
        manual: ManualMapping,
    ) -> Result<&Aggregate, AnalysisError> {
        let mapping = manual.into_mapping(self.header.len())?;
        Ok(self.fold(mapping))
    }

    /// Run an analysis over the current aggregate. The stored result is only
    /// replaced when the analysis succeeds.
    pub fn analyze(&mut self, mode: AnalysisMode) -> Result<&AnalysisResult, AnalysisError> {
        let aggregate = match &self.aggregate {
            Some(agg) if !agg.products.is_empty() => agg,
            _ => return Err(AnalysisError::NoData),
        };
        let result = analyze(aggregate, mode)?;
        Ok(self.last_result.insert(result))
    }

    /// Drop all data, returning to a fresh session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn header(&self) -> &[Cell] {
        &self.header
    }

    /// Header text per column, for prompting a manual mapping.
    pub fn header_labels(&self) -> Vec<String> {
        self.header
            .iter()
            .map(|c| c.as_text().unwrap_or_default())
            .collect()
    }

    pub fn pending_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn resolution(&self) -> Option<&RoleResolution> {
        self.resolution.as_ref()
    }

    pub fn mapping(&self) -> Option<&ColumnMapping> {
        self.mapping.as_ref()
    }

    pub fn aggregate(&self) -> Option<&Aggregate> {
        self.aggregate.as_ref()
    }

    /// Row counts (total, skipped, merged) from the last aggregation.
    pub fn aggregate_report(&self) -> Option<AggregateReport> {
        self.aggregate_report
    }

    pub fn products(&self) -> &[ProductRecord] {
        self.aggregate
            .as_ref()
            .map(|a| a.products.as_slice())
            .unwrap_or_default()
    }

    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    fn replace_rows(&mut self, sheets: Vec<Sheet>) {
        self.reset();
        let mut sheets = sheets.into_iter();
        if let Some(first) = sheets.next() {
            self.header = first.header;
            self.rows = first.rows;
        }
        for sheet in sheets {
            self.rows.extend(sheet.rows);
        }
        info!(
            columns = self.header.len(),
            rows = self.rows.len(),
            "session data replaced"
        );
    }

    fn fold(&mut self, mapping: ColumnMapping) -> &Aggregate {
        let (aggregate, report) = aggregate_with_report(&self.rows, &mapping);
        self.mapping = Some(mapping);
        self.aggregate_report = Some(report);
        self.last_result = None;
        self.aggregate.insert(aggregate)
    }
}
