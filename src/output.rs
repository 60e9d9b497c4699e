use crate::analysis::{AnalysisEntry, AnalysisMode, AnalysisResult};
use crate::error::OutputError;
use crate::types::SummaryStats;
use chrono::{Local, NaiveDate};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

/// Worksheet name used for XLSX exports.
pub const RESULT_SHEET: &str = "Analysis Results";

/// Column headers for an exported result; the last column depends on the mode.
pub fn export_headers(mode: &AnalysisMode) -> Vec<&'static str> {
    let mut headers = vec!["Product", "Quantity", "Total Sales", "Unit Price", "Profit"];
    match mode {
        AnalysisMode::Contribution => headers.push("Contribution (%)"),
        AnalysisMode::Profitability => headers.push("Profit Margin (%)"),
        _ => {}
    }
    headers
}

/// Numeric cells of one exported row, in `export_headers` order after the
/// product name.
fn entry_values(mode: &AnalysisMode, e: &AnalysisEntry) -> Vec<f64> {
    let p = &e.product;
    let mut values = vec![p.quantity, p.sales, p.unit_price, p.profit.unwrap_or(0.0)];
    match mode {
        AnalysisMode::Contribution => values.push(e.contribution.unwrap_or(0.0)),
        AnalysisMode::Profitability => values.push(e.profit_margin.unwrap_or(0.0)),
        _ => {}
    }
    values
}

/// Write the result as CSV with raw (unformatted) numbers.
pub fn write_result_csv<W: Write>(writer: W, result: &AnalysisResult) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(export_headers(&result.mode))?;
    for e in &result.entries {
        let mut record = vec![e.product.description.clone()];
        record.extend(entry_values(&result.mode, e).iter().map(f64::to_string));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the result to a single "Analysis Results" worksheet. Numbers stay
/// numeric cells.
pub fn write_result_xlsx(path: &Path, result: &AnalysisResult) -> Result<(), OutputError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet().set_name(RESULT_SHEET)?;

    for (col, header) in export_headers(&result.mode).into_iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &bold)?;
    }
    for (i, e) in result.entries.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet.write_string(row, 0, &e.product.description)?;
        for (col, value) in entry_values(&result.mode, e).into_iter().enumerate() {
            worksheet.write_number(row, col as u16 + 1, value)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn summarize(
    result: &AnalysisResult,
    cost_mapped: bool,
    generated_on: NaiveDate,
) -> SummaryStats {
    let products = result.entries.iter().map(|e| &e.product);
    let total_cost: f64 = products.clone().filter_map(|p| p.cost).sum();
    let total_profit: f64 = products.clone().filter_map(|p| p.profit).sum();
    SummaryStats {
        analysis: result.mode.name().to_string(),
        label: result.mode.label().to_string(),
        generated_on: generated_on.format("%Y-%m-%d").to_string(),
        total_products: result.entries.len(),
        total_quantity: products.clone().map(|p| p.quantity).sum(),
        total_sales: products.map(|p| p.sales).sum(),
        total_cost: cost_mapped.then_some(total_cost),
        total_profit: cost_mapped.then_some(total_profit),
    }
}

/// `Product_Analysis_<date>` with the given extension, inside `dir`.
pub fn export_path(dir: &Path, date: NaiveDate, ext: &str) -> PathBuf {
    dir.join(format!("Product_Analysis_{}.{}", date.format("%Y-%m-%d"), ext))
}

/// Paths written by [`export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
    pub json: PathBuf,
}

/// Write the result as CSV and XLSX tables plus a JSON summary.
pub fn export(
    dir: &Path,
    result: Option<&AnalysisResult>,
    cost_mapped: bool,
) -> Result<ExportedFiles, OutputError> {
    let result = match result {
        Some(r) if !r.entries.is_empty() => r,
        _ => return Err(OutputError::NothingToExport),
    };
    let today = Local::now().date_naive();
    std::fs::create_dir_all(dir)?;

    let files = ExportedFiles {
        csv: export_path(dir, today, "csv"),
        xlsx: export_path(dir, today, "xlsx"),
        json: export_path(dir, today, "json"),
    };
    write_result_csv(std::fs::File::create(&files.csv)?, result)?;
    write_result_xlsx(&files.xlsx, result)?;
    write_json(&files.json, &summarize(result, cost_mapped, today))?;

    info!(
        csv = %files.csv.display(),
        xlsx = %files.xlsx.display(),
        json = %files.json.display(),
        "exported analysis"
    );
    Ok(files)
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Print the result the way the report view shows it.
pub fn preview_result(result: &AnalysisResult, max_rows: usize) {
    let title = format!("Product Analysis Report - {}", result.mode.label());
    let note = format!(
        "Generated on: {}; last column: {}",
        Local::now().format("%Y-%m-%d %H:%M"),
        result.value_header()
    );
    preview_table(&title, Some(&note), &result.table_rows(), max_rows);
    if result.entries.len() > max_rows {
        println!("({} more rows not shown)\n", result.entries.len() - max_rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::types::{Aggregate, Cell, ProductRecord};
    use calamine::Reader;

    fn sample() -> Aggregate {
        let p = |d: &str, q: f64, s: f64, c: f64| ProductRecord {
            description: d.to_string(),
            quantity: q,
            sales: s,
            cost: Some(c),
            profit: Some(s - c),
            unit_price: s / q,
        };
        Aggregate {
            products: vec![p("Bolt", 4.0, 100.0, 60.0), p("Nut", 2.0, 300.0, 100.0)],
            cost_mapped: true,
        }
    }

    #[test]
    fn headers_depend_on_mode() {
        assert_eq!(export_headers(&AnalysisMode::fast_moving(3)).len(), 5);
        assert_eq!(
            export_headers(&AnalysisMode::Contribution).last(),
            Some(&"Contribution (%)")
        );
        assert_eq!(
            export_headers(&AnalysisMode::Profitability).last(),
            Some(&"Profit Margin (%)")
        );
    }

    #[test]
    fn csv_export_writes_mode_column() {
        let result = analyze(&sample(), AnalysisMode::Contribution).unwrap();
        let mut buf = Vec::new();
        write_result_csv(&mut buf, &result).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Product,Quantity,Total Sales,Unit Price,Profit,Contribution (%)"
        );
        assert_eq!(lines[1], "Nut,2,300,150,200,75");
        assert_eq!(lines[2], "Bolt,4,100,25,40,25");
    }

    #[test]
    fn summary_totals() {
        let result = analyze(&sample(), AnalysisMode::Profitability).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let stats = summarize(&result, true, date);
        assert_eq!(stats.analysis, "profitability");
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.total_sales, 400.0);
        assert_eq!(stats.total_cost, Some(160.0));
        assert_eq!(stats.total_profit, Some(240.0));
        assert_eq!(stats.generated_on, "2024-03-01");

        let json = serde_json::to_value(summarize(&result, false, date)).unwrap();
        assert!(json.get("total_cost").is_none());
    }

    #[test]
    fn export_names_files_by_date() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(
            export_path(Path::new("out"), date, "csv"),
            Path::new("out").join("Product_Analysis_2024-12-31.csv")
        );
    }

    #[test]
    fn xlsx_export_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.xlsx");
        let result = analyze(&sample(), AnalysisMode::Profitability).unwrap();
        write_result_xlsx(&path, &result).unwrap();

        let workbook = calamine::open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![RESULT_SHEET.to_string()]);

        let sheet = crate::loader::read_workbook(&path).unwrap();
        let header: Vec<String> = sheet.header.iter().filter_map(Cell::as_text).collect();
        assert_eq!(header, export_headers(&AnalysisMode::Profitability));
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][0], Cell::Text("Nut".to_string()));
        assert_eq!(sheet.rows[0][4], Cell::Number(200.0));
        assert_eq!(sheet.rows[1][5], Cell::Number(40.0));
    }

    #[test]
    fn export_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let result = analyze(&sample(), AnalysisMode::fast_moving(1)).unwrap();
        let files = export(dir.path(), Some(&result), true).unwrap();
        assert!(files.xlsx.ends_with(
            format!("Product_Analysis_{}.xlsx", Local::now().format("%Y-%m-%d"))
        ));
        assert!(files.xlsx.exists());
        let (csv_path, json_path) = (files.csv, files.json);
        let csv_text = std::fs::read_to_string(csv_path).unwrap();
        assert!(csv_text.starts_with("Product,Quantity,Total Sales,Unit Price,Profit\n"));
        assert!(csv_text.contains("Bolt,4,100,25,40"));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(json["analysis"], "fastMoving");
    }

    #[test]
    fn export_without_result_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            export(dir.path(), None, false),
            Err(OutputError::NothingToExport)
        ));
    }
}
