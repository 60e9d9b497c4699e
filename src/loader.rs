use crate::error::LoadError;
use crate::roles::normalize_headers;
use crate::types::{Cell, RawRow, Sheet};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub files: usize,
    pub total_rows: usize,
    pub mismatched_headers: usize,
}

/// Decode a delimited text sheet. The first record is the header row; no
/// record is skipped, ragged rows are kept as-is.
pub fn read_delimited<R: Read>(
    reader: R,
    delimiter: u8,
    source: &str,
) -> Result<Sheet, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut records = rdr.records();
    let header: Vec<Cell> = match records.next() {
        Some(first) => first?.iter().map(Cell::from).collect(),
        None => Vec::new(),
    };
    let mut rows: Vec<RawRow> = Vec::new();
    for result in records {
        let record = result?;
        rows.push(record.iter().map(Cell::from).collect());
    }
    Ok(Sheet {
        source: source.to_string(),
        header,
        rows,
    })
}

fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        // Dates only matter as descriptions; keep the serial like a spreadsheet would.
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Decode the first worksheet of an xlsx/xls/xlsb/ods workbook.
pub fn read_workbook(path: &Path) -> Result<Sheet, LoadError> {
    let workbook_err = |source| LoadError::Workbook {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;
    let Some(first) = workbook.sheet_names().first().cloned() else {
        return Err(LoadError::EmptyFile {
            path: path.to_path_buf(),
        });
    };
    let range = workbook.worksheet_range(&first).map_err(workbook_err)?;
    debug!(path = %path.display(), sheet = %first, "reading worksheet");

    let mut iter = range.rows();
    let header: Vec<Cell> = iter
        .next()
        .map(|r| r.iter().map(workbook_cell).collect())
        .unwrap_or_default();
    let rows: Vec<RawRow> = iter.map(|r| r.iter().map(workbook_cell).collect()).collect();
    Ok(Sheet {
        source: path.display().to_string(),
        header,
        rows,
    })
}

fn read_text_file(path: &Path, delimiter: u8) -> Result<Sheet, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    read_delimited(file, delimiter, &path.display().to_string()).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode one file, choosing the decoder from its extension.
pub fn load_file(path: &Path) -> Result<Sheet, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let sheet = match ext.as_str() {
        "csv" => read_text_file(path, b',')?,
        "tsv" | "tab" => read_text_file(path, b'\t')?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path)?,
        _ => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };
    if sheet.header.iter().all(|c| *c == Cell::Empty) {
        return Err(LoadError::EmptyFile {
            path: path.to_path_buf(),
        });
    }
    Ok(sheet)
}

/// Decode every file in order. Files are independent; rows are later
/// concatenated in file order then row order.
pub fn load_files(paths: &[PathBuf]) -> Result<(Vec<Sheet>, LoadReport), LoadError> {
    if paths.is_empty() {
        return Err(LoadError::NoFiles);
    }
    let mut sheets = Vec::with_capacity(paths.len());
    let mut report = LoadReport::default();
    for path in paths {
        let sheet = load_file(path)?;
        info!(path = %path.display(), rows = sheet.rows.len(), "loaded file");
        report.files += 1;
        report.total_rows += sheet.rows.len();
        sheets.push(sheet);
    }
    report.mismatched_headers = check_headers(&sheets);
    Ok((sheets, report))
}

/// Warn about sheets whose header differs from the first one; column roles
/// are resolved from the first header only. Returns the mismatch count.
pub fn check_headers(sheets: &[Sheet]) -> usize {
    let Some(first) = sheets.first() else {
        return 0;
    };
    let reference = normalize_headers(&first.header);
    let mut mismatched = 0;
    for sheet in &sheets[1..] {
        if normalize_headers(&sheet.header) != reference {
            warn!(
                source = %sheet.source,
                reference = %first.source,
                "header differs from first file; using first file's column layout"
            );
            mismatched += 1;
        }
    }
    mismatched
}
