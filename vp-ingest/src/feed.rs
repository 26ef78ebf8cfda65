//! Vendor feed files: detection and row extraction.
//!
//! Files arrive as CSV or Excel workbooks. Both are reduced to plain
//! string grids first, so identification and extraction share one code
//! path and stay unit-testable without fixture files.

use calamine::{Data, Range, Reader as _, Sheets, open_workbook_auto};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use vp_core::models::{
    Detection, StagedCost, StagedMovement, Vendor, detect_rainforest, detect_vendor, match_key,
};

/// Rows scanned when hunting for a buried header row.
const PREVIEW_ROWS: usize = 10;

/// Worksheets polled for a signature before giving up on a workbook.
const SHEETS_TO_POLL: usize = 3;

/// Errors reading or parsing a feed file.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Filesystem failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CSV open/parse failure
    #[error("csv error in {}: {source}", path.display())]
    Csv {
        /// The offending file
        path: PathBuf,
        /// The parser's failure
        #[source]
        source: csv::Error,
    },

    /// Workbook open/parse failure
    #[error("spreadsheet error in {}: {source}", path.display())]
    Spreadsheet {
        /// The offending file
        path: PathBuf,
        /// The reader's failure
        #[source]
        source: calamine::Error,
    },

    /// The workbook has no sheets at all
    #[error("{} has no usable worksheet", path.display())]
    MissingSheet {
        /// The offending file
        path: PathBuf,
    },
}

/// Rows extracted from one identified feed file.
#[derive(Debug)]
pub enum Extraction {
    /// The ECRS movement baseline
    Movement(Vec<StagedMovement>),
    /// A vendor cost list
    Costs(Vec<StagedCost>),
}

enum FileKind {
    Csv,
    Workbook,
}

fn file_kind(path: &Path) -> FileKind {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv { FileKind::Csv } else { FileKind::Workbook }
}

/// Identify which vendor a file came from.
///
/// CSVs are matched row-by-row against the header signatures. Workbooks
/// are checked for a Rainforest `Full Price List` sheet first, then the
/// first few sheets are polled the same way as CSV rows.
pub fn detect_file(path: &Path) -> Result<Option<Detection>, FeedError> {
    match file_kind(path) {
        FileKind::Csv => {
            let rows = csv_rows(path, Some(PREVIEW_ROWS))?;
            Ok(detect_vendor(&rows))
        }
        FileKind::Workbook => detect_workbook(path),
    }
}

fn detect_workbook(path: &Path) -> Result<Option<Detection>, FeedError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| FeedError::Spreadsheet {
        path: path.to_owned(),
        source,
    })?;
    let names = workbook.sheet_names().to_vec();

    if names.iter().any(|n| n == "Full Price List") {
        let rows = sheet_rows(&mut workbook, path, "Full Price List", Some(PREVIEW_ROWS))?;
        if let Some(detection) = detect_rainforest(&rows) {
            return Ok(Some(detection));
        }
    }

    for name in names.iter().take(SHEETS_TO_POLL) {
        let rows = sheet_rows(&mut workbook, path, name, Some(PREVIEW_ROWS))?;
        if let Some(detection) = detect_vendor(&rows) {
            return Ok(Some(detection));
        }
    }

    Ok(None)
}

/// Read and extract an identified file.
pub fn extract_file(path: &Path, detection: Detection) -> Result<Extraction, FeedError> {
    let columns = detection.vendor.columns();

    let rows = match file_kind(path) {
        FileKind::Csv => csv_rows(path, None)?,
        FileKind::Workbook => {
            let mut workbook =
                open_workbook_auto(path).map_err(|source| FeedError::Spreadsheet {
                    path: path.to_owned(),
                    source,
                })?;
            let sheet = match columns.sheet {
                Some(sheet) => sheet.to_owned(),
                None => workbook
                    .sheet_names()
                    .to_vec()
                    .into_iter()
                    .next()
                    .ok_or_else(|| FeedError::MissingSheet {
                        path: path.to_owned(),
                    })?,
            };
            sheet_rows(&mut workbook, path, &sheet, None)?
        }
    };

    Ok(extract_rows(&rows, detection))
}

/// Extract staged rows from a string grid.
///
/// Data begins on the row after `detection.header_row`. Rows whose UPC
/// yields no match key are dropped; unparseable numerics become `None`
/// rather than failing the file.
pub fn extract_rows(rows: &[Vec<String>], detection: Detection) -> Extraction {
    let columns = detection.vendor.columns();
    let data = rows.iter().skip(detection.header_row + 1);

    if detection.vendor == Vendor::Ecrs {
        let staged = data
            .filter_map(|row| {
                let upc_clean = match_key(cell(row, columns.upc))?;
                Some(StagedMovement {
                    upc_clean,
                    brand: columns.brand.and_then(|i| non_empty(cell(row, i))),
                    category: columns.category.and_then(|i| non_empty(cell(row, i))),
                    item_name: columns.item.and_then(|i| non_empty(cell(row, i))),
                    avg_price: columns.price.and_then(|i| parse_money(cell(row, i))),
                    units_sold: None,
                })
            })
            .collect();
        Extraction::Movement(staged)
    } else {
        let staged = data
            .filter_map(|row| {
                let upc_clean = match_key(cell(row, columns.upc))?;
                Some(StagedCost {
                    upc_clean,
                    vendor: detection.vendor,
                    cost: columns.cost.and_then(|i| parse_money(cell(row, i))),
                })
            })
            .collect();
        Extraction::Costs(staged)
    }
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("").trim()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

/// Parse a money cell: currency symbols, grouping commas and
/// surrounding noise are tolerated, anything else is `None`.
pub(crate) fn parse_money(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

fn csv_rows(path: &Path, limit: Option<usize>) -> Result<Vec<Vec<String>>, FeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| FeedError::Csv {
            path: path.to_owned(),
            source,
        })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        // malformed lines are skipped, matching how the feeds are read everywhere else
        let Ok(record) = record else { continue };
        rows.push(record.iter().map(str::to_owned).collect());
        if limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }
    }
    Ok(rows)
}

fn sheet_rows(
    workbook: &mut Sheets<std::io::BufReader<std::fs::File>>,
    path: &Path,
    sheet: &str,
    limit: Option<usize>,
) -> Result<Vec<Vec<String>>, FeedError> {
    let range: Range<Data> =
        workbook
            .worksheet_range(sheet)
            .map_err(|source| FeedError::Spreadsheet {
                path: path.to_owned(),
                source,
            })?;

    let take = limit.unwrap_or(usize::MAX);
    Ok(range
        .rows()
        .take(take)
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}
