//! `.xlsx` reading and writing.
//!
//! Reading goes through calamine into a [`SheetTable`], which checks the
//! header row once and then hands out typed cells. Writing goes through
//! rust_xlsxwriter; the finished workbook is serialized in memory and moved
//! into place with a rename so a failed run never leaves half a file behind.

use crate::error::{DataShapeError, WorkbookError};
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MAX_SHEET_NAME_LEN: usize = 31;
pub const MAX_CELL_TEXT_LEN: usize = 32_767;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

pub struct WorkbookReader {
    path: PathBuf,
    workbook: Xlsx<BufReader<File>>,
}

impl WorkbookReader {
    pub fn open(path: &Path) -> Result<Self, WorkbookError> {
        let workbook: Xlsx<BufReader<File>> =
            open_workbook(path).map_err(|e: calamine::XlsxError| WorkbookError::OpenFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        debug!("Opened workbook {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet_names().iter().any(|s| s == name)
    }

    pub fn sheet(&mut self, name: &str) -> Result<SheetTable, WorkbookError> {
        if !self.has_sheet(name) {
            return Err(WorkbookError::SheetNotFound {
                path: self.path.display().to_string(),
                sheet: name.to_string(),
            });
        }

        let range = self
            .workbook
            .worksheet_range(name)
            .map_err(|e| WorkbookError::ReadFailed {
                sheet: name.to_string(),
                reason: e.to_string(),
            })?;

        let mut rows = range.rows().map(|row| row.to_vec());
        let headers = rows
            .next()
            .map(|header| header.iter().map(cell_text).collect())
            .unwrap_or_default();

        Ok(SheetTable {
            name: name.to_string(),
            headers,
            rows: rows.collect(),
        })
    }
}

/// One worksheet: a header row plus raw data rows.
#[derive(Debug, Clone)]
pub struct SheetTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Data>>,
}

impl SheetTable {
    pub fn new(name: &str, headers: Vec<String>, rows: Vec<Vec<Data>>) -> Self {
        Self {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolves every required column up front so a bad sheet fails before
    /// any row is parsed.
    pub fn require_columns<const N: usize>(
        &self,
        names: [&str; N],
    ) -> Result<[usize; N], DataShapeError> {
        if self.headers.is_empty() {
            return Err(DataShapeError::MissingHeader {
                sheet: self.name.clone(),
            });
        }

        let mut indices = [0usize; N];
        for (slot, name) in indices.iter_mut().zip(names) {
            *slot = self
                .headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| DataShapeError::MissingColumn {
                    sheet: self.name.clone(),
                    column: name.to_string(),
                })?;
        }
        Ok(indices)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Data {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Data::Empty)
    }

    pub fn text(&self, row: usize, col: usize) -> String {
        cell_text(self.cell(row, col))
    }

    pub fn float(&self, row: usize, col: usize) -> Result<f64, DataShapeError> {
        self.optional_float(row, col)?
            .ok_or_else(|| self.invalid(row, col, "number"))
    }

    pub fn optional_float(&self, row: usize, col: usize) -> Result<Option<f64>, DataShapeError> {
        match self.cell(row, col) {
            Data::Empty => Ok(None),
            Data::Float(f) if f.is_nan() => Ok(None),
            Data::Float(f) => Ok(Some(*f)),
            Data::Int(i) => Ok(Some(*i as f64)),
            Data::String(s) if s.trim().is_empty() => Ok(None),
            Data::String(s) => s
                .trim()
                .parse::<f64>()
                .map(|f| if f.is_nan() { None } else { Some(f) })
                .map_err(|_| self.invalid(row, col, "number")),
            _ => Err(self.invalid(row, col, "number")),
        }
    }

    pub fn integer(&self, row: usize, col: usize) -> Result<i64, DataShapeError> {
        match self.cell(row, col) {
            Data::Int(i) => Ok(*i),
            Data::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
            Data::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| self.invalid(row, col, "integer")),
            _ => Err(self.invalid(row, col, "integer")),
        }
    }

    pub fn datetime(&self, row: usize, col: usize) -> Result<NaiveDateTime, DataShapeError> {
        let parsed = match self.cell(row, col) {
            Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64()),
            Data::Float(f) => excel_serial_to_datetime(*f),
            Data::Int(i) => excel_serial_to_datetime(*i as f64),
            Data::DateTimeIso(s) | Data::String(s) => parse_datetime_text(s),
            _ => None,
        };
        parsed.ok_or_else(|| self.invalid(row, col, "date"))
    }

    pub fn date(&self, row: usize, col: usize) -> Result<NaiveDate, DataShapeError> {
        self.datetime(row, col).map(|dt| dt.date())
    }

    fn invalid(&self, row: usize, col: usize, expected: &str) -> DataShapeError {
        DataShapeError::InvalidCell {
            sheet: self.name.clone(),
            // 1-based, counting the header row
            row: row + 2,
            column: self
                .headers
                .get(col)
                .cloned()
                .unwrap_or_else(|| format!("#{}", col)),
            expected: expected.to_string(),
            found: format!("{:?}", self.cell(row, col)),
        }
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Converts a 1900-system Excel serial (days since 1899-12-30) to a timestamp,
/// rounded to the millisecond.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    const DATETIME_PATTERNS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    DATETIME_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(text, pattern).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A value to place in one output cell.
#[derive(Debug, Clone, Copy)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Integer(i64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Empty,
}

pub struct WorkbookWriter {
    workbook: Workbook,
    sheet_names: HashSet<String>,
    date_format: Format,
    datetime_format: Format,
}

impl WorkbookWriter {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            sheet_names: HashSet::new(),
            date_format: Format::new().set_num_format(DATE_FORMAT),
            datetime_format: Format::new().set_num_format(DATETIME_FORMAT),
        }
    }

    pub fn sheet_count(&self) -> usize {
        self.sheet_names.len()
    }

    /// Adds a worksheet named `name` and writes `headers` into its first row.
    pub fn add_sheet(
        &mut self,
        name: &str,
        headers: &[&str],
    ) -> Result<SheetWriter<'_>, WorkbookError> {
        if !is_valid_sheet_name(name) || self.sheet_names.contains(&name.to_lowercase()) {
            return Err(WorkbookError::InvalidSheetName {
                sheet: name.to_string(),
            });
        }

        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(name)
            .map_err(|_| WorkbookError::InvalidSheetName {
                sheet: name.to_string(),
            })?;
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header)?;
        }
        self.sheet_names.insert(name.to_lowercase());

        Ok(SheetWriter {
            worksheet,
            date_format: &self.date_format,
            datetime_format: &self.datetime_format,
            next_row: 1,
        })
    }

    /// Serializes the workbook and atomically replaces `path` with it.
    pub fn save(mut self, path: &Path) -> Result<(), WorkbookError> {
        let write_failed = |reason: String| WorkbookError::WriteFailed {
            path: path.display().to_string(),
            reason,
        };

        let buffer = self.workbook.save_to_buffer()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
        }

        let mut partial = path.as_os_str().to_owned();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        std::fs::write(&partial, &buffer).map_err(|e| write_failed(e.to_string()))?;
        if let Err(e) = std::fs::rename(&partial, path) {
            let _ = std::fs::remove_file(&partial);
            return Err(write_failed(e.to_string()));
        }

        debug!(
            "Saved workbook {} ({} sheets, {} bytes)",
            path.display(),
            self.sheet_names.len(),
            buffer.len()
        );
        Ok(())
    }
}

impl Default for WorkbookWriter {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SheetWriter<'a> {
    worksheet: &'a mut Worksheet,
    date_format: &'a Format,
    datetime_format: &'a Format,
    next_row: u32,
}

impl SheetWriter<'_> {
    pub fn write_row(&mut self, cells: &[Cell<'_>]) -> Result<(), WorkbookError> {
        let row = self.next_row;
        for (col, cell) in cells.iter().enumerate() {
            let col = col as u16;
            match *cell {
                Cell::Text(text) => {
                    self.worksheet
                        .write_string(row, col, truncate_cell_text(text))?;
                }
                Cell::Number(value) if value.is_finite() => {
                    self.worksheet.write_number(row, col, value)?;
                }
                Cell::Number(_) | Cell::Empty => {}
                Cell::Integer(value) => {
                    self.worksheet.write_number(row, col, value as f64)?;
                }
                Cell::Date(date) => {
                    self.worksheet
                        .write_datetime_with_format(row, col, &date, self.date_format)?;
                }
                Cell::DateTime(datetime) => {
                    self.worksheet.write_datetime_with_format(
                        row,
                        col,
                        &datetime,
                        self.datetime_format,
                    )?;
                }
            }
        }
        self.next_row += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u32 {
        self.next_row - 1
    }
}

pub(crate) fn is_valid_sheet_name(name: &str) -> bool {
    const FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];
    !name.is_empty()
        && name.chars().count() <= MAX_SHEET_NAME_LEN
        && !name.contains(&FORBIDDEN[..])
        && !name.starts_with('\'')
        && !name.ends_with('\'')
}

fn truncate_cell_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_TEXT_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excel_serial_conversion() {
        // 45296.5 is 2024-01-05 12:00:00
        let dt = excel_serial_to_datetime(45296.5).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        );
        assert!(excel_serial_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn test_parse_datetime_text() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime_text("2024-01-05 09:30:00"), Some(expected));
        assert_eq!(parse_datetime_text("2024-01-05T09:30:00"), Some(expected));
        assert_eq!(
            parse_datetime_text("2024-01-05"),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_datetime_text("last tuesday"), None);
    }

    #[test]
    fn test_require_columns() {
        let table = SheetTable::new(
            "GME",
            vec!["Date".to_string(), "Close".to_string()],
            vec![vec![Data::String("2024-01-05".to_string()), Data::Float(10.0)]],
        );
        assert_eq!(table.require_columns(["Close", "Date"]).unwrap(), [1, 0]);
        assert_eq!(
            table.require_columns(["Returns"]).unwrap_err(),
            DataShapeError::MissingColumn {
                sheet: "GME".to_string(),
                column: "Returns".to_string(),
            }
        );

        let empty = SheetTable::new("AMC", Vec::new(), Vec::new());
        assert!(matches!(
            empty.require_columns(["Date"]),
            Err(DataShapeError::MissingHeader { .. })
        ));
    }

    #[test]
    fn test_typed_cells() {
        let table = SheetTable::new(
            "GME",
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec![vec![Data::Int(4), Data::String(" 2.5 ".to_string()), Data::Empty]],
        );
        assert_eq!(table.integer(0, 0).unwrap(), 4);
        assert_eq!(table.float(0, 1).unwrap(), 2.5);
        assert_eq!(table.optional_float(0, 2).unwrap(), None);
        assert_eq!(table.text(0, 2), "");

        let err = table.float(0, 2).unwrap_err();
        assert!(matches!(err, DataShapeError::InvalidCell { row: 2, .. }));
        assert!(table.integer(0, 1).is_err());
    }

    #[test]
    fn test_truncate_cell_text() {
        let long = "a".repeat(MAX_CELL_TEXT_LEN + 10);
        assert_eq!(truncate_cell_text(&long).len(), MAX_CELL_TEXT_LEN);
        assert_eq!(truncate_cell_text("short"), "short");
    }

    #[test]
    fn test_duplicate_and_long_sheet_names_rejected() {
        let mut writer = WorkbookWriter::new();
        assert!(writer.add_sheet("GME", &["Date"]).is_ok());
        assert!(matches!(
            writer.add_sheet("gme", &["Date"]),
            Err(WorkbookError::InvalidSheetName { .. })
        ));
        assert!(matches!(
            writer.add_sheet(&"X".repeat(32), &["Date"]),
            Err(WorkbookError::InvalidSheetName { .. })
        ));
        assert!(writer.add_sheet("GME/AMC", &["Date"]).is_err());
        assert_eq!(writer.sheet_count(), 1);
    }
}
