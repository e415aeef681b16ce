//! Raw tabular frames read from statement files
//!
//! Both delimited text and spreadsheets end up as a [`RawFrame`]: unique
//! column names plus rows of string cells, all rows padded to the header
//! width.

use std::collections::HashSet;
use std::io::Cursor;

use calamine::{Data, Reader};
use chrono::{Duration, NaiveDate};
use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::UploadedFile;
use crate::sniff::{self, TextEncoding};

/// Extensions read through the spreadsheet reader
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// How a statement file is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Delimited,
    Spreadsheet,
}

impl FileKind {
    pub fn of(file: &UploadedFile) -> Self {
        match file.extension() {
            Some(ext) if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) => Self::Spreadsheet,
            _ => Self::Delimited,
        }
    }
}

/// Header plus string cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawFrame {
    /// Build a frame, making column names unique and padding rows
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let columns = unique_columns(header);
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(String::as_str).unwrap_or(""))
    }
}

/// Read a statement file into a frame
pub fn read_frame(file: &UploadedFile, encodings: &[TextEncoding]) -> Result<RawFrame> {
    match FileKind::of(file) {
        FileKind::Delimited => read_delimited(&file.bytes, encodings),
        FileKind::Spreadsheet => read_spreadsheet(&file.bytes),
    }
}

/// Delimited text: sniff, then parse from the header row on.
///
/// Rows the reader cannot parse are skipped.
pub fn read_delimited(bytes: &[u8], encodings: &[TextEncoding]) -> Result<RawFrame> {
    let sniffed = sniff::sniff(bytes, encodings)?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(sniffed.delimiter)
        .from_reader(sniffed.table_text().as_bytes());

    let header: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        match result {
            Ok(record) => {
                if record.iter().all(|cell| cell.trim().is_empty()) {
                    continue;
                }
                rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
            }
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("Skipped {} malformed rows", skipped);
    }

    Ok(RawFrame::new(header, rows))
}

/// First worksheet; the first row is the header
pub fn read_spreadsheet(bytes: &[u8]) -> Result<RawFrame> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| Error::Spreadsheet(format!("Failed to open workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Spreadsheet("Workbook has no sheets".into()))?
        .map_err(|e| Error::Spreadsheet(format!("Failed to read sheet: {e}")))?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(cell_to_string).collect(),
        None => return Err(Error::UnparseableFormat("empty worksheet".into())),
    };

    let rows: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    debug!("Read {} spreadsheet rows", rows.len());
    Ok(RawFrame::new(header, rows))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

/// Spreadsheet serial day number to `YYYY-MM-DD`
pub fn excel_serial_to_date(serial: f64) -> String {
    // Serial 0 is 1899-12-30 once the 1900 leap year bug is accounted for
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|base| base.checked_add_signed(Duration::days(serial.trunc() as i64)));
    match date {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

/// Blank names become `Unnamed: N`; repeats get a `.1`, `.2` suffix
fn unique_columns(header: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {}", index)
            } else {
                name.trim().to_string()
            };
            let mut candidate = base.clone();
            let mut n = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}.{}", base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind() {
        assert_eq!(
            FileKind::of(&UploadedFile::new("nubank.csv", Vec::<u8>::new())),
            FileKind::Delimited
        );
        assert_eq!(
            FileKind::of(&UploadedFile::new("Inter.XLSX", Vec::<u8>::new())),
            FileKind::Spreadsheet
        );
        assert_eq!(
            FileKind::of(&UploadedFile::new("extrato", Vec::<u8>::new())),
            FileKind::Delimited
        );
    }

    #[test]
    fn test_read_delimited_with_preamble() {
        let csv = "Banco Inter\nPeríodo: jan/2024\nData Lançamento;Histórico;Valor\n02/01/2024;PIX ENVIADO;-50,00\n\n03/01/2024;SALARIO;5.000,00\n";
        let frame = read_delimited(csv.as_bytes(), &TextEncoding::defaults()).unwrap();
        assert_eq!(frame.columns, vec!["Data Lançamento", "Histórico", "Valor"]);
        assert_eq!(frame.rows.len(), 2);
        assert_eq!(frame.rows[1], vec!["03/01/2024", "SALARIO", "5.000,00"]);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let csv = "date,description,amount\n2024-01-01,coffee\n";
        let frame = read_delimited(csv.as_bytes(), &TextEncoding::defaults()).unwrap();
        assert_eq!(frame.rows[0], vec!["2024-01-01", "coffee", ""]);
    }

    #[test]
    fn test_unique_columns() {
        let cols = unique_columns(vec![
            "Valor".into(),
            "".into(),
            "Valor".into(),
            "Valor".into(),
        ]);
        assert_eq!(cols, vec!["Valor", "Unnamed: 1", "Valor.1", "Valor.2"]);
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45292.0), "2024-01-01");
        assert_eq!(excel_serial_to_date(45292.75), "2024-01-01");
    }

    #[test]
    fn test_invalid_workbook() {
        let err = read_spreadsheet(b"not a workbook").unwrap_err();
        assert!(matches!(err, Error::Spreadsheet(_)));
    }

    #[test]
    fn test_column_iter() {
        let frame = RawFrame::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into(), "2".into()], vec!["3".into()]],
        );
        let b: Vec<_> = frame.column(1).collect();
        assert_eq!(b, vec!["2", ""]);
    }
}
