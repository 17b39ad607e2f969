use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::error::{HomologaError, Result};

/// A single cell value as read from a tabular source.
///
/// Numeric cells keep their numeric form so that spreadsheet floats with an
/// integer value (openpyxl/calamine render `8` as `8.0`) can be rendered
/// without decimal or scientific artifacts.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Native textual form of the cell. Integral floats render as integers,
    /// empty cells as the empty string.
    pub fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.is_finite() && n.fract() == 0.0 => format!("{n:.0}"),
            Cell::Number(n) => n.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// One named section of a tabular source: a header row plus data rows.
/// Rows may be ragged; missing trailing cells are treated as absent.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, header: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            header,
            rows,
        }
    }

    fn from_range(name: &str, range: &Range<Data>) -> Self {
        let mut rows_iter = range.rows();
        // Blank header cells become empty strings, as positions still count
        let header = rows_iter
            .next()
            .map(|row| row.iter().map(|d| Cell::from(d).render()).collect())
            .unwrap_or_default();
        let rows = rows_iter
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();
        Self::new(name, header, rows)
    }

    /// Reads a delimited (CSV) source into a sheet. Every cell is text;
    /// ragged records are tolerated.
    pub fn from_delimited<R: Read>(reader: R, name: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let header = rdr
            .headers()
            .map_err(|e| HomologaError::Delimited {
                source_id: name.to_string(),
                message: e.to_string(),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| HomologaError::Delimited {
                source_id: name.to_string(),
                message: e.to_string(),
            })?;
            rows.push(record.iter().map(|v| Cell::Text(v.to_string())).collect());
        }
        Ok(Self::new(name, header, rows))
    }
}

/// A fully materialized spreadsheet workbook.
#[derive(Debug, Clone)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Opens a workbook from disk; calamine auto-detects xlsx/xls/ods.
    /// A corrupt or unreadable file is an error naming the source, fatal
    /// for this source only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source_id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut workbook = open_workbook_auto(path).map_err(|e| HomologaError::Workbook {
            source_id: source_id.clone(),
            message: e.to_string(),
        })?;
        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| HomologaError::Workbook {
                    source_id: source_id.clone(),
                    message: e.to_string(),
                })?;
            sheets.push(Sheet::from_range(&name, &range));
        }
        Ok(Self { sheets })
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// File-name stem used as the fallback source identifier for flat files.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_float_renders_without_fraction() {
        assert_eq!(Cell::Number(8.0).render(), "8");
        assert_eq!(Cell::Number(8950000000000000000.0).render(), "8950000000000000000");
    }

    #[test]
    fn fractional_float_keeps_its_fraction() {
        assert_eq!(Cell::Number(12.5).render(), "12.5");
    }

    #[test]
    fn empty_cell_renders_empty() {
        assert_eq!(Cell::Empty.render(), "");
        assert!(Cell::Text("   ".into()).is_empty());
        assert!(!Cell::Text("x".into()).is_empty());
    }

    #[test]
    fn delimited_sheet_reads_header_and_rows() {
        let csv = "ICCID,MSISDN\n123,555\n456,666\n";
        let sheet = Sheet::from_delimited(csv.as_bytes(), "TELCEL").unwrap();
        assert_eq!(sheet.header, vec!["ICCID", "MSISDN"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][0], Cell::Text("123".into()));
    }
}
