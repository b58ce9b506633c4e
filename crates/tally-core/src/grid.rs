//! Grid loading: spreadsheet bytes to a rectangular grid of trimmed cells
//!
//! No heuristics live here. Every row is right-padded to the widest row so
//! downstream column lookups never index out of bounds.

use calamine::{Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::io::Cursor;
use tracing::debug;

use crate::error::{Error, Result};

/// Rectangular array of spreadsheet cell values. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// Build a grid from raw rows, right-padding every row with empty
    /// strings to the widest row's length
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Declared column count (identical for every row)
    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }
}

/// Tabular formats the loader accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
    Xls,
}

impl SourceFormat {
    /// Derive the format from a file name's extension
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = file_name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "xls" => Ok(Self::Xls),
            _ => Err(Error::UnsupportedExtension(file_name.to_string())),
        }
    }
}

/// Strip surrounding whitespace and a UTF-8 BOM if present
fn trim_cell(text: &str) -> String {
    text.trim().trim_start_matches('\u{feff}').trim().to_string()
}

/// Decode spreadsheet bytes into a grid
///
/// This is the only fatal failure point of the pipeline: bytes that cannot
/// be decoded at all surface as an error with no partial result.
pub fn load_grid(bytes: &[u8], format: SourceFormat) -> Result<Grid> {
    let rows = match format {
        SourceFormat::Csv => load_csv_rows(bytes)?,
        SourceFormat::Xlsx => {
            let workbook = Xlsx::new(Cursor::new(bytes)).map_err(calamine::Error::from)?;
            load_sheet_rows(workbook)?
        }
        SourceFormat::Xls => {
            let workbook = Xls::new(Cursor::new(bytes)).map_err(calamine::Error::from)?;
            load_sheet_rows(workbook)?
        }
    };

    let grid = Grid::from_rows(rows);
    debug!("Loaded grid: {} rows x {} columns", grid.len(), grid.width());
    Ok(grid)
}

fn load_csv_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(trim_cell).collect());
    }
    Ok(rows)
}

/// Read the first worksheet of an already-opened workbook
fn load_sheet_rows<RS, R>(mut workbook: R) -> Result<Vec<Vec<String>>>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    calamine::Error: From<R::Error>,
{
    let sheet_names = workbook.sheet_names().to_owned();
    let first_sheet = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| Error::UnreadableFile("workbook has no worksheets".to_string()))?;

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(calamine::Error::from)?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(|cell| trim_cell(&cell.to_string())).collect())
        .collect();
    Ok(rows)
}
