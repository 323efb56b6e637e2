//! Spare inventory import.
//!
//! A [`SpareSource`] yields raw [`SpareRow`]s; derivation into spares (life,
//! cost, randomized wear state) lives in `twinai_core::catalog`.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use twinai_core::catalog::SpareRow;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why the spare data source could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Spare data file not found: {0}")]
    NotFound(PathBuf),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Provides raw spare inventory rows.
pub trait SpareSource: Send + Sync {
    fn rows(&self) -> Result<Vec<SpareRow>, ImportError>;
}

/// Column positions of the inventory sheet, resolved from its header row.
/// Extra columns (`S.No`, `Remarks`) are ignored; missing columns and cells
/// past the end of a short row read as blank.
#[derive(Debug, Clone, Copy)]
struct Columns {
    item_code: Option<usize>,
    item_description: Option<usize>,
    unit: Option<usize>,
    min_stock: Option<usize>,
    reorder_level: Option<usize>,
    existing_stock: Option<usize>,
    status: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Self {
            item_code: find("Item Code"),
            item_description: find("Item Description"),
            unit: find("Unit"),
            min_stock: find("Min Stock"),
            reorder_level: find("Reorder Level"),
            existing_stock: find("Existing Stock"),
            status: find("Status"),
        }
    }

    fn row(&self, record: &StringRecord) -> SpareRow {
        let cell = |column: Option<usize>| {
            column
                .and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };
        SpareRow {
            item_code: cell(self.item_code),
            item_description: cell(self.item_description),
            unit: cell(self.unit),
            min_stock: cell(self.min_stock),
            reorder_level: cell(self.reorder_level),
            existing_stock: cell(self.existing_stock),
            status: cell(self.status),
        }
    }
}

/// Reads spares from a CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvSpareSource {
    path: PathBuf,
}

impl CsvSpareSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SpareSource for CsvSpareSource {
    fn rows(&self) -> Result<Vec<SpareRow>, ImportError> {
        if !self.path.exists() {
            return Err(ImportError::NotFound(self.path.clone()));
        }

        let file = File::open(&self.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let columns = Columns::from_headers(reader.headers()?);
        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            match record {
                Ok(record) => rows.push(columns.row(&record)),
                // Data rows are 1-based after the header.
                Err(e) => tracing::warn!(row = index + 1, error = %e, "Skipping malformed spare row"),
            }
        }
        Ok(rows)
    }
}

/// A source with no rows, for processes that run without seed data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpareSource;

impl SpareSource for NoSpareSource {
    fn rows(&self) -> Result<Vec<SpareRow>, ImportError> {
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
