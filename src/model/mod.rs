use serde::{Deserialize, Serialize};

/// Column holding the name of the workbook a row was extracted from.
pub const SOURCE_FILE_COLUMN: &str = "Source File";
/// Column holding the name of the sheet a row was extracted from.
pub const SOURCE_SHEET_COLUMN: &str = "Source Sheet";
/// Column holding the 1-based index of the table within its sheet.
pub const TABLE_INDEX_COLUMN: &str = "Table Index";

/// The three traceability columns, in the order the reader prefixes them.
pub const TRACEABILITY_COLUMNS: [&str; 3] =
    [SOURCE_FILE_COLUMN, SOURCE_SHEET_COLUMN, TABLE_INDEX_COLUMN];

/// Represents a scalar cell value read from a spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    /// Plain string cell. Date and time cells are rendered into this form.
    String(String),
    /// Numeric cell.
    Number(f64),
    /// Boolean cell.
    Boolean(bool),
    /// Empty cell.
    Empty,
}

impl CellValue {
    /// Returns true when the cell carries no usable content. Whitespace-only
    /// strings count as empty so that visually blank rows and columns are
    /// treated as structural separators.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(value) => value.trim().is_empty(),
            _ => false,
        }
    }

    /// Converts the cell into the text form used by the staging store.
    /// Empty cells become `None`, which the store persists as NULL.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::String(value) => Some(value.clone()),
            CellValue::Number(value) => Some(value.to_string()),
            CellValue::Boolean(value) => Some(value.to_string()),
        }
    }
}

/// Identifies where a table was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOrigin {
    /// File name of the source workbook.
    pub file_name: String,
    /// Name of the source sheet.
    pub sheet_name: String,
    /// 1-based index of the table within the sheet, counting only tables
    /// that survived extraction.
    pub table_index: u32,
}

impl std::fmt::Display for TableOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} -> Table {}",
            self.file_name, self.sheet_name, self.table_index
        )
    }
}

/// One table extracted from a sheet. Columns include the three traceability
/// columns at positions 0..2.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub origin: TableOrigin,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Returns true when the table has no data rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }
}

/// Manifest entry recording how many data rows a source table contributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTableInfo {
    pub origin: TableOrigin,
    pub row_count: usize,
}

/// The merged result of a consolidation run. Values are the NULL-able text
/// the staging store produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidatedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ConsolidatedTable {
    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table holds no columns and no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Position of a column by name, if present.
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}
