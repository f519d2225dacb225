use std::path::Path;

use calamine::{DataType, Range, Reader, open_workbook_auto};
use chrono::Timelike;

use crate::error::Result;
use crate::model::{
    CellValue, SOURCE_FILE_COLUMN, SOURCE_SHEET_COLUMN, SourceTableInfo, TABLE_INDEX_COLUMN,
    Table, TableOrigin,
};

/// Reads a workbook (`.xlsx` or `.xls`, auto-detected) and extracts every
/// stacked table from every sheet.
///
/// Sheets are split into tables at completely empty rows. Within each
/// segment, empty columns are dropped and the first row is promoted to
/// headers; empty header cells are named `Column_{i}` by position. Tables
/// reduced to a bare header are discarded and do not consume a table index.
/// Surviving tables are prefixed with the three traceability columns, and
/// each one gets a manifest entry recording its origin and data row count.
pub fn read_tables(path: &Path) -> Result<(Vec<Table>, Vec<SourceTableInfo>)> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_owned();

    let mut tables = Vec::new();
    let mut manifest = Vec::new();

    for sheet_name in sheet_names {
        let range = match workbook.worksheet_range(&sheet_name) {
            Some(range) => range?,
            None => continue,
        };
        if range.is_empty() {
            continue;
        }
        extract_sheet_tables(&file_name, &sheet_name, &range, &mut tables, &mut manifest);
    }

    Ok((tables, manifest))
}

fn extract_sheet_tables(
    file_name: &str,
    sheet_name: &str,
    range: &Range<DataType>,
    tables: &mut Vec<Table>,
    manifest: &mut Vec<SourceTableInfo>,
) {
    let grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    let mut table_index: u32 = 1;
    let mut start = 0;

    for boundary in 0..=grid.len() {
        let at_separator =
            boundary == grid.len() || grid[boundary].iter().all(CellValue::is_empty);
        if !at_separator {
            continue;
        }
        if boundary > start {
            if let Some((columns, rows)) = build_table(&grid[start..boundary]) {
                let origin = TableOrigin {
                    file_name: file_name.to_string(),
                    sheet_name: sheet_name.to_string(),
                    table_index,
                };
                manifest.push(SourceTableInfo {
                    origin: origin.clone(),
                    row_count: rows.len(),
                });
                tables.push(with_traceability(origin, columns, rows));
                table_index += 1;
            }
        }
        start = boundary + 1;
    }
}

/// Turns one non-empty segment into headers and data rows. Returns `None`
/// when nothing remains after dropping empty columns and the header row.
fn build_table(segment: &[Vec<CellValue>]) -> Option<(Vec<String>, Vec<Vec<CellValue>>)> {
    let width = segment.iter().map(Vec::len).max().unwrap_or(0);
    let kept: Vec<usize> = (0..width)
        .filter(|&col| {
            segment
                .iter()
                .any(|row| row.get(col).is_some_and(|cell| !cell.is_empty()))
        })
        .collect();
    if kept.is_empty() {
        return None;
    }

    let mut rows = segment.iter();
    let header_row = rows.next()?;
    let columns: Vec<String> = kept
        .iter()
        .enumerate()
        .map(|(position, &col)| {
            let header = header_row
                .get(col)
                .and_then(CellValue::to_text)
                .unwrap_or_default();
            if header.trim().is_empty() {
                format!("Column_{position}")
            } else {
                header
            }
        })
        .collect();

    let data_rows: Vec<Vec<CellValue>> = rows
        .map(|row| {
            kept.iter()
                .map(|&col| row.get(col).cloned().unwrap_or(CellValue::Empty))
                .collect()
        })
        .collect();
    if data_rows.is_empty() {
        return None;
    }

    Some((columns, data_rows))
}

fn with_traceability(origin: TableOrigin, columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Table {
    let mut full_columns = vec![
        SOURCE_FILE_COLUMN.to_string(),
        SOURCE_SHEET_COLUMN.to_string(),
        TABLE_INDEX_COLUMN.to_string(),
    ];
    full_columns.extend(columns);

    let rows = rows
        .into_iter()
        .map(|row| {
            let mut full_row = vec![
                CellValue::String(origin.file_name.clone()),
                CellValue::String(origin.sheet_name.clone()),
                CellValue::Number(f64::from(origin.table_index)),
            ];
            full_row.extend(row);
            full_row
        })
        .collect();

    Table {
        origin,
        columns: full_columns,
        rows,
    }
}

fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(value) => CellValue::String(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Boolean(*value),
        DataType::Empty => CellValue::Empty,
        DataType::DateTime(_) => match cell.as_datetime() {
            Some(timestamp) => CellValue::String(format_datetime(timestamp)),
            None => CellValue::Empty,
        },
        other => CellValue::String(other.to_string()),
    }
}

fn format_datetime(timestamp: chrono::NaiveDateTime) -> String {
    if timestamp.num_seconds_from_midnight() == 0 && timestamp.nanosecond() == 0 {
        timestamp.format("%Y-%m-%d").to_string()
    } else {
        timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
