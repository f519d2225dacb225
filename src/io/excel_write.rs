use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::model::ConsolidatedTable;

/// Sheet name the consolidated data is written under.
pub const OUTPUT_SHEET: &str = "Consolidated_Data";

/// Writes the consolidated table to the given path.
pub fn write_workbook(path: &Path, table: &ConsolidatedTable) -> Result<()> {
    let mut workbook = build_workbook(table)?;
    workbook.save(path)?;
    Ok(())
}

/// Renders the consolidated table into an in-memory `.xlsx` file, ready to
/// be served as a download.
pub fn workbook_bytes(table: &ConsolidatedTable) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(table)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook(table: &ConsolidatedTable) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET)?;

    if table.columns.is_empty() {
        return Ok(workbook);
    }

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if let Some(value) = cell {
                worksheet.write_string((row_idx + 1) as u32, col_idx as u16, value)?;
            }
        }
    }

    let mut excel_table = rust_xlsxwriter::Table::new();
    excel_table.set_autofilter(true);

    let col_end = (table.columns.len() as u16).saturating_sub(1);
    let row_end = if table.rows.is_empty() {
        0
    } else {
        table.rows.len() as u32
    };
    worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;

    Ok(workbook)
}
