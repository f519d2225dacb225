//! Integrity validation for consolidation runs.
//!
//! Every source table recorded in the manifest must account for exactly its
//! row count in the consolidated output; rows are matched back to their
//! source through the traceability columns.

use serde::Serialize;

use crate::model::{
    ConsolidatedTable, SOURCE_FILE_COLUMN, SOURCE_SHEET_COLUMN, SourceTableInfo,
    TABLE_INDEX_COLUMN, TableOrigin,
};

/// Per-source-table comparison of expected and found row counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCheck {
    pub origin: TableOrigin,
    pub expected: usize,
    pub actual: usize,
}

impl TableCheck {
    pub fn is_ok(&self) -> bool {
        self.expected == self.actual
    }
}

/// Compact validation result for programmatic use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub is_valid: bool,
    pub total_source_rows: usize,
    pub total_consolidated_rows: usize,
    pub difference: usize,
    pub total_tables: usize,
    pub mismatched_tables: usize,
    pub totals_match: bool,
}

/// Full validation result: the summary plus every per-table check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub summary: ValidationSummary,
    pub checks: Vec<TableCheck>,
}

impl ValidationOutcome {
    /// Checks that found a row-count discrepancy.
    pub fn mismatches(&self) -> impl Iterator<Item = &TableCheck> {
        self.checks.iter().filter(|check| !check.is_ok())
    }
}

/// Compares the consolidated table against the source manifest.
pub fn validate_consolidation(
    table: &ConsolidatedTable,
    manifest: &[SourceTableInfo],
) -> ValidationOutcome {
    let file_pos = table.column_position(SOURCE_FILE_COLUMN);
    let sheet_pos = table.column_position(SOURCE_SHEET_COLUMN);
    let index_pos = table.column_position(TABLE_INDEX_COLUMN);

    let checks: Vec<TableCheck> = manifest
        .iter()
        .map(|info| {
            let index_text = info.origin.table_index.to_string();
            let actual = match (file_pos, sheet_pos, index_pos) {
                (Some(file), Some(sheet), Some(index)) => table
                    .rows
                    .iter()
                    .filter(|row| {
                        row[file].as_deref() == Some(info.origin.file_name.as_str())
                            && row[sheet].as_deref() == Some(info.origin.sheet_name.as_str())
                            && row[index].as_deref() == Some(index_text.as_str())
                    })
                    .count(),
                _ => 0,
            };
            TableCheck {
                origin: info.origin.clone(),
                expected: info.row_count,
                actual,
            }
        })
        .collect();

    let total_source_rows: usize = manifest.iter().map(|info| info.row_count).sum();
    let total_consolidated_rows = table.row_count();
    let totals_match = total_source_rows == total_consolidated_rows;
    let mismatched_tables = checks.iter().filter(|check| !check.is_ok()).count();

    ValidationOutcome {
        summary: ValidationSummary {
            is_valid: totals_match && mismatched_tables == 0,
            total_source_rows,
            total_consolidated_rows,
            difference: total_source_rows.abs_diff(total_consolidated_rows),
            total_tables: manifest.len(),
            mismatched_tables,
            totals_match,
        },
        checks,
    }
}

/// Renders the validation outcome as the plain-text integrity report.
pub fn render_report(outcome: &ValidationOutcome) -> String {
    let rule = "=".repeat(60);
    let thin_rule = "-".repeat(60);
    let summary = &outcome.summary;

    let mut lines = Vec::new();
    lines.push(rule.clone());
    lines.push("CONSOLIDATION INTEGRITY REPORT".to_string());
    lines.push(rule.clone());
    if summary.is_valid {
        lines.push("RESULT: PASS - every source row is present in the output".to_string());
    } else {
        lines.push("RESULT: FAIL - discrepancies found during consolidation".to_string());
    }
    lines.push(String::new());
    lines.push("TOTALS:".to_string());
    lines.push(format!(
        "  rows in source tables:  {}",
        summary.total_source_rows
    ));
    lines.push(format!(
        "  rows in consolidated:   {}",
        summary.total_consolidated_rows
    ));
    lines.push(format!("  difference:             {}", summary.difference));
    lines.push(String::new());

    lines.push("PER-TABLE CHECKS:".to_string());
    lines.push(thin_rule.clone());
    for check in &outcome.checks {
        let status = if check.is_ok() { "OK  " } else { "FAIL" };
        lines.push(format!(
            "  {status} {}: {}/{} rows",
            check.origin, check.actual, check.expected
        ));
    }

    if outcome.mismatches().next().is_some() {
        lines.push(String::new());
        lines.push("MISMATCH DETAILS:".to_string());
        lines.push(thin_rule);
        for check in outcome.mismatches() {
            lines.push(format!(
                "  {}: expected {} row(s), found {} (difference {})",
                check.origin,
                check.expected,
                check.actual,
                check.expected.abs_diff(check.actual)
            ));
        }
    }

    lines.push(rule.clone());
    if summary.is_valid {
        lines.push("VALIDATION COMPLETE: all source data was preserved.".to_string());
    } else {
        lines.push("WARNING: discrepancies were found.".to_string());
        if !summary.totals_match {
            lines.push("  - row totals do not match.".to_string());
        }
        if summary.mismatched_tables > 0 {
            lines.push(format!(
                "  - {} table(s) with incorrect row counts.",
                summary.mismatched_tables
            ));
        }
        lines.push("Review the consolidated data before distributing it.".to_string());
    }
    lines.push(rule);

    lines.join("\n")
}
