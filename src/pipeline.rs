use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::consolidate::{self, ConsolidationOutcome};
use crate::error::{ConsolidateError, Result};
use crate::io::{excel_read, excel_write};
use crate::schema::ColumnTemplate;
use crate::validate::{self, ValidationOutcome, ValidationSummary};

/// Optional outputs and behavior switches for a consolidation run.
#[derive(Debug, Clone, Default)]
pub struct ConsolidateOptions {
    /// Write the anomaly and integrity report to this path.
    pub report: Option<PathBuf>,
    /// Write the validation summary as JSON to this path.
    pub summary_json: Option<PathBuf>,
    /// Custom column template (JSON array of column names).
    pub template: Option<PathBuf>,
    /// Treat a failed integrity validation as an error.
    pub strict: bool,
}

/// What a consolidation run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub files_read: usize,
    pub files_skipped: usize,
    pub table_count: usize,
    pub row_count: usize,
    pub anomaly_report: String,
    pub validation: ValidationSummary,
}

/// Consolidates every table found in the input workbooks into a single
/// output workbook, validating that no source row was lost on the way.
///
/// Unreadable input files are skipped with a warning so that one corrupt
/// workbook does not sink the whole batch.
#[instrument(
    level = "info",
    skip_all,
    fields(input_count = inputs.len(), output = %output.display())
)]
pub fn consolidate_files(
    inputs: &[PathBuf],
    output: &Path,
    options: &ConsolidateOptions,
) -> Result<RunSummary> {
    let template = match &options.template {
        Some(path) => ColumnTemplate::load(path)?,
        None => ColumnTemplate::default(),
    };

    let mut tables = Vec::new();
    let mut manifest = Vec::new();
    let mut files_skipped = 0;
    for input in inputs {
        match excel_read::read_tables(input) {
            Ok((file_tables, file_manifest)) => {
                debug!(
                    input = %input.display(),
                    table_count = file_tables.len(),
                    "extracted tables"
                );
                tables.extend(file_tables);
                manifest.extend(file_manifest);
            }
            Err(error) => {
                warn!(input = %input.display(), %error, "skipping unreadable workbook");
                files_skipped += 1;
            }
        }
    }
    info!(table_count = tables.len(), "extracted tables from all inputs");

    let outcome = consolidate::consolidate_tables(&tables, &template)?;
    info!(
        row_count = outcome.table.row_count(),
        column_count = outcome.table.columns.len(),
        "consolidation complete"
    );

    let validation = validate::validate_consolidation(&outcome.table, &manifest);
    if !validation.summary.is_valid {
        warn!(
            mismatched_tables = validation.summary.mismatched_tables,
            difference = validation.summary.difference,
            "integrity validation found discrepancies"
        );
    }

    excel_write::write_workbook(output, &outcome.table)?;

    if let Some(path) = &options.report {
        fs::write(path, full_report(&outcome, &validation))?;
    }
    if let Some(path) = &options.summary_json {
        fs::write(path, serde_json::to_string_pretty(&validation.summary)?)?;
    }

    if options.strict && !validation.summary.is_valid {
        return Err(ConsolidateError::ValidationFailed {
            mismatched_tables: validation.summary.mismatched_tables,
            difference: validation.summary.difference,
        });
    }

    Ok(RunSummary {
        files_read: inputs.len() - files_skipped,
        files_skipped,
        table_count: tables.len(),
        row_count: outcome.table.row_count(),
        anomaly_report: outcome.anomaly_report(),
        validation: validation.summary,
    })
}

/// Combines the anomaly report and the integrity report into the text
/// written next to the output workbook.
pub fn full_report(outcome: &ConsolidationOutcome, validation: &ValidationOutcome) -> String {
    format!(
        "ANOMALIES (missing columns per table):\n{}\n\n{}",
        outcome.anomaly_report(),
        validate::render_report(validation)
    )
}
