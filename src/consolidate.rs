//! Merges extracted tables into a single table via a SQLite staging store.
//!
//! The staging schema is all-TEXT so that mixed source types (numbers next to
//! strings, booleans next to labels) survive the merge; empty cells become
//! NULL. The store runs in memory for the duration of one consolidation.

use std::collections::{BTreeSet, HashMap};

use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use crate::error::Result;
use crate::model::{ConsolidatedTable, Table, TRACEABILITY_COLUMNS};
use crate::schema::ColumnTemplate;

/// Report line used when every table carried every column.
pub const NO_ANOMALIES: &str = "No anomalies detected.";
/// Report line used when no input table held any data.
pub const NO_DATA: &str = "No data found in any tables";

const STAGING_TABLE: &str = "consolidated";

/// The merged table together with the per-table anomaly lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidationOutcome {
    pub table: ConsolidatedTable,
    pub anomalies: Vec<String>,
}

impl ConsolidationOutcome {
    /// Renders the anomaly lines into the report text shown to the user.
    pub fn anomaly_report(&self) -> String {
        if self.anomalies.is_empty() {
            NO_ANOMALIES.to_string()
        } else {
            self.anomalies.join("\n")
        }
    }
}

/// Consolidates the given tables with union-of-columns semantics.
///
/// Column names are trimmed before matching, so ` Name ` and `Name` merge
/// into one column. Tables that lack columns present elsewhere produce one
/// anomaly line each, naming the missing columns.
pub fn consolidate_tables(
    tables: &[Table],
    template: &ColumnTemplate,
) -> Result<ConsolidationOutcome> {
    // Discovery: trim column names and build the union of all columns.
    let cleaned: Vec<(&Table, Vec<String>)> = tables
        .iter()
        .filter(|table| !table.is_empty())
        .map(|table| {
            let columns = table
                .columns
                .iter()
                .map(|column| column.trim().to_string())
                .collect();
            (table, columns)
        })
        .collect();

    let all_columns: BTreeSet<String> = cleaned
        .iter()
        .flat_map(|(_, columns)| columns.iter().cloned())
        .collect();

    if all_columns.is_empty() {
        return Ok(ConsolidationOutcome {
            table: ConsolidatedTable::default(),
            anomalies: vec![NO_DATA.to_string()],
        });
    }

    let master_columns = template.order_columns(&all_columns);
    debug!(
        column_count = master_columns.len(),
        table_count = cleaned.len(),
        "staging consolidated table"
    );

    let mut conn = Connection::open_in_memory()?;
    create_staging_table(&conn, &master_columns)?;

    // Load: align every table to the master columns and insert its rows.
    let mut anomalies = Vec::new();
    let insert_sql = insert_statement(&master_columns);
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&insert_sql)?;
        for (table, columns) in &cleaned {
            if let Some(line) = missing_columns_line(table, columns, &all_columns) {
                anomalies.push(line);
            }

            let mut positions: HashMap<&str, usize> = HashMap::new();
            for (index, column) in columns.iter().enumerate() {
                positions.entry(column.as_str()).or_insert(index);
            }

            for row in &table.rows {
                let values: Vec<Option<String>> = master_columns
                    .iter()
                    .map(|column| {
                        positions
                            .get(column.as_str())
                            .and_then(|&index| row.get(index))
                            .and_then(|cell| cell.to_text())
                    })
                    .collect();
                stmt.execute(params_from_iter(values.iter()))?;
            }
        }
    }
    tx.commit()?;

    let table = read_back(&conn, &master_columns)?;
    Ok(ConsolidationOutcome { table, anomalies })
}

fn create_staging_table(conn: &Connection, columns: &[String]) -> Result<()> {
    let column_defs: Vec<String> = columns
        .iter()
        .map(|column| format!("{} TEXT", quote_identifier(column)))
        .collect();
    let sql = format!(
        "CREATE TABLE {STAGING_TABLE} ({})",
        column_defs.join(", ")
    );
    conn.execute(&sql, [])?;
    Ok(())
}

fn insert_statement(columns: &[String]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {STAGING_TABLE} ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    )
}

fn read_back(conn: &Connection, columns: &[String]) -> Result<ConsolidatedTable> {
    let names: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
    let sql = format!("SELECT {} FROM {STAGING_TABLE}", names.join(", "));

    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map([], |row| {
        (0..columns.len())
            .map(|index| row.get::<_, Option<String>>(index))
            .collect::<rusqlite::Result<Vec<_>>>()
    })?;

    let mut rows = Vec::new();
    for row in mapped {
        rows.push(row?);
    }
    Ok(ConsolidatedTable {
        columns: columns.to_vec(),
        rows,
    })
}

fn missing_columns_line(
    table: &Table,
    columns: &[String],
    all_columns: &BTreeSet<String>,
) -> Option<String> {
    let own: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
    let missing: Vec<&str> = all_columns
        .iter()
        .map(String::as_str)
        .filter(|column| !own.contains(column) && !TRACEABILITY_COLUMNS.contains(column))
        .collect();
    if missing.is_empty() {
        return None;
    }
    Some(format!(
        "{}: missing columns [{}]",
        table.origin,
        missing.join(", ")
    ))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
