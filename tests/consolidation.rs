use std::fs;
use std::path::Path;

use calamine::{Reader, Xlsx, open_workbook};
use excel_consolidator::io::excel_read;
use excel_consolidator::model::{
    SOURCE_FILE_COLUMN, SOURCE_SHEET_COLUMN, TABLE_INDEX_COLUMN,
};
use excel_consolidator::pipeline::{self, ConsolidateOptions};
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

/// Writes a fixture workbook. An empty string leaves the cell blank; an
/// empty row vector produces the blank separator row between stacked tables.
fn write_fixture(path: &Path, sheets: &[(&str, Vec<Vec<&str>>)]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).expect("sheet name set");
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    worksheet
                        .write_string(row_idx as u32, col_idx as u16, *value)
                        .expect("cell written");
                }
            }
        }
    }
    workbook.save(path).expect("fixture saved");
}

fn read_output(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("output opened");
    let range = workbook
        .worksheet_range("Consolidated_Data")
        .expect("output sheet present")
        .expect("output sheet readable");
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .expect("header row")
        .iter()
        .map(|cell| cell.to_string())
        .collect();
    let data: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    (headers, data)
}

#[test]
fn single_table_single_sheet_is_extracted_with_traceability() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("single.xlsx");
    write_fixture(
        &input,
        &[(
            "Sheet1",
            vec![
                vec!["Name", "Age", "City"],
                vec!["Alice", "25", "NYC"],
                vec!["Bob", "30", "LA"],
                vec!["Charlie", "35", "Chicago"],
            ],
        )],
    );

    let (tables, manifest) = excel_read::read_tables(&input).expect("workbook read");

    assert_eq!(tables.len(), 1);
    assert_eq!(
        tables[0].columns,
        [
            SOURCE_FILE_COLUMN,
            SOURCE_SHEET_COLUMN,
            TABLE_INDEX_COLUMN,
            "Name",
            "Age",
            "City"
        ]
    );
    assert_eq!(tables[0].rows.len(), 3);
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest[0].origin.file_name, "single.xlsx");
    assert_eq!(manifest[0].origin.sheet_name, "Sheet1");
    assert_eq!(manifest[0].origin.table_index, 1);
    assert_eq!(manifest[0].row_count, 3);
}

#[test]
fn stacked_tables_and_extra_sheets_index_independently() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("stacked.xlsx");
    write_fixture(
        &input,
        &[
            (
                "Sheet1",
                vec![
                    vec!["Product", "Price"],
                    vec!["A", "10"],
                    vec!["B", "20"],
                    vec![],
                    vec!["Employee", "Department"],
                    vec!["John", "IT"],
                ],
            ),
            ("Sheet2", vec![vec!["Code"], vec!["X1"]]),
        ],
    );

    let (tables, manifest) = excel_read::read_tables(&input).expect("workbook read");

    assert_eq!(tables.len(), 3);
    assert_eq!(tables[0].origin.table_index, 1);
    assert_eq!(tables[1].origin.table_index, 2);
    assert_eq!(tables[1].origin.sheet_name, "Sheet1");
    assert_eq!(tables[2].origin.table_index, 1);
    assert_eq!(tables[2].origin.sheet_name, "Sheet2");
    assert_eq!(
        manifest.iter().map(|info| info.row_count).collect::<Vec<_>>(),
        [2, 1, 1]
    );
}

#[test]
fn empty_sheets_are_skipped() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("sparse.xlsx");
    write_fixture(
        &input,
        &[
            ("Empty", vec![]),
            ("Data", vec![vec!["Name"], vec!["Alice"]]),
        ],
    );

    let (tables, manifest) = excel_read::read_tables(&input).expect("workbook read");

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].origin.sheet_name, "Data");
    assert_eq!(manifest.len(), 1);
}

#[test]
fn consolidation_run_merges_files_and_reports() {
    let temp_dir = tempdir().expect("temporary directory");
    let first = temp_dir.path().join("a.xlsx");
    let second = temp_dir.path().join("b.xlsx");
    write_fixture(
        &first,
        &[(
            "Sheet1",
            vec![
                vec!["Name", "Age"],
                vec!["Alice", "25"],
                vec!["Bob", "30"],
            ],
        )],
    );
    write_fixture(
        &second,
        &[("Sheet1", vec![vec!["Name", "City"], vec!["Carol", "SP"]])],
    );

    let output = temp_dir.path().join("consolidated.xlsx");
    let report = temp_dir.path().join("report.txt");
    let summary_json = temp_dir.path().join("summary.json");
    let options = ConsolidateOptions {
        report: Some(report.clone()),
        summary_json: Some(summary_json.clone()),
        template: None,
        strict: true,
    };

    let summary =
        pipeline::consolidate_files(&[first, second], &output, &options).expect("run succeeded");

    assert_eq!(summary.files_read, 2);
    assert_eq!(summary.files_skipped, 0);
    assert_eq!(summary.table_count, 2);
    assert_eq!(summary.row_count, 3);
    assert!(summary.validation.is_valid);
    assert!(summary.anomaly_report.contains("a.xlsx -> Sheet1 -> Table 1"));
    assert!(summary.anomaly_report.contains("b.xlsx -> Sheet1 -> Table 1"));

    let (headers, rows) = read_output(&output);
    assert_eq!(
        headers,
        [
            SOURCE_FILE_COLUMN,
            SOURCE_SHEET_COLUMN,
            TABLE_INDEX_COLUMN,
            "Age",
            "City",
            "Name"
        ]
    );
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "a.xlsx");
    assert_eq!(rows[0][5], "Alice");
    assert_eq!(rows[2][4], "SP");

    let report_text = fs::read_to_string(&report).expect("report written");
    assert!(report_text.contains("ANOMALIES"));
    assert!(report_text.contains("missing columns [City]"));
    assert!(report_text.contains("RESULT: PASS"));

    let summary_text = fs::read_to_string(&summary_json).expect("summary written");
    let parsed: serde_json::Value = serde_json::from_str(&summary_text).expect("summary parses");
    assert_eq!(parsed["is_valid"], serde_json::Value::Bool(true));
    assert_eq!(parsed["total_source_rows"], serde_json::json!(3));
}

#[test]
fn unreadable_inputs_are_skipped() {
    let temp_dir = tempdir().expect("temporary directory");
    let good = temp_dir.path().join("good.xlsx");
    let bad = temp_dir.path().join("bad.xlsx");
    write_fixture(&good, &[("Sheet1", vec![vec!["Name"], vec!["Alice"]])]);
    fs::write(&bad, b"this is not a spreadsheet").expect("garbage written");

    let output = temp_dir.path().join("out.xlsx");
    let summary = pipeline::consolidate_files(
        &[bad, good],
        &output,
        &ConsolidateOptions::default(),
    )
    .expect("run succeeded");

    assert_eq!(summary.files_read, 1);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.row_count, 1);
    assert!(summary.validation.is_valid);
}

#[test]
fn custom_template_controls_column_order() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("data.xlsx");
    write_fixture(
        &input,
        &[(
            "Sheet1",
            vec![vec!["Idade", "Nome"], vec!["25", "Alice"]],
        )],
    );

    let template = temp_dir.path().join("template.json");
    fs::write(&template, r#"["Nome", "Idade"]"#).expect("template written");

    let output = temp_dir.path().join("out.xlsx");
    let options = ConsolidateOptions {
        template: Some(template),
        ..ConsolidateOptions::default()
    };
    pipeline::consolidate_files(&[input], &output, &options).expect("run succeeded");

    let (headers, _) = read_output(&output);
    assert_eq!(
        headers,
        [
            SOURCE_FILE_COLUMN,
            SOURCE_SHEET_COLUMN,
            TABLE_INDEX_COLUMN,
            "Nome",
            "Idade"
        ]
    );
}
