//! Column ordering for consolidated output.
//!
//! The consolidated workbook arranges columns against an authoritative
//! template: traceability columns first, template columns in template order,
//! question columns (`P<number>`) naturally sorted and spliced where the
//! template places its first question, and unexpected columns alphabetically
//! at the end.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ConsolidateError, Result};
use crate::model::TRACEABILITY_COLUMNS;

/// Default column order carried over from the survey export layout the tool
/// was originally deployed against. Overridable per run with a custom
/// template file.
pub const TEMPLATE_SCHEMA: &[&str] = &[
    "ID Coleta",
    "ID Questionário",
    "Autor",
    "Data início",
    "Data fim",
    "Duração",
    "Latitude",
    "Longitude",
    "Revisão",
    "Sincronizacao",
    "Finalizada",
    "PIN",
    "Enviada para Webhook",
    "Número do WhatsApp",
    "ramal",
    "P1",
    "P2",
    "P3",
    "P4",
    "P5",
    "P6",
    "P7",
    "P7_1",
    "P7_2",
    "P7_3",
    "P7_4",
    "P7_5",
    "P7_6",
    "P7_7",
    "P7_8",
    "P8",
    "P9",
    "P9_2",
    "P9_3",
    "P9_4",
    "P9_1",
    "P9_5",
    "P9_6",
    "P9_7",
    "P9_8",
    "P9_9",
    "P9_10",
    "P10",
    "P10_2",
    "P10_3",
    "P10_4",
    "P10_1",
    "P10_5",
    "P10_6",
    "P10_7",
    "P10_8",
    "P10_9",
    "P10_10",
    "P11",
    "P12",
    "P13",
    "P14",
    "P15",
    "P16",
    "P17",
    "P18",
    "P19",
    "P20",
    "P21",
    "P22",
    "P23",
    "P24",
    "P25",
    "P26",
    "P27",
    "P28",
    "P29",
    "P30",
    "P31",
    "P32",
    "P33",
    "P34_1",
    "P34_2",
    "P34_3",
    "P34_4",
    "P34_5",
    "P34_6",
    "P34_7",
    "P35_2",
    "P35_3",
    "P35_4",
    "P35_1",
    "P35_5",
    "P35_6",
    "P36",
    "P37_2",
    "P37_3",
    "P37_1",
    "P37_4",
    "P37_5",
    "P37_6",
    "P38_1",
    "P38_2",
    "P38_3",
    "P38_4",
    "P38_5",
    "P38_6",
    "P38_7",
    "P39",
    "P40",
    "P41_1",
    "P41_2",
    "P41_3",
    "P41_4",
    "P41_5",
    "P41_6",
    "P41_7",
    "P41_8",
    "P41_9",
    "P41_10",
    "P41_11",
    "P42",
    "IDADE",
    "P44",
    "P45",
    "P46",
    "P47",
    "P48",
    "ID",
    "EMP",
    "FONE",
    "P52",
    "audios_urls",
];

static QUESTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^P\d+").expect("question column pattern is valid"));

/// Returns true when a column follows the `P<number>` question naming.
pub fn is_question_column(name: &str) -> bool {
    QUESTION_PATTERN.is_match(name)
}

/// Alternating text/number segments used to sort question columns so that
/// `P2` sorts before `P10`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Number(u64),
    Text(String),
}

fn natural_key(name: &str) -> Vec<KeyPart> {
    let mut parts = Vec::new();
    let mut buffer = String::new();
    let mut buffer_is_digits = false;

    for character in name.trim().chars() {
        let is_digit = character.is_ascii_digit();
        if !buffer.is_empty() && is_digit != buffer_is_digits {
            parts.push(flush_part(&mut buffer, buffer_is_digits));
        }
        buffer.push(character);
        buffer_is_digits = is_digit;
    }
    if !buffer.is_empty() {
        parts.push(flush_part(&mut buffer, buffer_is_digits));
    }

    parts
}

fn flush_part(buffer: &mut String, is_digits: bool) -> KeyPart {
    let text = std::mem::take(buffer);
    if is_digits {
        // Digit runs that overflow u64 saturate.
        KeyPart::Number(text.parse().unwrap_or(u64::MAX))
    } else {
        KeyPart::Text(text)
    }
}

/// Authoritative column order applied to consolidated output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTemplate {
    columns: Vec<String>,
}

impl Default for ColumnTemplate {
    fn default() -> Self {
        Self {
            columns: TEMPLATE_SCHEMA.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl ColumnTemplate {
    /// Builds a template from an explicit column list.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Loads a template from a JSON array of column names.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let columns: Vec<String> = serde_json::from_str(&data)
            .map_err(|error| ConsolidateError::InvalidTemplate(error.to_string()))?;
        if columns.is_empty() {
            return Err(ConsolidateError::InvalidTemplate(
                "template must list at least one column".into(),
            ));
        }
        Ok(Self { columns })
    }

    /// Arranges the discovered columns into the final output order.
    ///
    /// Traceability columns come first, followed by the template's
    /// non-question columns in template order, then every discovered question
    /// column in natural order (spliced where the template's first question
    /// sits), and finally unexpected columns sorted alphabetically.
    pub fn order_columns(&self, all_columns: &BTreeSet<String>) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();

        for column in TRACEABILITY_COLUMNS {
            if all_columns.contains(column) {
                order.push(column.to_string());
            }
        }

        let mut questions: Vec<&String> = all_columns
            .iter()
            .filter(|column| is_question_column(column))
            .collect();
        questions.sort_by(|lhs, rhs| natural_key(lhs).cmp(&natural_key(rhs)));

        let mut questions_placed = false;
        for column in &self.columns {
            if is_question_column(column) {
                if !questions_placed && !questions.is_empty() {
                    order.extend(questions.iter().map(|name| (*name).clone()));
                    questions_placed = true;
                }
            } else if all_columns.contains(column)
                && !TRACEABILITY_COLUMNS.contains(&column.as_str())
            {
                order.push(column.clone());
            }
        }
        if !questions_placed {
            order.extend(questions.iter().map(|name| (*name).clone()));
        }

        let known: HashSet<&str> = TRACEABILITY_COLUMNS
            .iter()
            .copied()
            .chain(self.columns.iter().map(String::as_str))
            .collect();
        let mut unexpected: Vec<&String> = all_columns
            .iter()
            .filter(|column| !known.contains(column.as_str()))
            .collect();
        unexpected.sort();
        order.extend(unexpected.into_iter().cloned());

        // Question columns outside the template appear in both the question
        // block and the unexpected tail; keep the first occurrence.
        let mut seen = HashSet::new();
        order.retain(|column| seen.insert(column.clone()));
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SOURCE_FILE_COLUMN, SOURCE_SHEET_COLUMN, TABLE_INDEX_COLUMN};

    fn columns(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn questions_sort_naturally_not_alphabetically() {
        let template = ColumnTemplate::default();
        let order = template.order_columns(&columns(&["P1", "P10", "P11", "P2"]));
        assert_eq!(order, vec!["P1", "P2", "P10", "P11"]);
    }

    #[test]
    fn sub_questions_sort_after_their_parent() {
        let template = ColumnTemplate::default();
        let order = template.order_columns(&columns(&["P10_2", "P10", "P2", "P10_10"]));
        assert_eq!(order, vec!["P2", "P10", "P10_2", "P10_10"]);
    }

    #[test]
    fn traceability_columns_come_first() {
        let template = ColumnTemplate::default();
        let order = template.order_columns(&columns(&[
            "P1",
            TABLE_INDEX_COLUMN,
            "Autor",
            SOURCE_FILE_COLUMN,
            SOURCE_SHEET_COLUMN,
        ]));
        assert_eq!(
            order[..3],
            [SOURCE_FILE_COLUMN, SOURCE_SHEET_COLUMN, TABLE_INDEX_COLUMN]
        );
    }

    #[test]
    fn template_columns_precede_questions_and_unexpected_trail() {
        let template = ColumnTemplate::default();
        let order = template.order_columns(&columns(&[
            "P10", "ID Coleta", "P1", "Autor", "Data início", "P5", "Nova_Z", "Nova_A",
        ]));
        let position =
            |name: &str| order.iter().position(|column| column == name).expect(name);

        assert!(position("ID Coleta") < position("Autor"));
        assert!(position("Autor") < position("Data início"));
        assert!(position("Data início") < position("P1"));
        let question_order: Vec<&str> = order
            .iter()
            .filter(|column| is_question_column(column))
            .map(String::as_str)
            .collect();
        assert_eq!(question_order, ["P1", "P5", "P10"]);
        assert!(position("P10") < position("Nova_A"));
        assert!(position("Nova_A") < position("Nova_Z"));
    }

    #[test]
    fn questions_missing_from_template_are_not_duplicated() {
        let template = ColumnTemplate::new(vec!["Autor".into()]);
        let order = template.order_columns(&columns(&["P3", "Autor", "P1"]));
        assert_eq!(order, vec!["Autor", "P1", "P3"]);
    }
}
