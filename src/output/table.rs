use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed cell in an engine-produced detail table.
///
/// All rounding happens before a value lands in a cell; renderers display
/// cells verbatim and never recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Percentage(f64),
    Date(NaiveDate),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn number(value: f64) -> Self {
        Self::Number(round2(value))
    }

    pub fn percentage(value: f64) -> Self {
        Self::Percentage(round1(value))
    }

    pub fn count(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(value) => write!(f, "{value}"),
            CellValue::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{value:.2}")
                }
            }
            CellValue::Percentage(value) => write!(f, "{value:.1}%"),
            CellValue::Date(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<CellValue>,
}

/// Ordered row/column structure emitted by the engines for direct rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    pub footnotes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl ReportTable {
    pub fn new(title: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            title: title.into(),
            columns: columns.iter().map(|name| name.to_string()).collect(),
            rows: Vec::new(),
            footnotes: Vec::new(),
            formula: None,
        }
    }

    pub fn push_row(&mut self, cells: Vec<CellValue>) {
        self.rows.push(TableRow { cells });
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn push_footnote(&mut self, note: impl Into<String>) {
        self.footnotes.push(note.into());
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_cells_round_to_two_decimals() {
        assert_eq!(CellValue::number(1.23456), CellValue::Number(1.23));
        assert_eq!(CellValue::number(3.0), CellValue::Number(3.0));
    }

    #[test]
    fn display_formats_each_cell_type() {
        assert_eq!(CellValue::text("lot B-12").to_string(), "lot B-12");
        assert_eq!(CellValue::Number(4.0).to_string(), "4");
        assert_eq!(CellValue::Number(4.5).to_string(), "4.50");
        assert_eq!(CellValue::Percentage(12.34).to_string(), "12.3%");
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date");
        assert_eq!(CellValue::Date(date).to_string(), "2025-03-01");
    }

    #[test]
    fn table_preserves_row_order_and_formula() {
        let mut table = ReportTable::new("Monthly Complaint Trend", &["Period", "Rate"])
            .with_formula("(complaints / exposure) x 1,000");
        table.push_row(vec![CellValue::text("2025-01"), CellValue::number(0.4)]);
        table.push_row(vec![CellValue::text("2025-02"), CellValue::number(0.6)]);
        table.push_footnote("Monthly exposure assumes uniform distribution.");

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells[0], CellValue::Text("2025-01".into()));
        assert!(table.formula.as_deref().unwrap_or("").contains("1,000"));
        assert_eq!(table.footnotes.len(), 1);
    }
}
