use std::collections::HashMap;

use serde_json::Value;

/// Column holding the fund's display name.
pub const FUND_NAME_COLUMN: &str = "Fund";

static MISSING: CellValue = CellValue::Missing;

/// A single scalar cell as delivered by the funds API.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Number(f64),
    #[default]
    Missing,
}

impl CellValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Missing,
            Value::String(text) => CellValue::Text(text.clone()),
            Value::Number(number) => number
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(number.to_string())),
            Value::Bool(flag) => CellValue::Text(flag.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Stringified form used for searching, sorting and export.
    /// Integral numbers print without a fractional part.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Number(number) => format!("{number}"),
            CellValue::Missing => String::new(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(number) => Some(*number),
            CellValue::Text(text) => parse_number(text),
            CellValue::Missing => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Parses the longest numeric prefix of `text`, the way a browser's
/// `parseFloat` does: `"8.5%"` reads as 8.5, `"abc"` does not parse.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }

    if mantissa_digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    trimmed[..end].parse::<f64>().ok()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FundRecord {
    cells: HashMap<String, CellValue>,
}

impl FundRecord {
    /// Absent columns read as [`CellValue::Missing`].
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&MISSING)
    }

    pub fn name(&self) -> String {
        self.get(FUND_NAME_COLUMN).to_text()
    }
}

impl<K, V> FromIterator<(K, V)> for FundRecord
where
    K: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }
}

/// The full fund list, loaded once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<FundRecord>,
}

impl Dataset {
    /// Every record is narrowed to the declared columns; undeclared keys are
    /// dropped and missing ones become [`CellValue::Missing`].
    pub fn new(columns: Vec<String>, records: Vec<FundRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|mut record| {
                let cells = columns
                    .iter()
                    .map(|column| {
                        let value = record.cells.remove(column).unwrap_or_default();
                        (column.clone(), value)
                    })
                    .collect();
                FundRecord { cells }
            })
            .collect();
        Self { columns, records }
    }

    pub fn from_json_rows(columns: Vec<String>, rows: Vec<serde_json::Map<String, Value>>) -> Self {
        let records = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(column, value)| (column.clone(), CellValue::from_json(value)))
                    .collect::<FundRecord>()
            })
            .collect();
        Self::new(columns, records)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[FundRecord] {
        &self.records
    }

    pub fn record(&self, idx: usize) -> Option<&FundRecord> {
        self.records.get(idx)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|name| name == column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
