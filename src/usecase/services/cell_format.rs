use crate::domain::entities::dataset::{CellValue, FUND_NAME_COLUMN};

const NUMERIC_COLUMNS: [&str; 23] = [
    "Aum",
    "Returns 1 Yr",
    "Returns 3 Yr",
    "Returns 5 Yr",
    "Returns 3 Months",
    "Sharpe Ratio 1 Yr",
    "Sharpe Ratio 3 Yr",
    "Sortino 1 Yr",
    "Sortino 3 Yr",
    "Max Drawdown Perc 1yr",
    "Max Drawdown Perc 3yr",
    "Expense Ratio",
    "Pb Ratio",
    "Pe Ratio",
    "Returns Since Inception",
    "Std 1 Yr",
    "Std 3 Yr",
    "Treynor Ratio 1 Yr",
    "Treynor Ratio 3 Yr",
    "Alpha 1 Yr",
    "Alpha 3 Yr",
    "Beta 1 Yr",
    "Beta 3 Yr",
];

pub const EMPTY_CELL: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellTone {
    Name,
    Text,
    Numeric,
    Positive,
    Negative,
}

pub fn is_numeric_column(column: &str) -> bool {
    NUMERIC_COLUMNS.contains(&column)
}

/// Display text for a table cell: `-` for blanks, two decimals for known
/// numeric columns, the raw value otherwise.
pub fn format_cell_value(column: &str, value: &CellValue) -> String {
    let text = value.to_text();
    if value.is_missing() || text.is_empty() {
        return EMPTY_CELL.to_string();
    }
    if is_numeric_column(column) {
        if let Some(number) = value.as_number() {
            return format!("{number:.2}");
        }
    }
    text
}

/// Returns and alpha columns are tinted by sign.
pub fn cell_tone(column: &str, value: &CellValue) -> CellTone {
    if column == FUND_NAME_COLUMN {
        return CellTone::Name;
    }
    if !is_numeric_column(column) {
        return CellTone::Text;
    }
    let signed = column.contains("Returns") || column.contains("Alpha");
    match value.as_number() {
        Some(number) if signed && number > 0.0 => CellTone::Positive,
        Some(number) if signed && number < 0.0 => CellTone::Negative,
        _ => CellTone::Numeric,
    }
}

pub fn cell_style(tone: CellTone) -> &'static str {
    match tone {
        CellTone::Name => "font-weight: 600; text-align: left;",
        CellTone::Text => "text-align: left;",
        CellTone::Numeric => "text-align: right; font-variant-numeric: tabular-nums;",
        CellTone::Positive => {
            "text-align: right; font-variant-numeric: tabular-nums; color: #059669;"
        }
        CellTone::Negative => {
            "text-align: right; font-variant-numeric: tabular-nums; color: #dc2626;"
        }
    }
}
