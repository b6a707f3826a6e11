use std::collections::BTreeMap;

use thiserror::Error;

pub const MIN_COLUMN_WIDTH: u32 = 80;
pub const MAX_COLUMN_WIDTH: u32 = 600;
pub const DEFAULT_PER_PAGE: usize = 10;
pub const PER_PAGE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

pub const DEFAULT_VISIBLE_COLUMNS: [&str; 11] = [
    "Fund",
    "Amc",
    "Product",
    "Aum",
    "Returns 1 Yr",
    "Returns 3 Yr",
    "Returns 5 Yr",
    "Sharpe Ratio 1 Yr",
    "Sharpe Ratio 3 Yr",
    "Alpha 1 Yr",
    "Alpha 3 Yr",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("Please select at least one column to display")]
    EmptyColumnSelection,
    #[error("rows per page must be greater than zero")]
    InvalidPageSize,
    #[error("unknown column: {0}")]
    UnknownColumn(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

/// Session-only pixel widths set by dragging a header's resize handle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnWidths {
    widths: BTreeMap<String, u32>,
}

impl ColumnWidths {
    pub fn get(&self, column: &str) -> Option<u32> {
        self.widths.get(column).copied()
    }

    /// Width after dragging `delta` pixels from `start_width`, clamped to
    /// [`MIN_COLUMN_WIDTH`, `MAX_COLUMN_WIDTH`].
    pub fn resize(&mut self, column: &str, start_width: f64, delta: f64) -> u32 {
        let width = (start_width + delta)
            .round()
            .clamp(MIN_COLUMN_WIDTH as f64, MAX_COLUMN_WIDTH as f64) as u32;
        self.widths.insert(column.to_string(), width);
        width
    }
}

/// Everything the user can change about the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub visible_columns: Vec<String>,
    pub column_filters: BTreeMap<String, String>,
    pub global_search: Option<String>,
    pub sort: Option<SortSpec>,
    pub current_page: usize,
    pub per_page: usize,
    pub column_widths: ColumnWidths,
}

impl ViewState {
    pub fn new(visible_columns: Vec<String>, per_page: usize) -> Self {
        Self {
            visible_columns,
            column_filters: BTreeMap::new(),
            global_search: None,
            sort: None,
            current_page: 1,
            per_page: per_page.max(1),
            column_widths: ColumnWidths::default(),
        }
    }

    /// Default column set intersected with what the server actually sent.
    pub fn default_for(columns: &[String], per_page: usize) -> Self {
        let mut visible = DEFAULT_VISIBLE_COLUMNS
            .iter()
            .filter(|name| columns.iter().any(|col| col == *name))
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        if visible.is_empty() {
            visible = columns.to_vec();
        }
        Self::new(visible, per_page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationControls {
    pub first_enabled: bool,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub last_enabled: bool,
}

/// Output of one pipeline run. `rows` holds dataset indices in display order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableView {
    pub rows: Vec<usize>,
    pub total_records: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub per_page: usize,
}

impl TableView {
    pub fn page_range(&self) -> std::ops::Range<usize> {
        let start = (self.current_page.saturating_sub(1) * self.per_page).min(self.total_records);
        let end = (self.current_page * self.per_page).min(self.total_records);
        start..end
    }

    pub fn page_rows(&self) -> &[usize] {
        &self.rows[self.page_range()]
    }

    pub fn controls(&self) -> PaginationControls {
        let on_first = self.current_page <= 1;
        let on_last = self.current_page >= self.total_pages;
        PaginationControls {
            first_enabled: !on_first,
            prev_enabled: !on_first,
            next_enabled: !on_last,
            last_enabled: !on_last,
        }
    }

    pub fn records_summary(&self) -> String {
        format!("Total: {} funds", self.total_records)
    }

    pub fn range_summary(&self) -> String {
        let range = self.page_range();
        if range.is_empty() {
            return format!("Showing 0-0 of {}", self.total_records);
        }
        format!(
            "Showing {}-{} of {}",
            range.start + 1,
            range.end,
            self.total_records
        )
    }
}
