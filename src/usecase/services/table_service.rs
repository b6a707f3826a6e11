use std::cmp::Ordering;
use std::sync::Arc;

use crate::domain::entities::dataset::{CellValue, Dataset, FundRecord};
use crate::domain::entities::view::{SortDirection, SortSpec, TableView, ViewError, ViewState};

const PAGE_WINDOW: usize = 5;

/// Runs filter, search, sort and pagination over the full dataset.
///
/// Column filters and the global search compose: a row is kept only when it
/// satisfies every active column filter *and* the search term. The view's
/// page cursor is clamped into the result, the input state is not touched.
pub fn apply_view(dataset: &Dataset, view: &ViewState) -> TableView {
    let filters = view
        .column_filters
        .iter()
        .filter(|(_, term)| !term.is_empty())
        .map(|(column, term)| (column.as_str(), term.to_lowercase()))
        .collect::<Vec<_>>();
    let search = view
        .global_search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase);

    let mut rows = dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| matches_column_filters(record, &filters))
        .filter(|(_, record)| match &search {
            Some(term) => matches_search(record, &view.visible_columns, term),
            None => true,
        })
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();

    if let Some(sort) = &view.sort {
        sort_rows(dataset, &mut rows, sort);
    }

    let per_page = view.per_page.max(1);
    let total_records = rows.len();
    let total_pages = total_records.div_ceil(per_page).max(1);
    let current_page = view.current_page.clamp(1, total_pages);

    TableView {
        rows,
        total_records,
        total_pages,
        current_page,
        per_page,
    }
}

fn matches_column_filters(record: &FundRecord, filters: &[(&str, String)]) -> bool {
    filters.iter().all(|(column, term)| {
        let cell = record.get(column);
        !cell.is_missing() && cell.to_text().to_lowercase().contains(term.as_str())
    })
}

fn matches_search(record: &FundRecord, visible_columns: &[String], term: &str) -> bool {
    visible_columns
        .iter()
        .any(|column| record.get(column).to_text().to_lowercase().contains(term))
}

struct SortKey {
    missing: bool,
    number: Option<f64>,
    folded: String,
    raw: String,
}

impl SortKey {
    fn from_cell(cell: &CellValue) -> Self {
        let raw = cell.to_text();
        Self {
            missing: cell.is_missing(),
            number: cell.as_number(),
            folded: raw.to_lowercase(),
            raw,
        }
    }
}

fn sort_rows(dataset: &Dataset, rows: &mut Vec<usize>, sort: &SortSpec) {
    let mut keyed = rows
        .iter()
        .map(|&idx| {
            let key = dataset
                .record(idx)
                .map(|record| SortKey::from_cell(record.get(&sort.column)))
                .unwrap_or_else(|| SortKey::from_cell(&CellValue::Missing));
            (idx, key)
        })
        .collect::<Vec<_>>();

    // `sort_by` is stable, so equal keys keep their filtered order.
    keyed.sort_by(|(_, left), (_, right)| compare_keys(left, right, sort.direction));
    *rows = keyed.into_iter().map(|(idx, _)| idx).collect();
}

fn compare_keys(left: &SortKey, right: &SortKey, direction: SortDirection) -> Ordering {
    match (left.missing, right.missing) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    // Numbers rank ahead of text so the ordering stays total on mixed columns.
    let ordering = match (left.number, right.number) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left
            .folded
            .cmp(&right.folded)
            .then_with(|| left.raw.cmp(&right.raw)),
    };

    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Text ordering used when either side is not numeric: case-folded first,
/// exact bytes as the tiebreak.
pub fn compare_text(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}

/// Page numbers shown in the pagination strip, at most five, sliding with
/// the current page and pinned at either end.
pub fn page_window(current_page: usize, total_pages: usize) -> Vec<usize> {
    let total_pages = total_pages.max(1);
    let current_page = current_page.clamp(1, total_pages);

    if total_pages <= PAGE_WINDOW {
        return (1..=total_pages).collect();
    }
    if current_page <= 3 {
        return (1..=PAGE_WINDOW).collect();
    }
    if current_page >= total_pages - 2 {
        return (total_pages - PAGE_WINDOW + 1..=total_pages).collect();
    }
    (current_page - 2..=current_page + 2).collect()
}

/// Owns the loaded dataset together with the table's view state and keeps the
/// derived [`TableView`] in sync after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct TableService {
    dataset: Arc<Dataset>,
    view: ViewState,
    table: TableView,
}

impl TableService {
    pub fn new(dataset: Arc<Dataset>, per_page: usize) -> Self {
        let view = ViewState::default_for(dataset.columns(), per_page);
        Self::with_view(dataset, view)
    }

    pub fn with_view(dataset: Arc<Dataset>, view: ViewState) -> Self {
        let mut service = Self {
            dataset,
            view,
            table: TableView::default(),
        };
        service.refresh();
        service
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn table(&self) -> &TableView {
        &self.table
    }

    /// Records on the current page, in display order.
    pub fn page_records(&self) -> Vec<&FundRecord> {
        self.table
            .page_rows()
            .iter()
            .filter_map(|&idx| self.dataset.record(idx))
            .collect()
    }

    /// Every filtered record, in display order.
    pub fn filtered_records(&self) -> Vec<&FundRecord> {
        self.table
            .rows
            .iter()
            .filter_map(|&idx| self.dataset.record(idx))
            .collect()
    }

    pub fn page_numbers(&self) -> Vec<usize> {
        page_window(self.table.current_page, self.table.total_pages)
    }

    fn refresh(&mut self) {
        self.table = apply_view(&self.dataset, &self.view);
        self.view.current_page = self.table.current_page;
        tracing::debug!(
            total = self.table.total_records,
            page = self.table.current_page,
            pages = self.table.total_pages,
            "table view recomputed"
        );
    }

    fn ensure_column(&self, column: &str) -> Result<(), ViewError> {
        if self.dataset.has_column(column) {
            Ok(())
        } else {
            Err(ViewError::UnknownColumn(column.to_string()))
        }
    }

    /// A blank value removes the column's filter.
    pub fn set_column_filter(&mut self, column: &str, value: &str) -> Result<(), ViewError> {
        self.ensure_column(column)?;
        let value = value.trim();
        if value.is_empty() {
            self.view.column_filters.remove(column);
        } else {
            self.view
                .column_filters
                .insert(column.to_string(), value.to_string());
        }
        self.view.current_page = 1;
        self.refresh();
        Ok(())
    }

    pub fn set_global_search(&mut self, term: &str) {
        let term = term.trim();
        self.view.global_search = (!term.is_empty()).then(|| term.to_string());
        self.view.current_page = 1;
        self.refresh();
    }

    pub fn clear_filters(&mut self) {
        self.view.column_filters.clear();
        self.view.global_search = None;
        self.view.current_page = 1;
        self.refresh();
    }

    /// Clicking the active column flips direction, any other column starts
    /// ascending.
    pub fn toggle_sort(&mut self, column: &str) -> Result<(), ViewError> {
        self.ensure_column(column)?;
        let direction = match &self.view.sort {
            Some(sort) if sort.column == column => sort.direction.toggled(),
            _ => SortDirection::Asc,
        };
        self.view.sort = Some(SortSpec {
            column: column.to_string(),
            direction,
        });
        self.refresh();
        Ok(())
    }

    pub fn set_per_page(&mut self, per_page: usize) -> Result<(), ViewError> {
        if per_page == 0 {
            return Err(ViewError::InvalidPageSize);
        }
        self.view.per_page = per_page;
        self.view.current_page = 1;
        self.refresh();
        Ok(())
    }

    /// Returns whether the page changed. Out-of-range targets and the current
    /// page are ignored.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page < 1 || page > self.table.total_pages || page == self.table.current_page {
            return false;
        }
        self.view.current_page = page;
        self.table.current_page = page;
        true
    }

    pub fn first_page(&mut self) -> bool {
        self.go_to_page(1)
    }

    pub fn prev_page(&mut self) -> bool {
        self.go_to_page(self.table.current_page.saturating_sub(1))
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.table.current_page + 1)
    }

    pub fn last_page(&mut self) -> bool {
        self.go_to_page(self.table.total_pages)
    }

    /// Unknown names are dropped. An empty result is rejected and the previous
    /// selection kept.
    pub fn set_visible_columns(&mut self, columns: &[String]) -> Result<(), ViewError> {
        let next = columns
            .iter()
            .filter(|column| self.dataset.has_column(column))
            .cloned()
            .collect::<Vec<_>>();
        if next.is_empty() {
            return Err(ViewError::EmptyColumnSelection);
        }
        self.view.visible_columns = next;
        self.refresh();
        Ok(())
    }

    pub fn resize_column(
        &mut self,
        column: &str,
        start_width: f64,
        delta: f64,
    ) -> Result<u32, ViewError> {
        self.ensure_column(column)?;
        Ok(self
            .view
            .column_widths
            .resize(column, start_width, delta))
    }
}
