use std::time::{Duration, Instant};

use dioxus::prelude::*;
use rfd::FileDialog;

use crate::config::AppConfig;
use crate::default_export_dir;
use crate::domain::entities::view::{SortDirection, PER_PAGE_OPTIONS};
use crate::platform::desktop::debounce::Debouncer;
use crate::ui::state::app_state::{
    discard_filter_drafts, show_warning, AppState, FilterTarget, LoadState, ResizeDrag,
};
use crate::usecase::services::cell_format::{cell_style, cell_tone, format_cell_value};
use crate::usecase::services::export_service::{export_csv, today_export_file_name, write_export};

const DEFAULT_COLUMN_WIDTH: u32 = 150;

const BUTTON_STYLE: &str =
    "border: 1px solid #bbb; background: #fff; padding: 4px 10px; border-radius: 6px; cursor: pointer;";
const ACTIVE_PAGE_STYLE: &str =
    "border: 1px solid #2563eb; background: #2563eb; color: #fff; padding: 4px 10px; border-radius: 6px;";

fn page_button_style(active: bool) -> &'static str {
    if active {
        ACTIVE_PAGE_STYLE
    } else {
        BUTTON_STYLE
    }
}

/// Restarts the quiet window for `target`; only the last value typed before
/// the window elapses reaches the table.
fn schedule_filter(state: AppState, window: Duration, target: FilterTarget, value: String) {
    let AppState {
        mut filter_inputs,
        mut filter_debounce,
        ..
    } = state;
    filter_inputs.write().insert(target.clone(), value.clone());
    filter_debounce
        .write()
        .entry(target.clone())
        .or_insert_with(|| Debouncer::new(window))
        .schedule(value, Instant::now());

    spawn(async move {
        tokio::time::sleep(window).await;
        let ready = filter_debounce
            .write()
            .get_mut(&target)
            .and_then(|debouncer| debouncer.take_ready(Instant::now()));
        if let Some(value) = ready {
            commit_filter(state, &target, &value);
        }
    });
}

fn commit_filter(state: AppState, target: &FilterTarget, value: &str) {
    let AppState {
        mut table,
        mut status,
        ..
    } = state;
    let mut guard = table.write();
    let Some(service) = guard.as_mut() else {
        return;
    };
    let result = match target {
        FilterTarget::Global => {
            service.set_global_search(value);
            Ok(())
        }
        FilterTarget::Column(column) => service.set_column_filter(column, value),
    };
    match result {
        Ok(()) => *status.write() = service.table().records_summary(),
        Err(err) => *status.write() = err.to_string(),
    }
}

fn export_visible(state: AppState) {
    let AppState {
        table, mut status, ..
    } = state;
    let built = {
        let guard = table.read();
        let Some(service) = guard.as_ref() else {
            return;
        };
        let records = service.filtered_records();
        let count = records.len();
        export_csv(&service.view().visible_columns, records).map(|bytes| (bytes, count))
    };

    let (bytes, count) = match built {
        Ok(built) => built,
        Err(err) => {
            tracing::error!(error = %err, "csv export failed");
            show_warning("Failed to export data");
            *status.write() = format!("Export failed: {err}");
            return;
        }
    };

    let mut dialog = FileDialog::new()
        .add_filter("CSV", &["csv"])
        .set_file_name(today_export_file_name());
    if let Some(dir) = default_export_dir() {
        dialog = dialog.set_directory(dir);
    }
    let Some(path) = dialog.save_file() else {
        return;
    };

    match write_export(&path, &bytes) {
        Ok(()) => {
            *status.write() = format!("Exported {count} funds to {}", path.display());
        }
        Err(err) => {
            tracing::error!(error = %err, "csv export failed");
            show_warning("Failed to export data");
            *status.write() = format!("Export failed: {err}");
        }
    }
}

fn apply_column_selection(state: AppState) {
    let AppState {
        mut table,
        mut status,
        mut show_column_picker,
        column_draft,
        ..
    } = state;
    let draft = column_draft();
    let mut guard = table.write();
    let Some(service) = guard.as_mut() else {
        return;
    };

    // Keep the current order for columns that stay, append new ones.
    let mut next = service
        .view()
        .visible_columns
        .iter()
        .filter(|column| draft.contains(*column))
        .cloned()
        .collect::<Vec<_>>();
    for column in &draft {
        if !next.contains(column) {
            next.push(column.clone());
        }
    }

    match service.set_visible_columns(&next) {
        Ok(()) => {
            show_column_picker.set(false);
            *status.write() = service.table().records_summary();
        }
        Err(err) => show_warning(&err.to_string()),
    }
}

#[component]
pub fn FundTable() -> Element {
    let config = use_context::<AppConfig>();
    let state = use_context::<AppState>();
    let AppState {
        load_state,
        mut table,
        mut status,
        mut show_column_picker,
        mut column_draft,
        mut filter_inputs,
        mut filter_debounce,
        mut resize_drag,
        ..
    } = state;
    let window = config.debounce;

    if let LoadState::Failed(message) = load_state() {
        return rsx! {
            table { style: "border-collapse: collapse; width: 100%;",
                tbody {
                    tr {
                        td {
                            colspan: "100",
                            style: "text-align: center; padding: 40px; color: #dc2626;",
                            "❌ {message}"
                        }
                    }
                }
            }
        };
    }

    let guard = table.read();
    let Some(service) = guard.as_ref() else {
        return rsx! {
            div { style: "padding: 40px; text-align: center; color: #666;", "Loading..." }
        };
    };

    let view = service.view().clone();
    let page = service.table().clone();
    let controls = page.controls();
    let page_numbers = service.page_numbers();
    let range_summary = page.range_summary();
    let records_summary = page.records_summary();
    let mut picker_columns = service.dataset().columns().to_vec();
    picker_columns.sort();
    let columns = view.visible_columns.clone();
    let widths = columns
        .iter()
        .map(|column| view.column_widths.get(column).unwrap_or(DEFAULT_COLUMN_WIDTH))
        .collect::<Vec<_>>();
    let rows = service
        .page_records()
        .into_iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| {
                    let value = record.get(column);
                    (
                        format_cell_value(column, value),
                        cell_style(cell_tone(column, value)),
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    drop(guard);

    let inputs = filter_inputs();
    let global_value = inputs
        .get(&FilterTarget::Global)
        .cloned()
        .or_else(|| view.global_search.clone())
        .unwrap_or_default();
    let column_count = columns.len().max(1);
    let draft = column_draft();

    rsx! {
        div {
            onmousemove: move |event| {
                let Some(drag) = resize_drag() else {
                    return;
                };
                let delta = event.client_coordinates().x - drag.start_x;
                if let Some(service) = table.write().as_mut() {
                    if let Err(err) = service.resize_column(&drag.column, drag.start_width, delta) {
                        *status.write() = err.to_string();
                    }
                }
            },
            onmouseup: move |_| resize_drag.set(None),
            onmouseleave: move |_| resize_drag.set(None),

            div { style: "display: flex; flex-wrap: wrap; align-items: center; gap: 8px; margin-bottom: 12px;",
                input {
                    style: "padding: 4px 8px; min-width: 240px;",
                    placeholder: "Search all visible columns...",
                    value: "{global_value}",
                    oninput: move |event| {
                        schedule_filter(state, window, FilterTarget::Global, event.value());
                    },
                }
                span { "Rows per page" }
                select {
                    value: "{view.per_page}",
                    onchange: move |event| {
                        let Ok(per_page) = event.value().parse::<usize>() else {
                            return;
                        };
                        if let Some(service) = table.write().as_mut() {
                            if let Err(err) = service.set_per_page(per_page) {
                                show_warning(&err.to_string());
                            }
                        }
                    },
                    for size in PER_PAGE_OPTIONS {
                        option { value: "{size}", selected: size == view.per_page, "{size}" }
                    }
                }
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| {
                        if !show_column_picker() {
                            let current = table
                                .read()
                                .as_ref()
                                .map(|service| service.view().visible_columns.iter().cloned().collect())
                                .unwrap_or_default();
                            column_draft.set(current);
                        }
                        show_column_picker.set(!show_column_picker());
                    },
                    "Columns"
                }
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| {
                        discard_filter_drafts(
                            &mut filter_inputs.write(),
                            &mut filter_debounce.write(),
                        );
                        if let Some(service) = table.write().as_mut() {
                            service.clear_filters();
                            *status.write() = service.table().records_summary();
                        }
                    },
                    "Clear Filters"
                }
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| export_visible(state),
                    "Export CSV"
                }
                span { style: "margin-left: auto; color: #555;", "{records_summary}" }
            }

            if show_column_picker() {
                div { style: "border: 1px solid #ddd; border-radius: 6px; padding: 8px; margin-bottom: 12px;",
                    div { style: "display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 4px; max-height: 220px; overflow: auto;",
                        for column in picker_columns {
                            {
                                let checked = draft.contains(&column);
                                let toggle_column = column.clone();
                                rsx! {
                                    label { key: "{column}", style: "display: flex; align-items: center; gap: 6px;",
                                        input {
                                            r#type: "checkbox",
                                            checked: checked,
                                            onclick: move |_| {
                                                let mut next = column_draft();
                                                if !next.remove(&toggle_column) {
                                                    next.insert(toggle_column.clone());
                                                }
                                                column_draft.set(next);
                                            },
                                        }
                                        span { "{column}" }
                                    }
                                }
                            }
                        }
                    }
                    div { style: "display: flex; justify-content: flex-end; gap: 8px; margin-top: 8px;",
                        button {
                            style: BUTTON_STYLE,
                            onclick: move |_| show_column_picker.set(false),
                            "Cancel"
                        }
                        button {
                            style: BUTTON_STYLE,
                            onclick: move |_| apply_column_selection(state),
                            "Apply"
                        }
                    }
                }
            }

            div { style: "overflow: auto; border: 1px solid #ddd;",
                table { style: "border-collapse: collapse; table-layout: fixed;",
                    thead { style: "position: sticky; top: 0; background: #f8fafc; z-index: 1;",
                        tr {
                            for (column, width) in columns.iter().cloned().zip(widths.iter().copied()) {
                                {
                                    let indicator = match &view.sort {
                                        Some(sort) if sort.column == column => match sort.direction {
                                            SortDirection::Asc => " ▲",
                                            SortDirection::Desc => " ▼",
                                        },
                                        _ => "",
                                    };
                                    let sort_column = column.clone();
                                    let resize_column = column.clone();
                                    rsx! {
                                        th {
                                            key: "{column}",
                                            style: "position: relative; width: {width}px; max-width: {width}px; padding: 6px 14px 6px 8px; border-bottom: 1px solid #ddd; text-align: left; white-space: nowrap; overflow: hidden; text-overflow: ellipsis;",
                                            span {
                                                style: "cursor: pointer;",
                                                onclick: move |_| {
                                                    if let Some(service) = table.write().as_mut() {
                                                        if let Err(err) = service.toggle_sort(&sort_column) {
                                                            *status.write() = err.to_string();
                                                        }
                                                    }
                                                },
                                                "{column}{indicator}"
                                            }
                                            div {
                                                style: "position: absolute; top: 0; right: 0; width: 6px; height: 100%; cursor: col-resize;",
                                                onmousedown: move |event| {
                                                    event.stop_propagation();
                                                    resize_drag.set(Some(ResizeDrag {
                                                        column: resize_column.clone(),
                                                        start_x: event.client_coordinates().x,
                                                        start_width: width as f64,
                                                    }));
                                                },
                                            }
                                        }
                                    }
                                }
                            }
                        }
                        tr {
                            for (column, width) in columns.iter().cloned().zip(widths.iter().copied()) {
                                {
                                    let target = FilterTarget::Column(column.clone());
                                    let value = inputs
                                        .get(&target)
                                        .cloned()
                                        .or_else(|| view.column_filters.get(&column).cloned())
                                        .unwrap_or_default();
                                    rsx! {
                                        th { key: "filter-{column}", style: "width: {width}px; max-width: {width}px; padding: 4px;",
                                            input {
                                                style: "width: 100%; box-sizing: border-box;",
                                                placeholder: "Filter...",
                                                value: "{value}",
                                                oninput: move |event| {
                                                    schedule_filter(state, window, target.clone(), event.value());
                                                },
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                    tbody {
                        if rows.is_empty() {
                            tr {
                                td {
                                    colspan: "{column_count}",
                                    style: "text-align: center; padding: 16px; color: #666;",
                                    "No data"
                                }
                            }
                        }
                        for (row_idx, row) in rows.into_iter().enumerate() {
                            tr { key: "{row_idx}", style: "border-bottom: 1px solid #eee;",
                                for ((text, style), width) in row.into_iter().zip(widths.iter().copied()) {
                                    td {
                                        style: "{style} width: {width}px; max-width: {width}px; padding: 6px 8px; white-space: nowrap; overflow: hidden; text-overflow: ellipsis;",
                                        "{text}"
                                    }
                                }
                            }
                        }
                    }
                }
            }

            div { style: "display: flex; align-items: center; gap: 6px; margin-top: 12px;",
                span { style: "margin-right: auto; color: #555;", "{range_summary}" }
                button {
                    style: BUTTON_STYLE,
                    disabled: !controls.first_enabled,
                    onclick: move |_| {
                        if let Some(service) = table.write().as_mut() {
                            service.first_page();
                        }
                    },
                    "First"
                }
                button {
                    style: BUTTON_STYLE,
                    disabled: !controls.prev_enabled,
                    onclick: move |_| {
                        if let Some(service) = table.write().as_mut() {
                            service.prev_page();
                        }
                    },
                    "Prev"
                }
                for number in page_numbers {
                    button {
                        key: "page-{number}",
                        style: page_button_style(number == page.current_page),
                        onclick: move |_| {
                            if let Some(service) = table.write().as_mut() {
                                service.go_to_page(number);
                            }
                        },
                        "{number}"
                    }
                }
                button {
                    style: BUTTON_STYLE,
                    disabled: !controls.next_enabled,
                    onclick: move |_| {
                        if let Some(service) = table.write().as_mut() {
                            service.next_page();
                        }
                    },
                    "Next"
                }
                button {
                    style: BUTTON_STYLE,
                    disabled: !controls.last_enabled,
                    onclick: move |_| {
                        if let Some(service) = table.write().as_mut() {
                            service.last_page();
                        }
                    },
                    "Last"
                }
            }
        }
    }
}
