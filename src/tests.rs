use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use crate::config::{resolve_api_base, AppConfig};
use crate::domain::entities::chart::{
    Bounds, ChartError, Horizon, Metric, Selection, Viewport,
};
use crate::domain::entities::dataset::{parse_number, CellValue, Dataset, FundRecord};
use crate::domain::entities::view::{SortDirection, SortSpec, ViewError, ViewState};
use crate::infra::http::fund_api::HttpFundSource;
use crate::platform::desktop::debounce::Debouncer;
use crate::ui::state::app_state::{discard_filter_drafts, FilterTarget};
use crate::usecase::ports::fund_source::{cancel_pair, FundSource, LoadError};
use crate::usecase::services::cell_format::{cell_tone, format_cell_value, CellTone};
use crate::usecase::services::chart_service::{
    build_chart, derive_series, display_name, fund_choices, growth_value, headline, month_label,
    palette_color, selection_status, tooltip_at, x_tick_label, x_ticks, SelectionTone,
};
use crate::usecase::services::export_service::{export_csv, export_file_name, write_export};
use crate::usecase::services::table_service::{apply_view, page_window, TableService};
use crate::*;

const COLUMNS: [&str; 8] = [
    "Fund",
    "Amc",
    "Returns 1 Yr",
    "Returns 3 Yr",
    "Returns 5 Yr",
    "Sharpe Ratio 3 Yr",
    "Std 3 Yr",
    "Alpha 3 Yr",
];

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("fund-screener-{prefix}-{nanos}"))
}

fn columns() -> Vec<String> {
    COLUMNS.iter().map(|column| column.to_string()).collect()
}

fn fund(name: &str, amc: &str, returns_3y: Option<f64>) -> FundRecord {
    let mut cells = vec![
        ("Fund", CellValue::from(name)),
        ("Amc", CellValue::from(amc)),
        ("Sharpe Ratio 3 Yr", CellValue::from(1.2)),
        ("Std 3 Yr", CellValue::from(14.0)),
        ("Alpha 3 Yr", CellValue::from(-0.5)),
    ];
    if let Some(value) = returns_3y {
        cells.push(("Returns 3 Yr", CellValue::from(value)));
    }
    cells.into_iter().collect()
}

fn dataset(records: Vec<FundRecord>) -> Dataset {
    Dataset::new(columns(), records)
}

fn numbered_dataset(count: usize) -> Dataset {
    dataset(
        (0..count)
            .map(|idx| fund(&format!("Fund {idx:02}"), "Some AMC", Some(idx as f64)))
            .collect(),
    )
}

fn view_for(dataset: &Dataset) -> ViewState {
    ViewState::default_for(dataset.columns(), 10)
}

fn names(dataset: &Dataset, rows: &[usize]) -> Vec<String> {
    rows.iter()
        .map(|&idx| dataset.record(idx).expect("row should exist").name())
        .collect()
}

fn selection(count: usize, metric: Metric, horizon: Horizon) -> Selection {
    Selection {
        funds: (0..count)
            .map(|idx| fund(&format!("Fund {idx}"), "AMC", Some(8.5)))
            .collect(),
        horizon,
        metric,
    }
}

#[test]
fn parse_number_reads_leading_numeric_prefix() {
    assert_eq!(parse_number("8.5%"), Some(8.5));
    assert_eq!(parse_number("  42"), Some(42.0));
    assert_eq!(parse_number("-1e3x"), Some(-1000.0));
    assert_eq!(parse_number(".5"), Some(0.5));
    assert_eq!(parse_number("1e"), Some(1.0));
    assert_eq!(parse_number("abc"), None);
    assert_eq!(parse_number("-"), None);
    assert_eq!(parse_number(""), None);
}

#[test]
fn cell_value_from_json_keeps_numbers_and_nulls() {
    assert_eq!(CellValue::from_json(&json!(10)), CellValue::Number(10.0));
    assert_eq!(CellValue::from_json(&json!(null)), CellValue::Missing);
    assert_eq!(
        CellValue::from_json(&json!("HDFC")),
        CellValue::Text("HDFC".to_string())
    );
    assert_eq!(CellValue::Number(10.0).to_text(), "10");
    assert_eq!(CellValue::Number(8.25).to_text(), "8.25");
}

#[test]
fn dataset_normalizes_records_to_declared_columns() {
    let mut row = serde_json::Map::new();
    row.insert("Fund".to_string(), json!("Alpha Fund"));
    row.insert("Extra".to_string(), json!("dropped"));
    let dataset = Dataset::from_json_rows(vec!["Fund".to_string(), "Amc".to_string()], vec![row]);

    let record = dataset.record(0).expect("record should exist");
    assert_eq!(record.name(), "Alpha Fund");
    assert!(record.get("Amc").is_missing());
    assert!(record.get("Extra").is_missing());
    assert!(!dataset.has_column("Extra"));
}

#[test]
fn apply_view_clamps_page_into_range() {
    let dataset = numbered_dataset(23);
    let mut view = view_for(&dataset);
    view.current_page = 99;

    let table = apply_view(&dataset, &view);

    assert_eq!(table.total_records, 23);
    assert_eq!(table.total_pages, 3);
    assert_eq!(table.current_page, 3);
    assert_eq!(table.page_rows().len(), 3);
    assert_eq!(table.range_summary(), "Showing 21-23 of 23");
    assert_eq!(table.records_summary(), "Total: 23 funds");
}

#[test]
fn apply_view_with_no_matches_reports_single_empty_page() {
    let dataset = numbered_dataset(5);
    let mut view = view_for(&dataset);
    view.column_filters
        .insert("Fund".to_string(), "nothing like this".to_string());

    let table = apply_view(&dataset, &view);
    let controls = table.controls();

    assert_eq!(table.total_records, 0);
    assert_eq!(table.total_pages, 1);
    assert_eq!(table.current_page, 1);
    assert_eq!(table.range_summary(), "Showing 0-0 of 0");
    assert!(!controls.first_enabled && !controls.prev_enabled);
    assert!(!controls.next_enabled && !controls.last_enabled);
}

#[test]
fn apply_view_is_idempotent_for_same_state() {
    let dataset = numbered_dataset(17);
    let mut view = view_for(&dataset);
    view.column_filters.insert("Fund".to_string(), "1".to_string());
    view.sort = Some(SortSpec {
        column: "Returns 3 Yr".to_string(),
        direction: SortDirection::Desc,
    });

    assert_eq!(apply_view(&dataset, &view), apply_view(&dataset, &view));
}

#[test]
fn column_filter_and_global_search_both_apply() {
    let dataset = dataset(vec![
        fund("HDFC Growth Fund", "HDFC Mutual Fund", Some(10.0)),
        fund("HDFC Income Fund", "HDFC Mutual Fund", Some(7.0)),
        fund("SBI Growth Fund", "SBI Mutual Fund", Some(9.0)),
    ]);
    let mut view = view_for(&dataset);
    view.column_filters.insert("Amc".to_string(), "hdfc".to_string());
    view.global_search = Some("growth".to_string());

    let table = apply_view(&dataset, &view);

    assert_eq!(names(&dataset, &table.rows), vec!["HDFC Growth Fund"]);
}

#[test]
fn column_filter_never_matches_missing_cells() {
    let dataset = dataset(vec![
        fund("With Returns", "AMC", Some(12.0)),
        fund("Without Returns", "AMC", None),
    ]);
    let mut view = view_for(&dataset);
    view.column_filters
        .insert("Returns 3 Yr".to_string(), "1".to_string());

    let table = apply_view(&dataset, &view);

    assert_eq!(names(&dataset, &table.rows), vec!["With Returns"]);
}

#[test]
fn global_search_only_looks_at_visible_columns() {
    let dataset = dataset(vec![fund("Bluechip Fund", "Quant Mutual Fund", Some(1.0))]);
    let mut view = view_for(&dataset);
    view.global_search = Some("quant".to_string());
    assert_eq!(apply_view(&dataset, &view).total_records, 1);

    view.visible_columns = vec!["Fund".to_string()];
    assert_eq!(apply_view(&dataset, &view).total_records, 0);
}

#[test]
fn sort_puts_missing_values_last_in_both_directions() {
    let dataset = dataset(vec![
        fund("Five", "AMC", Some(5.0)),
        fund("Missing", "AMC", None),
        fund("Ten", "AMC", Some(10.0)),
        fund("One", "AMC", Some(1.0)),
    ]);
    let mut view = view_for(&dataset);

    view.sort = Some(SortSpec {
        column: "Returns 3 Yr".to_string(),
        direction: SortDirection::Asc,
    });
    let ascending = apply_view(&dataset, &view);
    assert_eq!(
        names(&dataset, &ascending.rows),
        vec!["One", "Five", "Ten", "Missing"]
    );

    view.sort = Some(SortSpec {
        column: "Returns 3 Yr".to_string(),
        direction: SortDirection::Desc,
    });
    let descending = apply_view(&dataset, &view);
    assert_eq!(
        names(&dataset, &descending.rows),
        vec!["Ten", "Five", "One", "Missing"]
    );
}

#[test]
fn sort_is_stable_for_equal_keys() {
    let dataset = dataset(vec![
        fund("First", "Same AMC", Some(1.0)),
        fund("Second", "Same AMC", Some(2.0)),
        fund("Third", "Same AMC", Some(3.0)),
    ]);
    let mut view = view_for(&dataset);
    view.sort = Some(SortSpec {
        column: "Amc".to_string(),
        direction: SortDirection::Desc,
    });

    let table = apply_view(&dataset, &view);

    assert_eq!(names(&dataset, &table.rows), vec!["First", "Second", "Third"]);
}

#[test]
fn mixed_column_sort_ranks_numbers_before_text() {
    let dataset = dataset(vec![
        fund("apple", "apple", None),
        fund("10", "10", None),
        fund("Banana", "Banana", None),
        [("Fund", "Blank")].into_iter().collect(),
        fund("8.5%", "8.5%", None),
    ]);
    let mut view = view_for(&dataset);
    view.sort = Some(SortSpec {
        column: "Amc".to_string(),
        direction: SortDirection::Asc,
    });

    let ascending = names(&dataset, &apply_view(&dataset, &view).rows);
    assert_eq!(ascending, vec!["8.5%", "10", "apple", "Banana", "Blank"]);

    view.sort = Some(SortSpec {
        column: "Amc".to_string(),
        direction: SortDirection::Desc,
    });
    let descending = names(&dataset, &apply_view(&dataset, &view).rows);
    assert_eq!(descending, vec!["Banana", "apple", "10", "8.5%", "Blank"]);
}

#[test]
fn page_window_slides_and_pins_at_edges() {
    assert_eq!(page_window(1, 3), vec![1, 2, 3]);
    assert_eq!(page_window(1, 10), vec![1, 2, 3, 4, 5]);
    assert_eq!(page_window(5, 10), vec![3, 4, 5, 6, 7]);
    assert_eq!(page_window(10, 10), vec![6, 7, 8, 9, 10]);
    assert_eq!(page_window(9, 10), vec![6, 7, 8, 9, 10]);
}

#[test]
fn table_service_toggles_sort_direction_on_same_column() {
    let mut service = TableService::new(Arc::new(numbered_dataset(3)), 10);

    service
        .toggle_sort("Returns 3 Yr")
        .expect("sort should apply");
    assert_eq!(
        service.view().sort.as_ref().map(|sort| sort.direction),
        Some(SortDirection::Asc)
    );

    service
        .toggle_sort("Returns 3 Yr")
        .expect("sort should apply");
    assert_eq!(
        service.view().sort.as_ref().map(|sort| sort.direction),
        Some(SortDirection::Desc)
    );
    assert_eq!(
        service.page_records()[0].name(),
        "Fund 02",
        "highest return should lead"
    );

    assert_eq!(
        service.toggle_sort("No Such Column"),
        Err(ViewError::UnknownColumn("No Such Column".to_string()))
    );
}

#[test]
fn table_service_filter_change_returns_to_first_page() {
    let mut service = TableService::new(Arc::new(numbered_dataset(23)), 10);
    assert!(service.go_to_page(3));
    assert!(!service.next_page(), "last page has no next");
    assert!(!service.go_to_page(0));

    service
        .set_column_filter("Amc", "some")
        .expect("filter should apply");

    assert_eq!(service.table().current_page, 1);
    assert_eq!(service.table().total_records, 23);
    assert_eq!(service.page_numbers(), vec![1, 2, 3]);
}

#[test]
fn table_service_rejects_empty_column_selection() {
    let mut service = TableService::new(Arc::new(numbered_dataset(2)), 10);
    let before = service.view().visible_columns.clone();

    let result = service.set_visible_columns(&["Unknown".to_string()]);

    assert_eq!(result, Err(ViewError::EmptyColumnSelection));
    assert_eq!(service.view().visible_columns, before);
    assert_eq!(
        ViewError::EmptyColumnSelection.to_string(),
        "Please select at least one column to display"
    );
}

#[test]
fn table_service_clear_filters_restores_full_list() {
    let mut service = TableService::new(Arc::new(numbered_dataset(12)), 10);
    service.set_global_search("fund 01");
    assert_eq!(service.table().total_records, 1);

    service.clear_filters();

    assert_eq!(service.table().total_records, 12);
    assert!(service.view().column_filters.is_empty());
    assert_eq!(service.view().global_search, None);
}

#[test]
fn column_resize_is_clamped() {
    let mut service = TableService::new(Arc::new(numbered_dataset(1)), 10);

    assert_eq!(service.resize_column("Fund", 150.0, -200.0), Ok(80));
    assert_eq!(service.resize_column("Fund", 150.0, 1000.0), Ok(600));
    assert_eq!(service.resize_column("Fund", 150.0, 25.4), Ok(175));
    assert_eq!(service.view().column_widths.get("Fund"), Some(175));
}

#[test]
fn default_view_falls_back_to_all_columns() {
    let columns = vec!["Scheme".to_string(), "Category".to_string()];
    let view = ViewState::default_for(&columns, 25);

    assert_eq!(view.visible_columns, columns);
    assert_eq!(view.per_page, 25);
}

#[test]
fn numeric_cells_show_two_decimals_and_blanks_show_dash() {
    assert_eq!(format_cell_value("Returns 1 Yr", &CellValue::Number(8.5)), "8.50");
    assert_eq!(format_cell_value("Returns 1 Yr", &CellValue::Missing), "-");
    assert_eq!(format_cell_value("Amc", &"".into()), "-");
    assert_eq!(format_cell_value("Fund", &"HDFC Top 100".into()), "HDFC Top 100");
}

#[test]
fn cell_tone_marks_sign_of_returns_and_alpha() {
    assert_eq!(cell_tone("Returns 1 Yr", &(-1.0).into()), CellTone::Negative);
    assert_eq!(cell_tone("Alpha 3 Yr", &2.0.into()), CellTone::Positive);
    assert_eq!(cell_tone("Sharpe Ratio 3 Yr", &(-1.0).into()), CellTone::Numeric);
    assert_eq!(cell_tone("Fund", &"Any".into()), CellTone::Name);
    assert_eq!(cell_tone("Amc", &"Any".into()), CellTone::Text);
}

#[test]
fn export_csv_quotes_only_when_needed() {
    let records = vec![
        fund("Plain Fund", "AMC", Some(8.5)),
        fund("Fund, \"Quoted\"", "AMC", None),
    ];
    let columns = vec!["Fund".to_string(), "Returns 3 Yr".to_string()];

    let bytes = export_csv(&columns, &records).expect("export should succeed");
    let text = String::from_utf8(bytes.clone()).expect("export should be utf-8");

    assert!(text.starts_with("Fund,Returns 3 Yr\nPlain Fund,8.5\n"));
    assert!(text.contains("\"Fund, \"\"Quoted\"\"\",\n"));

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .expect("export should parse back");
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][0], "Fund, \"Quoted\"");
    assert_eq!(&rows[1][1], "");
}

#[test]
fn export_csv_quotes_line_breaks() {
    let records = vec![
        fund("Line\nBreak Fund", "AMC", Some(8.5)),
        fund("Carriage\rReturn Fund", "AMC", Some(9.0)),
    ];
    let columns = vec!["Fund".to_string(), "Returns 3 Yr".to_string()];

    let bytes = export_csv(&columns, &records).expect("export should succeed");
    let text = String::from_utf8(bytes.clone()).expect("export should be utf-8");

    assert!(text.contains("\"Line\nBreak Fund\",8.5\n"));
    assert!(text.contains("\"Carriage\rReturn Fund\",9\n"));

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .expect("export should parse back");
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "Line\nBreak Fund");
    assert_eq!(&rows[1][0], "Carriage\rReturn Fund");
}

#[test]
fn export_csv_single_column_keeps_empty_rows() {
    let records = vec![fund("Named", "AMC", None), fund("", "AMC", None)];
    let columns = vec!["Fund".to_string()];

    let bytes = export_csv(&columns, &records).expect("export should succeed");

    assert_eq!(bytes, b"Fund\nNamed\n\"\"\n");
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .expect("export should parse back");
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][0], "");
}

#[test]
fn export_file_name_carries_the_date() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).expect("date should be valid");
    assert_eq!(export_file_name(date), "funds_export_2024-03-05.csv");
}

#[test]
fn write_export_creates_parent_directory() {
    let temp_dir = unique_test_dir("export");
    let path = temp_dir.join("nested").join("funds.csv");

    write_export(&path, b"Fund\n").expect("export should be written");

    assert_eq!(fs::read(&path).expect("file should exist"), b"Fund\n");
    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn growth_series_compounds_monthly_from_hundred() {
    assert_eq!(growth_value(0.085, 0), 100.0);
    assert_eq!(growth_value(0.085, 12), 108.5);
    assert_eq!(growth_value(0.085, 36), 127.73);

    let series =
        derive_series(&selection(4, Metric::Returns, Horizon::Three)).expect("series should build");
    assert_eq!(series.len(), 4);
    assert!(series.iter().all(|line| line.points.len() == 37));
    assert_eq!(series[0].points[36].y, 127.73);
}

#[test]
fn text_returns_are_parsed_before_compounding() {
    let mut selection = selection(4, Metric::Returns, Horizon::Three);
    selection.funds[0] = [
        ("Fund", CellValue::from("Text Fund")),
        ("Returns 3 Yr", CellValue::from("8.5")),
    ]
    .into_iter()
    .collect();

    let series = derive_series(&selection).expect("series should build");

    assert_eq!(series[0].label, "Text Fund");
    assert_eq!(series[0].points[36].y, 127.73);
}

#[test]
fn selection_size_is_enforced() {
    assert_eq!(
        derive_series(&selection(3, Metric::Returns, Horizon::Three)),
        Err(ChartError::TooFewFunds(3))
    );
    assert_eq!(
        derive_series(&selection(14, Metric::Returns, Horizon::Three)),
        Err(ChartError::TooManyFunds(14))
    );
    assert_eq!(
        ChartError::TooFewFunds(3).to_string(),
        "Please select at least 4 funds"
    );
    assert_eq!(
        ChartError::TooManyFunds(14).to_string(),
        "Please select maximum 11 funds"
    );
}

#[test]
fn chart_without_usable_values_reports_no_valid_data() {
    let selection = Selection {
        funds: (0..4)
            .map(|idx| fund(&format!("Fund {idx}"), "AMC", None))
            .collect(),
        horizon: Horizon::Three,
        metric: Metric::Returns,
    };

    assert_eq!(build_chart(&selection), Err(ChartError::NoValidData));
}

#[test]
fn risk_metrics_are_flat_and_read_three_year_columns() {
    let series =
        derive_series(&selection(4, Metric::Sharpe, Horizon::One)).expect("series should build");

    assert!(series.iter().all(|line| line.points.len() == 13));
    assert!(series
        .iter()
        .flat_map(|line| line.points.iter())
        .all(|point| point.y == 1.2));
    assert_eq!(Metric::Std.column(Horizon::Five), "Std 3 Yr");
    assert_eq!(Metric::Returns.column(Horizon::Five), "Returns 5 Yr");
}

#[test]
fn series_colors_follow_selection_index() {
    let mut selection = selection(4, Metric::Returns, Horizon::Three);
    selection.funds[0] = fund("No Data", "AMC", None);

    let model = build_chart(&selection).expect("chart should build");

    assert_eq!(model.series.len(), 3);
    assert_eq!(model.series[0].color, palette_color(1));
    assert_eq!(model.legend.len(), 4);
    assert_eq!(model.stats[0].headline, "N/A");
    assert_eq!(model.stats[1].color_to, palette_color(2));
    assert_eq!(palette_color(11), palette_color(0));
}

#[test]
fn chart_model_carries_titles_and_tooltip() {
    let model =
        build_chart(&selection(4, Metric::Returns, Horizon::Three)).expect("chart should build");

    assert_eq!(model.title, "Fund Comparison - 3 Year Growth from ₹100");
    assert_eq!(model.x_axis_label, "Time (Months)");
    assert_eq!(model.y_axis_label, "Portfolio Value (₹)");
    assert!(!model.begin_at_zero);

    let (title, lines) = tooltip_at(&model, 36);
    assert_eq!(title, "3Y 0M");
    assert_eq!(lines[0], "Fund 0: ₹127.73");
    assert_eq!(x_ticks(&model.viewport.current()), vec![0, 12, 24, 36]);
}

#[test]
fn headline_and_labels_format_values() {
    assert_eq!(headline(Metric::Returns, Some(8.5)), "8.50%");
    assert_eq!(headline(Metric::Sharpe, Some(1.234)), "1.23");
    assert_eq!(headline(Metric::Alpha, None), "N/A");
    assert_eq!(month_label(27), "2Y 3M");
    assert_eq!(x_tick_label(24), Some("2Y".to_string()));
    assert_eq!(x_tick_label(13), None);

    let long_name = "A".repeat(45);
    assert_eq!(display_name(&long_name), format!("{}...", "A".repeat(40)));
    assert_eq!(display_name("Short"), "Short");
}

#[test]
fn selection_status_reflects_count() {
    assert_eq!(selection_status(0).1, SelectionTone::Neutral);
    assert_eq!(
        selection_status(2),
        (
            "Selected: 2 - Need at least 4 funds".to_string(),
            SelectionTone::Error
        )
    );
    assert_eq!(
        selection_status(5),
        ("Selected: 5 funds ✓".to_string(), SelectionTone::Ok)
    );
    assert_eq!(selection_status(12).1, SelectionTone::Error);
}

#[test]
fn fund_choices_are_sorted_by_name() {
    let dataset = dataset(vec![
        fund("beta", "AMC", None),
        fund("alpha", "AMC", None),
        fund("Alpha", "AMC", None),
    ]);

    let choices = fund_choices(&dataset);

    let names = choices
        .iter()
        .map(|choice| choice.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Alpha", "alpha", "beta"]);
    assert_eq!(choices[0].dataset_idx, 2);
}

#[test]
fn viewport_zoom_and_pan_stay_inside_original_bounds() {
    let original = Bounds {
        x_min: 0.0,
        x_max: 36.0,
        y_min: 0.0,
        y_max: 200.0,
    };
    let mut viewport = Viewport::new(original);

    viewport.zoom(0.1, 18.0, 100.0);
    assert!(!viewport.is_zoomed(), "cannot zoom out past the data");

    viewport.zoom_at_center(2.0);
    assert_eq!(viewport.current().x_min, 9.0);
    assert_eq!(viewport.current().x_max, 27.0);

    viewport.pan(-100.0, 0.0);
    assert_eq!(viewport.current().x_min, 0.0);
    assert_eq!(viewport.current().x_max, 18.0);

    viewport.reset();
    assert_eq!(viewport.current(), original);
    assert_eq!(viewport.project(18.0, 100.0, 360.0, 200.0), (180.0, 100.0));
}

#[test]
fn viewport_at_full_extent_survives_rounding_in_pan_and_zoom_out() {
    let original = Bounds {
        x_min: 0.0,
        x_max: 36.0,
        y_min: 35.71614844533601,
        y_max: 112.61514945441776,
    };
    let mut viewport = Viewport::new(original);

    viewport.pan(0.0, 1.0);
    assert_eq!(viewport.current(), original);

    viewport.zoom_at_center(1.0 / 1.2);
    assert!(!viewport.is_zoomed());
}

#[test]
fn chart_viewport_stays_inside_data_for_varied_returns() {
    for step in 0..200 {
        let base = -15.0 + step as f64 * 0.37;
        let mut selection = selection(4, Metric::Returns, Horizon::Three);
        for (idx, offset) in [0.0, 4.6, 7.9, 14.4].into_iter().enumerate() {
            selection.funds[idx] = fund(&format!("Fund {idx}"), "AMC", Some(base + offset));
        }
        let mut viewport = build_chart(&selection)
            .expect("chart should build")
            .viewport;
        let original = viewport.current();

        viewport.zoom_at_center(1.0 / 1.2);
        viewport.pan(3.0, -2.5);
        viewport.zoom_at_center(1.5);
        viewport.pan(-50.0, 50.0);

        let current = viewport.current();
        assert!(current.x_min >= original.x_min && current.y_min >= original.y_min);
        assert!(current.width() <= original.width());
        assert!(current.height() <= original.height());
    }
}

#[test]
fn debouncer_keeps_only_the_last_value() {
    let start = Instant::now();
    let window = Duration::from_millis(250);
    let mut debouncer = Debouncer::new(window);

    debouncer.schedule("h".to_string(), start);
    debouncer.schedule("hd".to_string(), start + Duration::from_millis(100));

    assert_eq!(debouncer.take_ready(start + window), None, "window restarted");
    assert_eq!(
        debouncer.take_ready(start + Duration::from_millis(350)),
        Some("hd".to_string())
    );
    assert_eq!(
        debouncer.take_ready(start + Duration::from_secs(10)),
        None,
        "already committed"
    );
}

#[test]
fn debouncer_cancel_drops_pending_value() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(Duration::from_millis(200));
    debouncer.schedule(1, start);

    debouncer.cancel();

    assert_eq!(debouncer.take_ready(start + Duration::from_secs(10)), None);
}

#[test]
fn discarding_filter_drafts_stops_pending_commits() {
    let start = Instant::now();
    let window = Duration::from_millis(250);
    let mut inputs = std::collections::BTreeMap::new();
    let mut debouncers = std::collections::BTreeMap::new();
    for (target, value) in [
        (FilterTarget::Global, "hdfc"),
        (FilterTarget::Column("Amc".to_string()), "sbi"),
    ] {
        inputs.insert(target.clone(), value.to_string());
        let mut debouncer = Debouncer::new(window);
        debouncer.schedule(value.to_string(), start);
        debouncers.insert(target, debouncer);
    }

    discard_filter_drafts(&mut inputs, &mut debouncers);

    assert!(inputs.is_empty());
    assert!(debouncers
        .values_mut()
        .all(|debouncer| debouncer.take_ready(start + Duration::from_secs(10)).is_none()));
}

#[test]
fn config_defaults_without_environment() {
    let config = AppConfig::default();

    assert_eq!(config.api_base.as_str(), "http://localhost:8004/");
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.debounce, Duration::from_millis(250));
    assert_eq!(config.per_page, 10);
}

#[test]
fn config_reads_and_sanitizes_overrides() {
    let config = AppConfig::from_lookup(|key| match key {
        "FUND_SCREENER_PAGE_URL" => Some("https://example.com/fundscreener/index.html".to_string()),
        "FUND_SCREENER_TIMEOUT_SECS" => Some("0".to_string()),
        "FUND_SCREENER_DEBOUNCE_MS" => Some("1000".to_string()),
        "FUND_SCREENER_PER_PAGE" => Some("50".to_string()),
        _ => None,
    });

    assert_eq!(config.api_base.as_str(), "https://example.com/fundscreener");
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.debounce, Duration::from_millis(300));
    assert_eq!(config.per_page, 50);

    let explicit = AppConfig::from_lookup(|key| match key {
        "FUND_SCREENER_API_BASE" => Some("http://10.0.0.5:9000".to_string()),
        "FUND_SCREENER_PER_PAGE" => Some("30".to_string()),
        _ => None,
    });
    assert_eq!(explicit.api_base.as_str(), "http://10.0.0.5:9000/");
    assert_eq!(explicit.per_page, 10);
}

#[test]
fn resolve_api_base_strips_page_path() {
    let root = Url::parse("http://localhost:8004/index.html?x=1").expect("url should parse");
    assert_eq!(resolve_api_base(&root).as_str(), "http://localhost:8004/");
}

#[test]
fn ensure_webview_data_dir_creates_webview2_subdir() {
    let temp_dir = unique_test_dir("webview-data-dir");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");

    let webview_dir =
        ensure_webview_data_dir(&temp_dir).expect("webview data dir should be created");

    assert_eq!(webview_dir, temp_dir.join("webview2"));
    assert!(webview_dir.is_dir(), "webview2 directory should exist");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

/// Answers exactly one request with `status` and `body` after `delay`.
async fn serve_once(status: &'static str, body: String, delay: Duration) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind stub server");
    let addr = listener.local_addr().expect("should have local addr");

    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0_u8; 4096];
        loop {
            let read = stream.read(&mut buf).await.unwrap_or(0);
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buf[..read]);
            if request.windows(4).any(|window| window == b"\r\n\r\n") {
                break;
            }
        }
        tokio::time::sleep(delay).await;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    });

    Url::parse(&format!("http://{addr}/")).expect("stub url should parse")
}

fn funds_body() -> String {
    json!({
        "success": true,
        "columns": ["Fund", "Amc", "Returns 3 Yr"],
        "data": [
            {"Fund": "Alpha Fund", "Amc": "Alpha AMC", "Returns 3 Yr": 12.5},
            {"Fund": "Beta Fund", "Amc": "Beta AMC", "Returns 3 Yr": null}
        ],
        "total": 2,
        "page": 1,
        "per_page": 10000,
        "total_pages": 1
    })
    .to_string()
}

#[test]
fn funds_url_requests_everything_in_one_page() {
    let base = Url::parse("http://127.0.0.1:8004/fundscreener").expect("url should parse");
    let source = HttpFundSource::new(base, Duration::from_secs(1)).expect("client should build");

    assert_eq!(
        source.funds_url().expect("url should build").as_str(),
        "http://127.0.0.1:8004/fundscreener/api/funds?page=1&per_page=10000"
    );
}

#[tokio::test]
async fn load_funds_returns_full_dataset() {
    let base = serve_once("200 OK", funds_body(), Duration::ZERO).await;
    let source = HttpFundSource::new(base, Duration::from_secs(5)).expect("client should build");
    let (_canceller, token) = cancel_pair();

    let dataset = source.load_funds(token).await.expect("load should succeed");

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.columns(), ["Fund", "Amc", "Returns 3 Yr"]);
    let record = dataset.record(0).expect("record should exist");
    assert_eq!(record.get("Returns 3 Yr"), &CellValue::Number(12.5));
    assert!(dataset
        .record(1)
        .expect("record should exist")
        .get("Returns 3 Yr")
        .is_missing());
}

#[tokio::test]
async fn load_funds_surfaces_server_error_message() {
    let body = json!({"success": false, "error": "database unavailable"}).to_string();
    let base = serve_once("500 Internal Server Error", body, Duration::ZERO).await;
    let source = HttpFundSource::new(base, Duration::from_secs(5)).expect("client should build");
    let (_canceller, token) = cancel_pair();

    let err = source
        .load_funds(token)
        .await
        .expect_err("load should fail");

    assert_eq!(err, LoadError::Rejected("database unavailable".to_string()));
    assert_eq!(err.to_string(), "Failed to load data: database unavailable");
}

#[tokio::test]
async fn load_funds_rejects_malformed_json() {
    let base = serve_once("200 OK", "{not json".to_string(), Duration::ZERO).await;
    let source = HttpFundSource::new(base, Duration::from_secs(5)).expect("client should build");
    let (_canceller, token) = cancel_pair();

    let err = source
        .load_funds(token)
        .await
        .expect_err("load should fail");

    assert!(matches!(err, LoadError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn load_funds_times_out() {
    let base = serve_once("200 OK", funds_body(), Duration::from_secs(5)).await;
    let timeout = Duration::from_millis(200);
    let source = HttpFundSource::new(base, timeout).expect("client should build");
    let (_canceller, token) = cancel_pair();

    let err = source
        .load_funds(token)
        .await
        .expect_err("load should time out");

    assert_eq!(err, LoadError::Timeout(timeout));
}

#[tokio::test]
async fn load_funds_stops_when_cancelled() {
    let base = serve_once("200 OK", funds_body(), Duration::from_secs(5)).await;
    let source = HttpFundSource::new(base, Duration::from_secs(5)).expect("client should build");
    let (canceller, token) = cancel_pair();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });
    let err = source
        .load_funds(token)
        .await
        .expect_err("load should be cancelled");

    assert_eq!(err, LoadError::Cancelled);
}

#[tokio::test]
async fn load_funds_skips_request_when_already_cancelled() {
    let base = Url::parse("http://127.0.0.1:9/").expect("url should parse");
    let source = HttpFundSource::new(base, Duration::from_secs(5)).expect("client should build");
    let (canceller, token) = cancel_pair();
    canceller.cancel();

    let err = source
        .load_funds(token)
        .await
        .expect_err("load should be cancelled");

    assert_eq!(err, LoadError::Cancelled);
}

#[tokio::test]
async fn dropped_canceller_does_not_cancel() {
    let (canceller, mut token) = cancel_pair();
    drop(canceller);

    assert!(!token.is_cancelled());
    let waited = tokio::time::timeout(Duration::from_millis(50), token.cancelled()).await;
    assert!(waited.is_err(), "cancelled() should stay pending");
}

#[tokio::test]
async fn health_reports_server_counts() {
    let body = json!({"status": "healthy", "records": 3, "columns": 5}).to_string();
    let base = serve_once("200 OK", body, Duration::ZERO).await;
    let source = HttpFundSource::new(base, Duration::from_secs(5)).expect("client should build");

    let health = source.health().await.expect("health should succeed");

    assert_eq!(health.status, "healthy");
    assert_eq!(health.records, 3);
    assert_eq!(health.columns, 5);
}
