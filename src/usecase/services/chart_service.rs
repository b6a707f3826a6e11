use crate::domain::entities::chart::{
    Bounds, ChartError, ChartModel, ChartPoint, FundSeries, Horizon, LegendEntry, Metric,
    Selection, StatCard, Viewport, MAX_SELECTION, MIN_SELECTION,
};
use crate::domain::entities::dataset::{Dataset, FundRecord};
use crate::usecase::services::table_service::compare_text;

pub const PALETTE: [&str; 11] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#FF6384", "#C9CBCF",
    "#4BC0C0", "#FF6384", "#36A2EB",
];

pub const NAME_DISPLAY_LIMIT: usize = 40;
pub const X_AXIS_LABEL: &str = "Time (Months)";
const NOT_AVAILABLE: &str = "N/A";

pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

pub fn validate_selection_size(count: usize) -> Result<(), ChartError> {
    if count < MIN_SELECTION {
        return Err(ChartError::TooFewFunds(count));
    }
    if count > MAX_SELECTION {
        return Err(ChartError::TooManyFunds(count));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTone {
    Neutral,
    Error,
    Ok,
}

pub fn selection_status(count: usize) -> (String, SelectionTone) {
    match count {
        0 => (
            format!("Select between {MIN_SELECTION} and {MAX_SELECTION} funds"),
            SelectionTone::Neutral,
        ),
        n if n < MIN_SELECTION => (
            format!("Selected: {n} - Need at least {MIN_SELECTION} funds"),
            SelectionTone::Error,
        ),
        n if n > MAX_SELECTION => (
            format!("Selected: {n} - Maximum {MAX_SELECTION} funds allowed"),
            SelectionTone::Error,
        ),
        n => (format!("Selected: {n} funds ✓"), SelectionTone::Ok),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundChoice {
    pub dataset_idx: usize,
    pub name: String,
}

/// Every fund in the dataset, sorted by name for the picker.
pub fn fund_choices(dataset: &Dataset) -> Vec<FundChoice> {
    let mut choices = dataset
        .records()
        .iter()
        .enumerate()
        .map(|(dataset_idx, record)| FundChoice {
            dataset_idx,
            name: record.name(),
        })
        .collect::<Vec<_>>();
    choices.sort_by(|left, right| compare_text(&left.name, &right.name));
    choices
}

/// The metric's headline number for one fund, if it parses.
pub fn metric_value(record: &FundRecord, metric: Metric, horizon: Horizon) -> Option<f64> {
    record
        .get(&metric.column(horizon))
        .as_number()
        .filter(|value| value.is_finite())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Value of ₹100 after `month` months at a constant annual `rate`.
pub fn growth_value(rate: f64, month: u32) -> f64 {
    round2(100.0 * (1.0 + rate).powf(month as f64 / 12.0))
}

fn series_points(metric: Metric, value: f64, months: u32) -> Vec<ChartPoint> {
    match metric {
        Metric::Returns => {
            let rate = value / 100.0;
            (0..=months)
                .map(|month| ChartPoint {
                    x: month,
                    y: growth_value(rate, month),
                })
                .collect()
        }
        Metric::Sharpe | Metric::Std | Metric::Alpha => (0..=months)
            .map(|month| ChartPoint { x: month, y: value })
            .collect(),
    }
}

/// One series per fund with a parsable metric, colored by selection index.
/// Funds without a usable value are skipped.
pub fn derive_series(selection: &Selection) -> Result<Vec<FundSeries>, ChartError> {
    validate_selection_size(selection.funds.len())?;
    let months = selection.horizon.months();

    let series = selection
        .funds
        .iter()
        .enumerate()
        .filter_map(|(index, fund)| {
            let Some(value) = metric_value(fund, selection.metric, selection.horizon) else {
                tracing::debug!(fund = %fund.name(), metric = selection.metric.key(), "fund dropped from chart");
                return None;
            };
            Some(FundSeries {
                label: fund.name(),
                color: palette_color(index),
                points: series_points(selection.metric, value, months),
            })
        })
        .collect::<Vec<_>>();

    if series.is_empty() {
        return Err(ChartError::NoValidData);
    }
    Ok(series)
}

pub fn display_name(name: &str) -> String {
    if name.chars().count() > NAME_DISPLAY_LIMIT {
        let head = name.chars().take(NAME_DISPLAY_LIMIT).collect::<String>();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

pub fn headline(metric: Metric, value: Option<f64>) -> String {
    match (metric, value) {
        (_, None) => NOT_AVAILABLE.to_string(),
        (Metric::Sharpe, Some(value)) => format!("{value:.2}"),
        (_, Some(value)) => format!("{value:.2}%"),
    }
}

pub fn legend(selection: &Selection) -> Vec<LegendEntry> {
    selection
        .funds
        .iter()
        .enumerate()
        .map(|(index, fund)| LegendEntry {
            label: fund.name(),
            color: palette_color(index),
        })
        .collect()
}

pub fn stat_cards(selection: &Selection) -> Vec<StatCard> {
    selection
        .funds
        .iter()
        .enumerate()
        .map(|(index, fund)| {
            let label = fund.name();
            StatCard {
                display_name: display_name(&label),
                headline: headline(
                    selection.metric,
                    metric_value(fund, selection.metric, selection.horizon),
                ),
                label,
                color_from: palette_color(index),
                color_to: palette_color(index + 1),
            }
        })
        .collect()
}

/// Data extents of all series, widened to include zero for zero-based metrics
/// and padded so flat lines are not drawn on the frame.
pub fn data_bounds(series: &[FundSeries], months: u32, begin_at_zero: bool) -> Bounds {
    let (mut y_min, mut y_max) = series
        .iter()
        .flat_map(|line| line.points.iter().map(|point| point.y))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    }
    if begin_at_zero {
        y_min = y_min.min(0.0);
        y_max = y_max.max(0.0);
    }

    let span = y_max - y_min;
    let pad = if span > f64::EPSILON {
        span * 0.05
    } else {
        y_max.abs().max(1.0) * 0.1
    };
    if !(begin_at_zero && y_min == 0.0) {
        y_min -= pad;
    }
    y_max += pad;

    Bounds {
        x_min: 0.0,
        x_max: months.max(1) as f64,
        y_min,
        y_max,
    }
}

pub fn build_chart(selection: &Selection) -> Result<ChartModel, ChartError> {
    let series = derive_series(selection)?;
    let metric = selection.metric;
    let horizon = selection.horizon;
    let begin_at_zero = metric.begins_at_zero();
    let viewport = Viewport::new(data_bounds(&series, horizon.months(), begin_at_zero));

    tracing::info!(
        funds = selection.funds.len(),
        plotted = series.len(),
        metric = metric.key(),
        years = horizon.years(),
        "comparison chart built"
    );

    Ok(ChartModel {
        metric,
        horizon,
        title: metric.title(horizon),
        x_axis_label: X_AXIS_LABEL,
        y_axis_label: metric.y_axis_label(),
        begin_at_zero,
        series,
        legend: legend(selection),
        stats: stat_cards(selection),
        viewport,
    })
}

/// Tooltip title for a month index, e.g. `2Y 3M`.
pub fn month_label(month: u32) -> String {
    format!("{}Y {}M", month / 12, month % 12)
}

pub fn tooltip_line(metric: Metric, label: &str, value: f64) -> String {
    let prefix = if label.is_empty() {
        String::new()
    } else {
        format!("{label}: ")
    };
    if metric.is_currency() {
        format!("{prefix}₹{value:.2}")
    } else {
        format!("{prefix}{value:.2}")
    }
}

/// X ticks are labelled on whole years only.
pub fn x_tick_label(month: u32) -> Option<String> {
    (month % 12 == 0).then(|| format!("{}Y", month / 12))
}

pub fn y_tick_label(metric: Metric, value: f64) -> String {
    if metric.is_currency() {
        format!("₹{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Whole-year months inside `[x_min, x_max]`.
pub fn x_ticks(bounds: &Bounds) -> Vec<u32> {
    let first = (bounds.x_min / 12.0).ceil().max(0.0) as u32;
    let last = (bounds.x_max / 12.0).floor().max(0.0) as u32;
    (first..=last).map(|year| year * 12).collect()
}

/// `count` evenly spaced values from `y_min` to `y_max`.
pub fn y_ticks(bounds: &Bounds, count: usize) -> Vec<f64> {
    let count = count.max(2);
    let step = bounds.height() / (count - 1) as f64;
    (0..count).map(|i| bounds.y_min + step * i as f64).collect()
}

/// Values of every series at `month`, for the hover tooltip.
pub fn tooltip_at(model: &ChartModel, month: u32) -> (String, Vec<String>) {
    let lines = model
        .series
        .iter()
        .filter_map(|line| {
            line.points
                .iter()
                .find(|point| point.x == month)
                .map(|point| tooltip_line(model.metric, &line.label, point.y))
        })
        .collect();
    (month_label(month), lines)
}
