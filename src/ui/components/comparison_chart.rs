use dioxus::prelude::*;

use crate::domain::entities::chart::{ChartModel, Horizon, Metric, Selection};
use crate::ui::state::app_state::{show_warning, AppState};
use crate::usecase::services::chart_service::{
    build_chart, fund_choices, selection_status, tooltip_at, x_tick_label, x_ticks, y_tick_label,
    y_ticks, SelectionTone,
};

const SVG_WIDTH: f64 = 900.0;
const SVG_HEIGHT: f64 = 440.0;
const PLOT_LEFT: f64 = 70.0;
const PLOT_TOP: f64 = 40.0;
const PLOT_RIGHT: f64 = 20.0;
const PLOT_BOTTOM: f64 = 60.0;
const Y_TICK_COUNT: usize = 6;
const WHEEL_ZOOM_STEP: f64 = 1.2;

const BUTTON_STYLE: &str =
    "border: 1px solid #bbb; background: #fff; padding: 4px 10px; border-radius: 6px; cursor: pointer;";

fn plot_width() -> f64 {
    SVG_WIDTH - PLOT_LEFT - PLOT_RIGHT
}

fn plot_height() -> f64 {
    SVG_HEIGHT - PLOT_TOP - PLOT_BOTTOM
}

fn tone_color(tone: SelectionTone) -> &'static str {
    match tone {
        SelectionTone::Neutral => "#666",
        SelectionTone::Error => "#dc2626",
        SelectionTone::Ok => "#16a34a",
    }
}

/// Month under a horizontal position inside the plot area.
fn month_at(model: &ChartModel, plot_x: f64) -> Option<u32> {
    let width = plot_width();
    if !(0.0..=width).contains(&plot_x) {
        return None;
    }
    let bounds = model.viewport.current();
    let x = bounds.x_min + plot_x / width * bounds.width();
    let month = x.round().max(0.0) as u32;
    (month <= model.horizon.months()).then_some(month)
}

fn update_chart(state: AppState) {
    let AppState {
        table,
        selected_funds,
        horizon,
        metric,
        mut chart,
        mut hover_month,
        mut status,
        ..
    } = state;

    let selection = {
        let guard = table.read();
        let Some(service) = guard.as_ref() else {
            return;
        };
        let dataset = service.dataset();
        let selected = selected_funds();
        let funds = fund_choices(dataset)
            .into_iter()
            .filter(|choice| selected.contains(&choice.dataset_idx))
            .filter_map(|choice| dataset.record(choice.dataset_idx).cloned())
            .collect::<Vec<_>>();
        Selection {
            funds,
            horizon: horizon(),
            metric: metric(),
        }
    };

    match build_chart(&selection) {
        Ok(model) => {
            *status.write() = format!("Comparing {} funds", model.legend.len());
            hover_month.set(None);
            chart.set(Some(model));
        }
        Err(err) => show_warning(&err.to_string()),
    }
}

#[component]
pub fn ComparisonChart() -> Element {
    let state = use_context::<AppState>();
    let AppState {
        table,
        mut selected_funds,
        mut horizon,
        mut metric,
        mut chart,
        mut hover_month,
        ..
    } = state;

    let choices = table
        .read()
        .as_ref()
        .map(|service| fund_choices(service.dataset()))
        .unwrap_or_default();
    let selected = selected_funds();
    let (status_text, tone) = selection_status(selected.len());
    let status_color = tone_color(tone);
    let current_horizon = horizon();
    let current_metric = metric();
    let horizon_value = current_horizon.years().to_string();
    let metric_value = current_metric.key();
    let horizon_options = Horizon::ALL
        .into_iter()
        .map(|option| (option.years().to_string(), option.label(), option == current_horizon))
        .collect::<Vec<_>>();
    let metric_options = Metric::ALL
        .into_iter()
        .map(|option| (option.key(), option.label(), option == current_metric))
        .collect::<Vec<_>>();
    let model = chart();
    let zoomed = model
        .as_ref()
        .is_some_and(|model| model.viewport.is_zoomed());

    rsx! {
        div { style: "display: flex; gap: 16px; align-items: flex-start;",
            div { style: "width: 320px; flex-shrink: 0; border: 1px solid #ddd; border-radius: 6px; padding: 8px;",
                div { style: "font-weight: 600; margin-bottom: 4px;", "Funds" }
                div { style: "color: {status_color}; margin-bottom: 8px;", "{status_text}" }
                div { style: "max-height: 420px; overflow: auto;",
                    if choices.is_empty() {
                        div { style: "color: #666;", "No funds loaded" }
                    }
                    for choice in choices {
                        {
                            let checked = selected.contains(&choice.dataset_idx);
                            let idx = choice.dataset_idx;
                            rsx! {
                                label { key: "{idx}", style: "display: flex; gap: 6px; align-items: center; padding: 2px 0;",
                                    input {
                                        r#type: "checkbox",
                                        checked: checked,
                                        onclick: move |_| {
                                            let mut next = selected_funds();
                                            if !next.remove(&idx) {
                                                next.insert(idx);
                                            }
                                            selected_funds.set(next);
                                        },
                                    }
                                    span { "{choice.name}" }
                                }
                            }
                        }
                    }
                }
            }

            div { style: "flex: 1; min-width: 0;",
                div { style: "display: flex; flex-wrap: wrap; gap: 8px; align-items: center; margin-bottom: 12px;",
                    span { "Time period" }
                    select {
                        value: "{horizon_value}",
                        onchange: move |event| {
                            if let Some(next) = event.value().parse::<u32>().ok().and_then(Horizon::from_years) {
                                horizon.set(next);
                            }
                        },
                        for (value, label, is_current) in horizon_options {
                            option { value: "{value}", selected: is_current, "{label}" }
                        }
                    }
                    span { "Metric" }
                    select {
                        value: "{metric_value}",
                        onchange: move |event| {
                            if let Some(next) = Metric::from_key(&event.value()) {
                                metric.set(next);
                            }
                        },
                        for (value, label, is_current) in metric_options {
                            option { value: "{value}", selected: is_current, "{label}" }
                        }
                    }
                    button {
                        style: BUTTON_STYLE,
                        onclick: move |_| update_chart(state),
                        "Update Chart"
                    }
                    button {
                        style: BUTTON_STYLE,
                        disabled: !zoomed,
                        onclick: move |_| {
                            if let Some(model) = chart.write().as_mut() {
                                model.viewport.reset();
                            }
                        },
                        "Reset Zoom"
                    }
                    button {
                        style: BUTTON_STYLE,
                        onclick: move |_| {
                            selected_funds.write().clear();
                            hover_month.set(None);
                            chart.set(None);
                        },
                        "Clear Selection"
                    }
                }

                if let Some(model) = model.as_ref() {
                    ChartCanvas { model: model.clone() }
                    div { style: "display: flex; flex-wrap: wrap; gap: 12px; margin: 8px 0;",
                        for (idx, entry) in model.legend.iter().enumerate() {
                            div { key: "legend-{idx}", style: "display: flex; align-items: center; gap: 6px;",
                                span { style: "display: inline-block; width: 14px; height: 4px; background: {entry.color};" }
                                span { style: "font-size: 12px;", "{entry.label}" }
                            }
                        }
                    }
                    div { style: "display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 10px;",
                        for (idx, card) in model.stats.iter().enumerate() {
                            div {
                                key: "stat-{idx}",
                                title: "{card.label}",
                                style: "background: linear-gradient(135deg, {card.color_from}, {card.color_to}); color: #fff; border-radius: 8px; padding: 10px;",
                                div { style: "font-size: 12px; opacity: 0.9;", "{card.display_name}" }
                                div { style: "font-size: 22px; font-weight: 700;", "{card.headline}" }
                            }
                        }
                    }
                } else {
                    div { style: "padding: 40px; text-align: center; color: #666; border: 1px dashed #ccc; border-radius: 6px;",
                        "Select funds and press Update Chart"
                    }
                }
            }
        }
    }
}

#[component]
fn ChartCanvas(model: ChartModel) -> Element {
    let AppState {
        mut chart,
        mut hover_month,
        mut pan_anchor,
        ..
    } = use_context::<AppState>();

    let width = plot_width();
    let height = plot_height();
    let viewport = model.viewport;
    let bounds = viewport.current();

    let lines = model
        .series
        .iter()
        .map(|line| {
            let points = line
                .points
                .iter()
                .map(|point| {
                    let (x, y) = viewport.project(point.x as f64, point.y, width, height);
                    format!("{x:.1},{y:.1}")
                })
                .collect::<Vec<_>>()
                .join(" ");
            (line.color, points)
        })
        .collect::<Vec<_>>();

    let x_tick_marks = x_ticks(&bounds)
        .into_iter()
        .filter_map(|month| {
            let label = x_tick_label(month)?;
            let (x, _) = viewport.project(month as f64, bounds.y_min, width, height);
            Some((PLOT_LEFT + x, label))
        })
        .collect::<Vec<_>>();
    let y_tick_marks = y_ticks(&bounds, Y_TICK_COUNT)
        .into_iter()
        .map(|value| {
            let (_, y) = viewport.project(bounds.x_min, value, width, height);
            (PLOT_TOP + y, PLOT_TOP + y + 4.0, y_tick_label(model.metric, value))
        })
        .collect::<Vec<_>>();

    let zero_line = (model.begin_at_zero && bounds.y_min <= 0.0 && bounds.y_max >= 0.0)
        .then(|| viewport.project(bounds.x_min, 0.0, width, height).1);

    let tooltip = hover_month().map(|month| {
        let (x, _) = viewport.project(month as f64, bounds.y_min, width, height);
        let (title, lines) = tooltip_at(&model, month);
        (PLOT_LEFT + x, title, lines)
    });
    let tooltip_x = tooltip.as_ref().map(|(x, _, _)| *x);
    let tooltip_box = tooltip.map(|(x, title, lines)| (x + 12.0, PLOT_TOP + 8.0, title, lines));

    let plot_bottom = PLOT_TOP + height;
    let x_label_y = plot_bottom + 16.0;
    let y_label_x = PLOT_LEFT - 6.0;
    let axis_title_y = SVG_HEIGHT - 12.0;
    let plot_right = PLOT_LEFT + width;
    let center_x = PLOT_LEFT + width / 2.0;
    let y_label_y = PLOT_TOP + height / 2.0;
    let hover_model = model.clone();

    rsx! {
        div { style: "position: relative;",
            svg {
                width: "{SVG_WIDTH}",
                height: "{SVG_HEIGHT}",
                view_box: "0 0 {SVG_WIDTH} {SVG_HEIGHT}",
                style: "background: #fff; border: 1px solid #ddd; border-radius: 6px; user-select: none;",
                onwheel: move |event| {
                    let delta = event.delta().strip_units().y;
                    let factor = if delta < 0.0 { WHEEL_ZOOM_STEP } else { 1.0 / WHEEL_ZOOM_STEP };
                    if let Some(model) = chart.write().as_mut() {
                        model.viewport.zoom_at_center(factor);
                    }
                },
                onmousedown: move |event| {
                    let point = event.client_coordinates();
                    pan_anchor.set(Some((point.x, point.y)));
                },
                onmouseup: move |_| pan_anchor.set(None),
                onmouseleave: move |_| {
                    pan_anchor.set(None);
                    hover_month.set(None);
                },
                onmousemove: move |event| {
                    let local = event.element_coordinates();
                    hover_month.set(month_at(&hover_model, local.x - PLOT_LEFT));

                    let Some((start_x, start_y)) = pan_anchor() else {
                        return;
                    };
                    let point = event.client_coordinates();
                    pan_anchor.set(Some((point.x, point.y)));
                    if let Some(model) = chart.write().as_mut() {
                        let current = model.viewport.current();
                        let dx = -(point.x - start_x) / plot_width() * current.width();
                        let dy = (point.y - start_y) / plot_height() * current.height();
                        model.viewport.pan(dx, dy);
                    }
                },

                text {
                    x: "{center_x}",
                    y: "24",
                    text_anchor: "middle",
                    font_size: "16",
                    font_weight: "600",
                    "{model.title}"
                }

                for (idx, (y, label_y, label)) in y_tick_marks.into_iter().enumerate() {
                    g { key: "y-{idx}",
                        line {
                            x1: "{PLOT_LEFT}",
                            x2: "{plot_right}",
                            y1: "{y}",
                            y2: "{y}",
                            stroke: "#eee",
                        }
                        text {
                            x: "{y_label_x}",
                            y: "{label_y}",
                            text_anchor: "end",
                            font_size: "11",
                            fill: "#555",
                            "{label}"
                        }
                    }
                }
                for (idx, (x, label)) in x_tick_marks.into_iter().enumerate() {
                    g { key: "x-{idx}",
                        line {
                            x1: "{x}",
                            x2: "{x}",
                            y1: "{PLOT_TOP}",
                            y2: "{plot_bottom}",
                            stroke: "#eee",
                        }
                        text {
                            x: "{x}",
                            y: "{x_label_y}",
                            text_anchor: "middle",
                            font_size: "11",
                            fill: "#555",
                            "{label}"
                        }
                    }
                }

                rect {
                    x: "{PLOT_LEFT}",
                    y: "{PLOT_TOP}",
                    width: "{width}",
                    height: "{height}",
                    fill: "none",
                    stroke: "#ccc",
                }

                svg {
                    x: "{PLOT_LEFT}",
                    y: "{PLOT_TOP}",
                    width: "{width}",
                    height: "{height}",
                    if let Some(zero_y) = zero_line {
                        line {
                            x1: "0",
                            x2: "{width}",
                            y1: "{zero_y}",
                            y2: "{zero_y}",
                            stroke: "#999",
                            stroke_dasharray: "4 3",
                        }
                    }
                    for (idx, (color, points)) in lines.into_iter().enumerate() {
                        polyline {
                            key: "series-{idx}",
                            points: "{points}",
                            fill: "none",
                            stroke: "{color}",
                            stroke_width: "2",
                        }
                    }
                }

                if let Some(x) = tooltip_x {
                    line {
                        x1: "{x}",
                        x2: "{x}",
                        y1: "{PLOT_TOP}",
                        y2: "{plot_bottom}",
                        stroke: "#999",
                        stroke_dasharray: "4 3",
                    }
                }

                text {
                    x: "{center_x}",
                    y: "{axis_title_y}",
                    text_anchor: "middle",
                    font_size: "12",
                    "{model.x_axis_label}"
                }
                text {
                    x: "16",
                    y: "{y_label_y}",
                    text_anchor: "middle",
                    font_size: "12",
                    transform: "rotate(-90 16 {y_label_y})",
                    "{model.y_axis_label}"
                }
            }

            if let Some((left, top, title, lines)) = tooltip_box {
                div {
                    style: "position: absolute; top: {top}px; left: {left}px; background: rgba(0,0,0,0.8); color: #fff; font-size: 12px; padding: 6px 8px; border-radius: 4px; pointer-events: none; white-space: nowrap;",
                    div { style: "font-weight: 600;", "{title}" }
                    for (idx, line) in lines.into_iter().enumerate() {
                        div { key: "tip-{idx}", "{line}" }
                    }
                }
            }
        }
    }
}
