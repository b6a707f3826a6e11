use thiserror::Error;

use crate::domain::entities::dataset::FundRecord;

pub const MIN_SELECTION: usize = 4;
pub const MAX_SELECTION: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChartError {
    #[error("Please select at least 4 funds")]
    TooFewFunds(usize),
    #[error("Please select maximum 11 funds")]
    TooManyFunds(usize),
    #[error("No valid data available for selected funds and time period")]
    NoValidData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Metric {
    #[default]
    Returns,
    Sharpe,
    Std,
    Alpha,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Returns, Metric::Sharpe, Metric::Std, Metric::Alpha];

    pub fn key(self) -> &'static str {
        match self {
            Metric::Returns => "returns",
            Metric::Sharpe => "sharpe",
            Metric::Std => "std",
            Metric::Alpha => "alpha",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|metric| metric.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Returns => "Returns",
            Metric::Sharpe => "Sharpe Ratio",
            Metric::Std => "Standard Deviation",
            Metric::Alpha => "Alpha",
        }
    }

    /// Column the metric reads. Only returns follow the horizon; the risk
    /// statistics always come from the 3-year columns.
    pub fn column(self, horizon: Horizon) -> String {
        match self {
            Metric::Returns => format!("Returns {} Yr", horizon.years()),
            Metric::Sharpe => "Sharpe Ratio 3 Yr".to_string(),
            Metric::Std => "Std 3 Yr".to_string(),
            Metric::Alpha => "Alpha 3 Yr".to_string(),
        }
    }

    pub fn y_axis_label(self) -> &'static str {
        match self {
            Metric::Returns => "Portfolio Value (₹)",
            Metric::Sharpe => "Sharpe Ratio",
            Metric::Std => "Standard Deviation (%)",
            Metric::Alpha => "Alpha (%)",
        }
    }

    pub fn begins_at_zero(self) -> bool {
        matches!(self, Metric::Sharpe | Metric::Std)
    }

    pub fn title(self, horizon: Horizon) -> String {
        match self {
            Metric::Returns => format!(
                "Fund Comparison - {} Year Growth from ₹100",
                horizon.years()
            ),
            Metric::Sharpe => "Fund Comparison - Sharpe Ratio".to_string(),
            Metric::Std => "Fund Comparison - Standard Deviation".to_string(),
            Metric::Alpha => "Fund Comparison - Alpha".to_string(),
        }
    }

    pub fn is_currency(self) -> bool {
        matches!(self, Metric::Returns)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Horizon {
    One,
    #[default]
    Three,
    Five,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::One, Horizon::Three, Horizon::Five];

    pub fn years(self) -> u32 {
        match self {
            Horizon::One => 1,
            Horizon::Three => 3,
            Horizon::Five => 5,
        }
    }

    pub fn months(self) -> u32 {
        self.years() * 12
    }

    pub fn from_years(years: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|horizon| horizon.years() == years)
    }

    pub fn label(self) -> String {
        match self {
            Horizon::One => "1 Year".to_string(),
            other => format!("{} Years", other.years()),
        }
    }
}

/// Funds picked for comparison, in picker order.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub funds: Vec<FundRecord>,
    pub horizon: Horizon,
    pub metric: Metric,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub x: u32,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FundSeries {
    pub label: String,
    pub color: &'static str,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub label: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: String,
    pub display_name: String,
    pub headline: String,
    pub color_from: &'static str,
    pub color_to: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// Smallest visible span, as a fraction of the original extent.
const MIN_ZOOM_FRACTION: f64 = 0.02;

/// Visible window over the plotted data. Zoom and pan never leave the
/// original data extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    original: Bounds,
    current: Bounds,
}

impl Viewport {
    pub fn new(original: Bounds) -> Self {
        Self {
            original,
            current: original,
        }
    }

    pub fn current(&self) -> Bounds {
        self.current
    }

    pub fn is_zoomed(&self) -> bool {
        self.current != self.original
    }

    /// `factor > 1` zooms in around the given data point, `factor < 1` zooms out.
    pub fn zoom(&mut self, factor: f64, center_x: f64, center_y: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let (x_min, x_max) = zoom_axis(
            self.current.x_min,
            self.current.x_max,
            center_x,
            factor,
            self.original.x_min,
            self.original.x_max,
        );
        let (y_min, y_max) = zoom_axis(
            self.current.y_min,
            self.current.y_max,
            center_y,
            factor,
            self.original.y_min,
            self.original.y_max,
        );
        self.current = Bounds {
            x_min,
            x_max,
            y_min,
            y_max,
        };
    }

    pub fn zoom_at_center(&mut self, factor: f64) {
        let center_x = (self.current.x_min + self.current.x_max) / 2.0;
        let center_y = (self.current.y_min + self.current.y_max) / 2.0;
        self.zoom(factor, center_x, center_y);
    }

    /// Shifts the window by data-space deltas.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let (x_min, x_max) = clamp_axis(
            self.current.x_min + dx,
            self.current.width(),
            self.original.x_min,
            self.original.x_max,
        );
        let (y_min, y_max) = clamp_axis(
            self.current.y_min + dy,
            self.current.height(),
            self.original.y_min,
            self.original.y_max,
        );
        self.current = Bounds {
            x_min,
            x_max,
            y_min,
            y_max,
        };
    }

    pub fn reset(&mut self) {
        self.current = self.original;
    }

    /// Maps a data point into a `width` x `height` plot area with the origin
    /// at the top-left corner.
    pub fn project(&self, x: f64, y: f64, width: f64, height: f64) -> (f64, f64) {
        let bounds = self.current;
        let px = (x - bounds.x_min) / bounds.width() * width;
        let py = height - (y - bounds.y_min) / bounds.height() * height;
        (px, py)
    }
}

fn zoom_axis(
    min: f64,
    max: f64,
    center: f64,
    factor: f64,
    orig_min: f64,
    orig_max: f64,
) -> (f64, f64) {
    let span = max - min;
    let orig_span = orig_max - orig_min;
    let next_span = (span / factor).clamp(orig_span * MIN_ZOOM_FRACTION, orig_span);
    let ratio = if span > 0.0 {
        ((center - min) / span).clamp(0.0, 1.0)
    } else {
        0.5
    };
    clamp_axis(center - ratio * next_span, next_span, orig_min, orig_max)
}

fn clamp_axis(min: f64, span: f64, orig_min: f64, orig_max: f64) -> (f64, f64) {
    if span >= orig_max - orig_min {
        return (orig_min, orig_max);
    }
    // `orig_max - span` can still round a few ULPs below `orig_min`.
    let highest_min = (orig_max - span).max(orig_min);
    let min = min.max(orig_min).min(highest_min);
    (min, min + span)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartModel {
    pub metric: Metric,
    pub horizon: Horizon,
    pub title: String,
    pub x_axis_label: &'static str,
    pub y_axis_label: &'static str,
    pub begin_at_zero: bool,
    pub series: Vec<FundSeries>,
    pub legend: Vec<LegendEntry>,
    pub stats: Vec<StatCard>,
    pub viewport: Viewport,
}
