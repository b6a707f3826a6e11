use std::collections::{BTreeMap, BTreeSet};

use dioxus::prelude::{use_signal, Signal};
use rfd::{MessageButtons, MessageDialog, MessageLevel};

use crate::domain::entities::chart::{ChartModel, Horizon, Metric};
use crate::platform::desktop::debounce::Debouncer;
use crate::usecase::ports::fund_source::Canceller;
use crate::usecase::services::table_service::TableService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Screener,
    Compare,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

/// Which text box a debounced keystroke belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterTarget {
    Global,
    Column(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeDrag {
    pub column: String,
    pub start_x: f64,
    pub start_width: f64,
}

#[derive(Clone, Copy, PartialEq)]
pub struct AppState {
    pub tab: Signal<Tab>,
    pub load_state: Signal<LoadState>,
    pub reload_seq: Signal<u64>,
    pub canceller: Signal<Option<Canceller>>,
    pub table: Signal<Option<TableService>>,
    pub status: Signal<String>,
    pub show_column_picker: Signal<bool>,
    pub column_draft: Signal<BTreeSet<String>>,
    pub filter_inputs: Signal<BTreeMap<FilterTarget, String>>,
    pub filter_debounce: Signal<BTreeMap<FilterTarget, Debouncer<String>>>,
    pub resize_drag: Signal<Option<ResizeDrag>>,
    pub selected_funds: Signal<BTreeSet<usize>>,
    pub horizon: Signal<Horizon>,
    pub metric: Signal<Metric>,
    pub chart: Signal<Option<ChartModel>>,
    pub hover_month: Signal<Option<u32>>,
    pub pan_anchor: Signal<Option<(f64, f64)>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            tab: use_signal(|| Tab::Screener),
            load_state: use_signal(|| LoadState::Loading),
            reload_seq: use_signal(|| 0_u64),
            canceller: use_signal(|| None::<Canceller>),
            table: use_signal(|| None::<TableService>),
            status: use_signal(|| "Loading funds...".to_string()),
            show_column_picker: use_signal(|| false),
            column_draft: use_signal(BTreeSet::<String>::new),
            filter_inputs: use_signal(BTreeMap::<FilterTarget, String>::new),
            filter_debounce: use_signal(BTreeMap::<FilterTarget, Debouncer<String>>::new),
            resize_drag: use_signal(|| None::<ResizeDrag>),
            selected_funds: use_signal(BTreeSet::<usize>::new),
            horizon: use_signal(Horizon::default),
            metric: use_signal(Metric::default),
            chart: use_signal(|| None::<ChartModel>),
            hover_month: use_signal(|| None::<u32>),
            pan_anchor: use_signal(|| None::<(f64, f64)>),
        }
    }
}

/// Drops every typed-but-uncommitted filter so no pending timer can apply a
/// stale value to a freshly loaded or cleared table.
pub fn discard_filter_drafts(
    inputs: &mut BTreeMap<FilterTarget, String>,
    debouncers: &mut BTreeMap<FilterTarget, Debouncer<String>>,
) {
    for debouncer in debouncers.values_mut() {
        debouncer.cancel();
    }
    inputs.clear();
}

/// Blocking warning box; nothing in the app state changes behind it.
pub fn show_warning(message: &str) {
    tracing::warn!(warning = message, "showing warning dialog");
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Fund Screener")
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}
