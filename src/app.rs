use std::sync::Arc;

use dioxus::prelude::*;

use crate::config::AppConfig;
use crate::infra::http::fund_api::HttpFundSource;
use crate::ui::components::comparison_chart::ComparisonChart;
use crate::ui::components::fund_table::FundTable;
use crate::ui::state::app_state::{discard_filter_drafts, AppState, LoadState, Tab};
use crate::usecase::ports::fund_source::{cancel_pair, FundSource, LoadError};
use crate::usecase::services::table_service::TableService;

fn tab_button_style(active: bool) -> &'static str {
    if active {
        "border: 1px solid #2563eb; background: #2563eb; color: #fff; padding: 6px 14px; border-radius: 6px; cursor: pointer;"
    } else {
        "border: 1px solid #bbb; background: #fff; padding: 6px 14px; border-radius: 6px; cursor: pointer;"
    }
}

#[component]
pub fn App() -> Element {
    let config = use_hook(AppConfig::from_env);
    let source = use_hook(|| {
        HttpFundSource::new(config.api_base.clone(), config.request_timeout)
            .map(|source| Arc::new(source) as Arc<dyn FundSource>)
    });
    use_context_provider(|| config.clone());

    let state = AppState::new();
    use_context_provider(|| state);
    let AppState {
        mut tab,
        mut load_state,
        mut reload_seq,
        mut canceller,
        mut table,
        mut status,
        mut selected_funds,
        mut chart,
        mut filter_inputs,
        mut filter_debounce,
        ..
    } = state;

    let source = match source {
        Ok(source) => source,
        Err(err) => {
            return rsx! {
                div {
                    p { "Unable to create HTTP client: {err}" }
                }
            };
        }
    };

    let source_for_health = source.clone();
    use_hook(move || {
        spawn(async move {
            match source_for_health.health().await {
                Ok(health) => tracing::info!(
                    status = %health.status,
                    records = health.records,
                    columns = health.columns,
                    "server health"
                ),
                Err(err) => tracing::warn!(error = %err, "health check failed"),
            }
        });
    });

    let per_page = config.per_page;
    let source_for_load = source.clone();
    use_effect(move || {
        let attempt = reload_seq();
        if let Some(previous) = canceller.write().take() {
            previous.cancel();
        }
        let (next_canceller, token) = cancel_pair();
        canceller.set(Some(next_canceller));
        load_state.set(LoadState::Loading);
        *status.write() = "Loading funds...".to_string();
        tracing::debug!(attempt, "starting dataset load");

        let source = source_for_load.clone();
        spawn(async move {
            match source.load_funds(token).await {
                Ok(dataset) => {
                    if dataset.is_empty() {
                        tracing::warn!(attempt, "server returned no funds");
                    }
                    discard_filter_drafts(
                        &mut filter_inputs.write(),
                        &mut filter_debounce.write(),
                    );
                    let service = TableService::new(Arc::new(dataset), per_page);
                    *status.write() = service.table().records_summary();
                    table.set(Some(service));
                    selected_funds.write().clear();
                    chart.set(None);
                    load_state.set(LoadState::Ready);
                }
                Err(LoadError::Cancelled) => {}
                Err(err) => {
                    table.set(None);
                    *status.write() = err.to_string();
                    load_state.set(LoadState::Failed(err.to_string()));
                }
            }
        });
    });

    let loading = load_state() == LoadState::Loading;
    let api_base = config.api_base.to_string();
    let status_text = status();

    rsx! {
        div {
            style: "height: 100vh; display: flex; flex-direction: column; padding: 12px; box-sizing: border-box; font-family: system-ui, sans-serif;",
            div { style: "display: flex; align-items: center; gap: 12px; margin-bottom: 12px;",
                h2 { style: "margin: 0; flex: 1;", "Fund Screener" }
                button {
                    style: tab_button_style(tab() == Tab::Screener),
                    onclick: move |_| tab.set(Tab::Screener),
                    "Screener"
                }
                button {
                    style: tab_button_style(tab() == Tab::Compare),
                    onclick: move |_| tab.set(Tab::Compare),
                    "Compare"
                }
                button {
                    disabled: loading,
                    style: tab_button_style(false),
                    onclick: move |_| {
                        *reload_seq.write() += 1;
                    },
                    "Reload"
                }
            }
            div { style: "margin-bottom: 8px; color: #555;",
                if loading {
                    span { "Loading funds from {api_base}..." }
                } else {
                    span { "{status_text}" }
                }
            }
            div { style: "flex: 1; min-height: 0; overflow: auto;",
                if tab() == Tab::Screener {
                    FundTable {}
                } else {
                    ComparisonChart {}
                }
            }
        }
    }
}
