use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::{ProjectDirs, UserDirs};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod domain;
mod infra;
mod platform;
mod ui;
mod usecase;

#[cfg(test)]
mod tests;

use app::App;

const DEFAULT_LOG_FILTER: &str = "fund_screener=info";

fn main() {
    init_tracing();

    let webview_data_dir =
        default_webview_data_dir().expect("should resolve and create WebView2 data directory");
    tracing::info!(dir = %webview_data_dir.display(), "starting fund screener");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title("Fund Screener"))
                .with_data_directory(webview_data_dir),
        )
        .launch(App);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // A second init (tests, hot reload) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

fn default_webview_data_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "fundscreener", "fund-screener")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    ensure_webview_data_dir(project_dirs.data_local_dir())
}

/// Where the save dialog opens for CSV exports.
pub(crate) fn default_export_dir() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;
    dirs.download_dir()
        .or_else(|| Some(dirs.home_dir()))
        .map(Path::to_path_buf)
}
