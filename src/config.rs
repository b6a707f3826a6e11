use std::time::Duration;

use url::Url;

use crate::domain::entities::view::{DEFAULT_PER_PAGE, PER_PAGE_OPTIONS};

/// Known deployment prefix when the screener is served below the site root.
pub const SUBPATH_PREFIX: &str = "/fundscreener";

pub const DEFAULT_PAGE_URL: &str = "http://localhost:8004/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;
const DEBOUNCE_RANGE_MS: (u64, u64) = (200, 300);

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base: Url,
    pub request_timeout: Duration,
    pub debounce: Duration,
    pub per_page: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from a key lookup. Unparsable values fall back to
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = lookup("FUND_SCREENER_API_BASE")
            .and_then(|raw| parse_url("FUND_SCREENER_API_BASE", &raw))
            .unwrap_or_else(|| {
                let page_url = lookup("FUND_SCREENER_PAGE_URL")
                    .and_then(|raw| parse_url("FUND_SCREENER_PAGE_URL", &raw))
                    .unwrap_or_else(default_page_url);
                resolve_api_base(&page_url)
            });

        let timeout_secs = lookup("FUND_SCREENER_TIMEOUT_SECS")
            .and_then(|raw| parse_number::<u64>("FUND_SCREENER_TIMEOUT_SECS", &raw))
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let debounce_ms = lookup("FUND_SCREENER_DEBOUNCE_MS")
            .and_then(|raw| parse_number::<u64>("FUND_SCREENER_DEBOUNCE_MS", &raw))
            .unwrap_or(DEFAULT_DEBOUNCE_MS)
            .clamp(DEBOUNCE_RANGE_MS.0, DEBOUNCE_RANGE_MS.1);

        let per_page = lookup("FUND_SCREENER_PER_PAGE")
            .and_then(|raw| parse_number::<usize>("FUND_SCREENER_PER_PAGE", &raw))
            .filter(|value| PER_PAGE_OPTIONS.contains(value))
            .unwrap_or(DEFAULT_PER_PAGE);

        Self {
            api_base,
            request_timeout: Duration::from_secs(timeout_secs),
            debounce: Duration::from_millis(debounce_ms),
            per_page,
        }
    }
}

/// Origin plus [`SUBPATH_PREFIX`] when the page lives under it, bare origin
/// otherwise.
pub fn resolve_api_base(page_url: &Url) -> Url {
    let mut base = page_url.clone();
    base.set_query(None);
    base.set_fragment(None);
    if page_url.path().contains(SUBPATH_PREFIX) {
        base.set_path(SUBPATH_PREFIX);
    } else {
        base.set_path("");
    }
    base
}

fn default_page_url() -> Url {
    Url::parse(DEFAULT_PAGE_URL).expect("default page url should parse")
}

fn parse_url(key: &str, raw: &str) -> Option<Url> {
    match Url::parse(raw.trim()) {
        Ok(url) => Some(url),
        Err(err) => {
            tracing::warn!(key, value = raw, error = %err, "ignoring invalid url");
            None
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    let parsed = raw.trim().parse::<T>().ok();
    if parsed.is_none() {
        tracing::warn!(key, value = raw, "ignoring invalid number");
    }
    parsed
}
