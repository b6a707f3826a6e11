use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::domain::entities::dataset::Dataset;
use crate::usecase::ports::fund_source::{CancelToken, FundSource, HealthStatus, LoadError};

/// Large enough that the server hands back every fund in one page.
pub const FULL_PAGE_SIZE: usize = 10_000;

#[derive(Debug, Deserialize)]
struct FundsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    error: Option<String>,
}

impl FundsResponse {
    fn into_dataset(self) -> Result<Dataset, LoadError> {
        if !self.success {
            return Err(LoadError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(Dataset::from_json_rows(self.columns, self.data))
    }
}

pub struct HttpFundSource {
    client: Client,
    api_base: Url,
    timeout: Duration,
}

impl HttpFundSource {
    pub fn new(api_base: Url, timeout: Duration) -> Result<Self, LoadError> {
        let client = Client::builder()
            .build()
            .map_err(|err| LoadError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            api_base,
            timeout,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, LoadError> {
        let base = self.api_base.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}")).map_err(|err| LoadError::Transport(err.to_string()))
    }

    pub fn funds_url(&self) -> Result<Url, LoadError> {
        let mut url = self.endpoint("api/funds")?;
        url.query_pairs_mut()
            .append_pair("page", "1")
            .append_pair("per_page", &FULL_PAGE_SIZE.to_string());
        Ok(url)
    }

    async fn fetch_json<T>(&self, url: Url) -> Result<T, LoadError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| LoadError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| LoadError::Transport(err.to_string()))?;

        // Error responses still carry a JSON body with an `error` field.
        serde_json::from_slice::<T>(&body).map_err(|err| {
            if status.is_success() {
                LoadError::Decode(err.to_string())
            } else {
                LoadError::Transport(format!("{url} returned {status}"))
            }
        })
    }
}

#[async_trait]
impl FundSource for HttpFundSource {
    async fn load_funds(&self, mut cancel: CancelToken) -> Result<Dataset, LoadError> {
        if cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }
        let url = self.funds_url()?;
        tracing::info!(%url, "loading fund dataset");

        let request = async {
            let payload: FundsResponse = self.fetch_json(url).await?;
            payload.into_dataset()
        };

        let result = tokio::select! {
            outcome = tokio::time::timeout(self.timeout, request) => match outcome {
                Ok(result) => result,
                Err(_) => Err(LoadError::Timeout(self.timeout)),
            },
            _ = cancel.cancelled() => Err(LoadError::Cancelled),
        };

        match &result {
            Ok(dataset) => tracing::info!(
                funds = dataset.len(),
                columns = dataset.columns().len(),
                "fund dataset loaded"
            ),
            Err(LoadError::Cancelled) => tracing::debug!("fund dataset load cancelled"),
            Err(err) => tracing::warn!(error = %err, "fund dataset load failed"),
        }
        result
    }

    async fn health(&self) -> Result<HealthStatus, LoadError> {
        let url = self.endpoint("api/health")?;
        match tokio::time::timeout(self.timeout, self.fetch_json::<HealthStatus>(url)).await {
            Ok(result) => result,
            Err(_) => Err(LoadError::Timeout(self.timeout)),
        }
    }
}
