use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::domain::entities::dataset::Dataset;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Failed to connect to server: {0}")]
    Transport(String),
    #[error("Server did not answer within {} seconds", .0.as_secs())]
    Timeout(Duration),
    #[error("Load cancelled")]
    Cancelled,
    #[error("Unexpected response from server: {0}")]
    Decode(String),
    #[error("Failed to load data: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub records: usize,
    #[serde(default)]
    pub columns: usize,
}

/// Where the fund list comes from. Implementations hand back either the whole
/// dataset or an error, never a partial load.
#[async_trait]
pub trait FundSource: Send + Sync {
    async fn load_funds(&self, cancel: CancelToken) -> Result<Dataset, LoadError>;

    async fn health(&self) -> Result<HealthStatus, LoadError>;
}

/// Receiving half of a cancellation pair.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Sending half; dropping it without cancelling never cancels the load.
#[derive(Debug)]
pub struct Canceller {
    tx: watch::Sender<bool>,
}

pub fn cancel_pair() -> (Canceller, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (Canceller { tx }, CancelToken { rx })
}

impl Canceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
