//! Outbound notification transport

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::error::DeliveryError;
use super::info_hash::InfoHash;

/// Pushes a batch of info hashes to a remote.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, address: &str, hashes: &[InfoHash]) -> Result<(), DeliveryError>;
}

/// POSTs the batch as a JSON array of hex strings. Only `200 OK` counts as
/// delivered.
#[derive(Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    /// Every request is bounded by `timeout`, connect included.
    pub fn new(timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, address: &str, hashes: &[InfoHash]) -> Result<(), DeliveryError> {
        let response = self.client.post(address).json(hashes).send().await?;

        let status = response.status().as_u16();
        debug!(address = %address, status, count = hashes.len(), "notification sent");
        if status != 200 {
            return Err(DeliveryError::Status(status));
        }
        Ok(())
    }
}
