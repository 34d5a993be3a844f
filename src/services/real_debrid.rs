//! Real-Debrid REST client.
//!
//! Base URL: https://api.real-debrid.com/rest/1.0
//!
//! Only the three endpoints the reconciler needs: list torrents (single
//! paginated call, capped page size), torrent detail by id, and delete by
//! id. All calls carry a bearer token and a bounded timeout; none retry.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SweepError;

/// HTTP statuses accepted as a successful torrent delete. Real-Debrid
/// answers 204 on success.
const DELETE_SUCCESS_STATUSES: &[u16] = &[200, 204];

/// Torrent record from the listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentSummary {
    pub id: String,
    pub filename: String,
}

/// Member file entry from the torrent detail endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TorrentFileEntry {
    pub path: String,
}

#[derive(Debug, Deserialize)]
struct TorrentDetail {
    #[serde(default)]
    files: Vec<TorrentFileEntry>,
}

/// Remote debrid service operations used by the reconciler
#[async_trait]
pub trait DebridService: Send + Sync {
    /// Fetch the torrent listing, capped at `limit` entries
    async fn list_torrents(&self, limit: u32) -> Result<Vec<TorrentSummary>>;

    /// Fetch the member-file manifest of one torrent
    async fn torrent_files(&self, id: &str) -> Result<Vec<String>>;

    /// Delete a torrent. Network failures map to [SweepError::Upstream],
    /// rejected statuses to [SweepError::RemoteDeleteFailed].
    async fn delete_torrent(&self, id: &str) -> Result<(), SweepError>;
}

/// HTTP-backed Real-Debrid client
pub struct RealDebridClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RealDebridClient {
    pub fn new(base_url: String, token: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }
}

#[async_trait]
impl DebridService for RealDebridClient {
    async fn list_torrents(&self, limit: u32) -> Result<Vec<TorrentSummary>> {
        let url = format!("{}/torrents?limit={}", self.base_url, limit);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Real-Debrid listing request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Real-Debrid listing returned HTTP {}", status);
        }

        let torrents: Vec<TorrentSummary> = response
            .json()
            .await
            .context("Real-Debrid listing response was not valid JSON")?;
        debug!(count = torrents.len(), "Fetched torrent listing");
        Ok(torrents)
    }

    async fn torrent_files(&self, id: &str) -> Result<Vec<String>> {
        let url = format!("{}/torrents/info/{}", self.base_url, id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Real-Debrid detail request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Real-Debrid detail returned HTTP {}", status);
        }

        let detail: TorrentDetail = response
            .json()
            .await
            .context("Real-Debrid detail response was not valid JSON")?;
        Ok(detail.files.into_iter().map(|f| f.path).collect())
    }

    async fn delete_torrent(&self, id: &str) -> Result<(), SweepError> {
        let url = format!("{}/torrents/delete/{}", self.base_url, id);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SweepError::upstream(anyhow::Error::new(e).context("Real-Debrid delete request failed")))?;

        let status = response.status().as_u16();
        if DELETE_SUCCESS_STATUSES.contains(&status) {
            debug!(torrent_id = %id, status, "Real-Debrid confirmed torrent delete");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SweepError::RemoteDeleteFailed { status, body })
    }
}
