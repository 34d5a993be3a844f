//! Reconciliation engine services

pub mod file_utils;
pub mod pack_classifier;
pub mod path_normalizer;
pub mod real_debrid;
pub mod reconciler;
pub mod sibling_resolver;
pub mod stash;
pub mod torrent_matcher;

use crate::config::Config;
use crate::error::SweepError;
use real_debrid::RealDebridClient;
use reconciler::{Reconciler, SweepRequest, SweepResponse};
use stash::{LibraryStore, StashClient};

/// Resolve credentials, build the collaborator clients, and serve one
/// request end to end. Every failure lands in the error payload.
pub async fn run(request: SweepRequest, config: &Config) -> SweepResponse {
    match serve(request, config).await {
        Ok(response) => response,
        Err(err) => SweepResponse::Error {
            error: err.to_string(),
        },
    }
}

async fn serve(request: SweepRequest, config: &Config) -> Result<SweepResponse, SweepError> {
    let api_key = config
        .resolve_stash_api_key()
        .ok_or(SweepError::CredentialMissing("Stash API key"))?;
    let stash = StashClient::new(config.stash_url.clone(), api_key, config.request_timeout)
        .map_err(SweepError::upstream)?;

    // The Real-Debrid token lives in Stash's stored plugin configuration
    let token = stash
        .plugin_setting(&config.plugin_id, "rd_api_key")
        .await
        .map_err(SweepError::upstream)?
        .ok_or(SweepError::CredentialMissing(
            "Real-Debrid API token in plugin settings",
        ))?;
    let debrid = RealDebridClient::new(config.debrid_api_url.clone(), token, config.request_timeout)
        .map_err(SweepError::upstream)?;

    let reconciler = Reconciler::new(&stash, &debrid, config);
    Ok(reconciler.handle(request).await)
}
