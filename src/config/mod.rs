//! Runtime configuration for the sweep engine.
//!
//! Everything the engine treats as a tunable - service URLs, the request
//! timeout, the listing page cap, the generic-folder denylist, and the video
//! extension set - lives here and is passed in at construction so tests can
//! point the engine at fake endpoints.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::services::file_utils::VIDEO_EXTENSIONS;

/// Folder names too generic to use as a torrent search term. When a scene's
/// parent folder matches one of these (case-insensitive), the matcher falls
/// back to the file's basename instead.
pub const GENERIC_FOLDERS: &[&str] = &[
    "downloads",
    "download",
    "torrents",
    "torrent",
    "media",
    "videos",
    "movies",
    "tv",
    "complete",
    "completed",
    "files",
    "seeding",
    "unsorted",
    "rd",
    "realdebrid",
    "real-debrid",
];

/// Configuration loaded from environment variables, with defaults matching a
/// local Stash install and the public Real-Debrid API.
#[derive(Debug, Clone)]
pub struct Config {
    /// Stash GraphQL endpoint
    pub stash_url: String,

    /// Stash API key; when unset, a single `api_key:` line is parsed out of
    /// the Stash config file as a fallback
    pub stash_api_key: Option<String>,

    /// Stash config file used for the API key fallback
    pub stash_config_path: PathBuf,

    /// Real-Debrid REST base URL
    pub debrid_api_url: String,

    /// Plugin id under which the Real-Debrid token is stored in Stash's
    /// plugin configuration
    pub plugin_id: String,

    /// Bounded timeout applied to every HTTP call; there are no retries
    pub request_timeout: Duration,

    /// Page size cap for the single torrent listing call
    pub torrent_page_limit: u32,

    /// Denylist of generic root-folder labels (§ matcher fallback)
    pub generic_folders: Vec<String>,

    /// Recognized video container extensions (lowercase, with dot)
    pub video_extensions: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let stash_config_path = env::var("STASH_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".stash/config.yml")
            });

        Ok(Self {
            stash_url: env::var("STASH_URL")
                .unwrap_or_else(|_| "http://localhost:9999/graphql".to_string()),

            stash_api_key: env::var("STASH_API_KEY").ok(),

            stash_config_path,

            debrid_api_url: env::var("REAL_DEBRID_API_URL")
                .unwrap_or_else(|_| "https://api.real-debrid.com/rest/1.0".to_string()),

            plugin_id: env::var("SWEEP_PLUGIN_ID")
                .unwrap_or_else(|_| "realDebridDeleter".to_string()),

            request_timeout: Duration::from_secs(
                env::var("SWEEP_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("Invalid SWEEP_REQUEST_TIMEOUT_SECS")?,
            ),

            torrent_page_limit: env::var("SWEEP_TORRENT_PAGE_LIMIT")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .context("Invalid SWEEP_TORRENT_PAGE_LIMIT")?,

            generic_folders: GENERIC_FOLDERS.iter().map(|s| s.to_string()).collect(),

            video_extensions: VIDEO_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Resolve the Stash API key: environment first, then a single `api_key:`
    /// line parsed out of the Stash config file.
    pub fn resolve_stash_api_key(&self) -> Option<String> {
        if let Some(key) = &self.stash_api_key {
            return Some(key.clone());
        }

        let contents = fs::read_to_string(&self.stash_config_path).ok()?;
        contents.lines().find_map(|line| {
            let line = line.trim();
            let value = line.strip_prefix("api_key:")?.trim();
            if value.is_empty() {
                None
            } else {
                Some(value.trim_matches('"').to_string())
            }
        })
    }
}
