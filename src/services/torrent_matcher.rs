//! Heuristic linkage between a local library file and a remote torrent.
//!
//! There is no shared key between the two systems, so the matcher works from
//! names: the parent folder's base name is the search term, unless that name
//! is a generic container label, in which case the file's basename is used
//! instead. A torrent is accepted when its stored name equals the term
//! exactly or contains the extension-stripped basename as a substring. The
//! first listed match wins; listing order is a best-effort heuristic, not a
//! guarantee.

use serde::Serialize;
use tracing::{debug, warn};

use crate::services::file_utils::file_stem;
use crate::services::real_debrid::DebridService;

/// How a torrent was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    /// Stored name equals the search term exactly
    ExactName,
    /// Stored name contains the file's extension-stripped basename
    BasenameSubstring,
}

/// A matched remote torrent with its member-file manifest. The manifest is
/// empty when the detail fetch failed; pack classification then sees no
/// members.
#[derive(Debug, Clone)]
pub struct TorrentMatch {
    pub id: String,
    pub filename: String,
    pub confidence: MatchConfidence,
    pub manifest: Vec<String>,
}

/// Selects the remote torrent backing a local file
pub struct TorrentMatcher<'a> {
    debrid: &'a dyn DebridService,
    generic_folders: &'a [String],
    page_limit: u32,
}

impl<'a> TorrentMatcher<'a> {
    pub fn new(
        debrid: &'a dyn DebridService,
        generic_folders: &'a [String],
        page_limit: u32,
    ) -> Self {
        Self {
            debrid,
            generic_folders,
            page_limit,
        }
    }

    /// Candidate search term: the folder name, unless it is empty or on the
    /// generic-folder denylist, in which case the file basename.
    pub fn search_term<'b>(&self, folder_name: &'b str, basename: &'b str) -> &'b str {
        let generic = folder_name.is_empty()
            || self
                .generic_folders
                .iter()
                .any(|g| g.eq_ignore_ascii_case(folder_name));
        if generic { basename } else { folder_name }
    }

    /// Search the remote listing for the torrent backing `basename` inside
    /// `folder_name`. Returns `None` when the listing call fails or no
    /// candidate is accepted.
    pub async fn find_torrent(&self, folder_name: &str, basename: &str) -> Option<TorrentMatch> {
        let term = self.search_term(folder_name, basename).to_lowercase();
        let stem = file_stem(basename).to_lowercase();

        let listing = match self.debrid.list_torrents(self.page_limit).await {
            Ok(listing) => listing,
            Err(err) => {
                warn!(error = %err, "Torrent listing failed, treating as not found");
                return None;
            }
        };

        let (summary, confidence) = listing.into_iter().find_map(|torrent| {
            let name = torrent.filename.to_lowercase();
            if name == term {
                Some((torrent, MatchConfidence::ExactName))
            } else if !stem.is_empty() && name.contains(&stem) {
                Some((torrent, MatchConfidence::BasenameSubstring))
            } else {
                None
            }
        })?;

        debug!(
            torrent_id = %summary.id,
            torrent_name = %summary.filename,
            confidence = ?confidence,
            "Matched torrent for '{}'",
            basename
        );

        let manifest = match self.debrid.torrent_files(&summary.id).await {
            Ok(files) => files,
            Err(err) => {
                warn!(
                    torrent_id = %summary.id,
                    error = %err,
                    "Torrent detail fetch failed, continuing without manifest"
                );
                Vec::new()
            }
        };

        Some(TorrentMatch {
            id: summary.id,
            filename: summary.filename,
            confidence,
            manifest,
        })
    }
}
