//! Discovery of sibling scenes that share a torrent's folder.
//!
//! The library's path query only does substring containment, which would let
//! "Season 1" match "Season 10". The resolver re-filters candidates against
//! the normalized folder plus a separator, so only direct or nested
//! descendants of the folder survive.

use tracing::{debug, warn};

use crate::services::path_normalizer::normalize;
use crate::services::stash::{LibraryStore, SceneSummary};

pub struct SiblingResolver<'a> {
    library: &'a dyn LibraryStore,
}

impl<'a> SiblingResolver<'a> {
    pub fn new(library: &'a dyn LibraryStore) -> Self {
        Self { library }
    }

    /// Find every other scene whose file lives under `folder_path`. Library
    /// failures are reported as an empty result, never an error.
    pub async fn find_siblings(&self, folder_path: &str, exclude_id: &str) -> Vec<SceneSummary> {
        let candidates = match self.library.find_scenes_by_path(folder_path).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(
                    folder = %folder_path,
                    error = %err,
                    "Sibling query failed, treating as no siblings"
                );
                return Vec::new();
            }
        };

        let prefix = format!("{}/", normalize(folder_path));

        let siblings: Vec<SceneSummary> = candidates
            .into_iter()
            .filter(|scene| scene.id != exclude_id)
            .filter_map(|scene| {
                let file = scene
                    .files
                    .iter()
                    .find(|f| normalize(&f.path).starts_with(&prefix))?;
                Some(SceneSummary {
                    id: scene.id.clone(),
                    title: scene.title.clone(),
                    path: file.path.clone(),
                })
            })
            .collect();

        debug!(
            folder = %folder_path,
            count = siblings.len(),
            "Resolved sibling scenes"
        );
        siblings
    }
}
