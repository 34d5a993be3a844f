//! Two-phase check/delete reconciliation between the library and the debrid
//! service.
//!
//! `check` is advisory: it matches the scene's file to a remote torrent,
//! classifies the torrent as single-video or pack, and lists the sibling
//! scenes sharing its folder. `delete` is destructive and strictly ordered:
//! the remote torrent is deleted first, and only after the remote service
//! confirms are the listed scenes removed locally, each one best-effort.
//! Nothing is held between the two phases; the caller re-supplies the
//! torrent id and scene set it took from the check report.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::SweepError;
use crate::services::pack_classifier::classify;
use crate::services::path_normalizer::{folder_base_name, split_parent};
use crate::services::real_debrid::DebridService;
use crate::services::sibling_resolver::SiblingResolver;
use crate::services::stash::{LibraryStore, SceneSummary};
use crate::services::torrent_matcher::{MatchConfidence, TorrentMatcher};

/// One reconciliation request. The correlation token only ties a check and
/// its follow-up delete together in logs and reports; no state is kept
/// under it.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SweepRequest {
    Check {
        scene_id: String,
        #[serde(default)]
        correlation: Option<String>,
    },
    Delete {
        torrent_id: String,
        scene_ids: Vec<String>,
        #[serde(default)]
        correlation: Option<String>,
    },
}

/// The JSON object emitted for every request
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SweepResponse {
    Check(CheckReport),
    Delete(DeleteReport),
    Error { error: String },
}

/// Advisory report from the check phase; no mutation has occurred
#[derive(Debug, Serialize)]
pub struct CheckReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<String>,
    pub torrent_id: String,
    pub torrent_name: String,
    pub confidence: MatchConfidence,
    pub video_count: usize,
    pub is_pack: bool,
    pub folder: String,
    pub siblings: Vec<SceneSummary>,
}

/// Outcome of one local scene deletion
#[derive(Debug, Serialize)]
pub struct SceneOutcome {
    pub id: String,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report from the delete phase. `deleted_scenes` counts local successes;
/// partial failure is not an error.
#[derive(Debug, Serialize)]
pub struct DeleteReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<String>,
    pub torrent_id: String,
    pub deleted_scenes: usize,
    pub scenes: Vec<SceneOutcome>,
}

/// Orchestrates the two phases against the collaborator seams
pub struct Reconciler<'a> {
    library: &'a dyn LibraryStore,
    debrid: &'a dyn DebridService,
    config: &'a Config,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        library: &'a dyn LibraryStore,
        debrid: &'a dyn DebridService,
        config: &'a Config,
    ) -> Self {
        Self {
            library,
            debrid,
            config,
        }
    }

    /// Dispatch a request; every failure is folded into the error payload
    pub async fn handle(&self, request: SweepRequest) -> SweepResponse {
        let result = match request {
            SweepRequest::Check {
                scene_id,
                correlation,
            } => self.check(&scene_id).await.map(|mut report| {
                report.correlation = correlation;
                SweepResponse::Check(report)
            }),
            SweepRequest::Delete {
                torrent_id,
                scene_ids,
                correlation,
            } => self
                .delete(&torrent_id, &scene_ids)
                .await
                .map(|mut report| {
                    report.correlation = correlation;
                    SweepResponse::Delete(report)
                }),
        };

        result.unwrap_or_else(|err| SweepResponse::Error {
            error: err.to_string(),
        })
    }

    /// Check phase: locate the torrent behind a scene and report what a
    /// delete would take with it.
    pub async fn check(&self, scene_id: &str) -> Result<CheckReport, SweepError> {
        let scene = self
            .library
            .find_scene(scene_id)
            .await
            .map_err(SweepError::upstream)?
            .ok_or_else(|| SweepError::NoFilesLinked(scene_id.to_string()))?;

        let file = scene
            .files
            .first()
            .ok_or_else(|| SweepError::NoFilesLinked(scene_id.to_string()))?;

        let (folder, basename) = split_parent(&file.path);
        let folder_name = folder_base_name(folder);
        debug!(
            scene_id = %scene_id,
            folder = %folder,
            basename = %basename,
            "Checking scene against remote listing"
        );

        let matcher = TorrentMatcher::new(
            self.debrid,
            &self.config.generic_folders,
            self.config.torrent_page_limit,
        );
        let matched = matcher
            .find_torrent(folder_name, basename)
            .await
            .ok_or_else(|| SweepError::TorrentNotFound(basename.to_string()))?;

        let verdict = classify(&matched.manifest, &self.config.video_extensions);

        let resolver = SiblingResolver::new(self.library);
        let siblings = resolver.find_siblings(folder, scene_id).await;

        info!(
            scene_id = %scene_id,
            torrent_id = %matched.id,
            torrent_name = %matched.filename,
            video_count = verdict.video_count,
            is_pack = verdict.is_pack,
            siblings = siblings.len(),
            "Check complete"
        );

        Ok(CheckReport {
            correlation: None,
            torrent_id: matched.id,
            torrent_name: matched.filename,
            confidence: matched.confidence,
            video_count: verdict.video_count,
            is_pack: verdict.is_pack,
            folder: folder.to_string(),
            siblings,
        })
    }

    /// Delete phase: remote first, then each listed scene best-effort
    pub async fn delete(
        &self,
        torrent_id: &str,
        scene_ids: &[String],
    ) -> Result<DeleteReport, SweepError> {
        let torrent_id = torrent_id.trim();
        if torrent_id.is_empty()
            || torrent_id.eq_ignore_ascii_case("undefined")
            || torrent_id.eq_ignore_ascii_case("null")
        {
            return Err(SweepError::InvalidTorrentId(torrent_id.to_string()));
        }

        // Remote delete must succeed before any local scene is touched
        self.debrid.delete_torrent(torrent_id).await?;
        info!(torrent_id = %torrent_id, "Remote torrent deleted");

        let mut scenes = Vec::with_capacity(scene_ids.len());
        for id in scene_ids {
            match self.library.destroy_scene(id).await {
                Ok(()) => {
                    debug!(scene_id = %id, "Scene deleted from library");
                    scenes.push(SceneOutcome {
                        id: id.clone(),
                        deleted: true,
                        error: None,
                    });
                }
                Err(err) => {
                    warn!(scene_id = %id, error = %err, "Scene delete failed, continuing");
                    scenes.push(SceneOutcome {
                        id: id.clone(),
                        deleted: false,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        let deleted_scenes = scenes.iter().filter(|s| s.deleted).count();
        info!(
            torrent_id = %torrent_id,
            deleted_scenes,
            requested = scene_ids.len(),
            "Delete complete"
        );

        Ok(DeleteReport {
            correlation: None,
            torrent_id: torrent_id.to_string(),
            deleted_scenes,
            scenes,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::config::GENERIC_FOLDERS;
    use crate::services::file_utils::VIDEO_EXTENSIONS;
    use crate::services::real_debrid::TorrentSummary;
    use crate::services::stash::{Scene, SceneFile};

    fn test_config() -> Config {
        Config {
            stash_url: "http://localhost:9999/graphql".to_string(),
            stash_api_key: Some("test".to_string()),
            stash_config_path: "/nonexistent".into(),
            debrid_api_url: "http://localhost:1/rest/1.0".to_string(),
            plugin_id: "realDebridDeleter".to_string(),
            request_timeout: Duration::from_secs(1),
            torrent_page_limit: 100,
            generic_folders: GENERIC_FOLDERS.iter().map(|s| s.to_string()).collect(),
            video_extensions: VIDEO_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[derive(Default)]
    struct FakeLibrary {
        scenes: Vec<Scene>,
        failing_deletes: HashSet<String>,
        deleted: Mutex<Vec<String>>,
    }

    impl FakeLibrary {
        fn scene(id: &str, paths: &[&str]) -> Scene {
            Scene {
                id: id.to_string(),
                title: Some(format!("Scene {id}")),
                files: paths
                    .iter()
                    .map(|p| SceneFile {
                        path: p.to_string(),
                        basename: p.rsplit('/').next().unwrap_or(p).to_string(),
                    })
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl LibraryStore for FakeLibrary {
        async fn find_scene(&self, id: &str) -> Result<Option<Scene>> {
            Ok(self.scenes.iter().find(|s| s.id == id).cloned())
        }

        async fn find_scenes_by_path(&self, fragment: &str) -> Result<Vec<Scene>> {
            Ok(self
                .scenes
                .iter()
                .filter(|s| s.files.iter().any(|f| f.path.contains(fragment)))
                .cloned()
                .collect())
        }

        async fn destroy_scene(&self, id: &str) -> Result<()> {
            if self.failing_deletes.contains(id) {
                return Err(anyhow!("scene {id} is locked"));
            }
            self.deleted.lock().unwrap().push(id.to_string());
            Ok(())
        }

        async fn plugin_setting(&self, _plugin_id: &str, _key: &str) -> Result<Option<String>> {
            Ok(Some("token".to_string()))
        }
    }

    #[derive(Default)]
    struct FakeDebrid {
        torrents: Vec<(TorrentSummary, Vec<String>)>,
        fail_delete: bool,
        calls: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl FakeDebrid {
        fn with_torrent(id: &str, name: &str, files: &[&str]) -> Self {
            Self {
                torrents: vec![(
                    TorrentSummary {
                        id: id.to_string(),
                        filename: name.to_string(),
                    },
                    files.iter().map(|s| s.to_string()).collect(),
                )],
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl DebridService for FakeDebrid {
        async fn list_torrents(&self, _limit: u32) -> Result<Vec<TorrentSummary>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.torrents.iter().map(|(t, _)| t.clone()).collect())
        }

        async fn torrent_files(&self, id: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.torrents
                .iter()
                .find(|(t, _)| t.id == id)
                .map(|(_, files)| files.clone())
                .ok_or_else(|| anyhow!("unknown torrent"))
        }

        async fn delete_torrent(&self, _id: &str) -> Result<(), SweepError> {
            if self.fail_delete {
                return Err(SweepError::RemoteDeleteFailed {
                    status: 403,
                    body: "permission denied".to_string(),
                });
            }
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_check_reports_pack_and_siblings() {
        let library = FakeLibrary {
            scenes: vec![
                FakeLibrary::scene("1", &["/media/Some Show S01/ep1.mp4"]),
                FakeLibrary::scene("2", &["/media/Some Show S01/ep2.mp4"]),
                FakeLibrary::scene("3", &["/media/Other Show/ep1.mp4"]),
            ],
            ..Default::default()
        };
        let debrid = FakeDebrid::with_torrent(
            "RD1",
            "Some Show S01",
            &["/ep1.mp4", "/ep2.mp4", "/cover.jpg"],
        );
        let config = test_config();
        let reconciler = Reconciler::new(&library, &debrid, &config);

        let report = reconciler.check("1").await.unwrap();
        assert_eq!(report.torrent_id, "RD1");
        assert_eq!(report.video_count, 2);
        assert!(report.is_pack);
        assert_eq!(report.folder, "/media/Some Show S01");
        assert_eq!(report.siblings.len(), 1);
        assert_eq!(report.siblings[0].id, "2");
    }

    #[tokio::test]
    async fn test_check_without_files_makes_no_remote_calls() {
        let library = FakeLibrary {
            scenes: vec![FakeLibrary::scene("1", &[])],
            ..Default::default()
        };
        let debrid = FakeDebrid::default();
        let config = test_config();
        let reconciler = Reconciler::new(&library, &debrid, &config);

        let err = reconciler.check("1").await.unwrap_err();
        assert_matches!(err, SweepError::NoFilesLinked(_));
        assert_eq!(debrid.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_check_unknown_scene_is_no_files_linked() {
        let library = FakeLibrary::default();
        let debrid = FakeDebrid::default();
        let config = test_config();
        let reconciler = Reconciler::new(&library, &debrid, &config);

        let err = reconciler.check("missing").await.unwrap_err();
        assert_matches!(err, SweepError::NoFilesLinked(_));
        assert_eq!(debrid.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_check_with_no_match_is_torrent_not_found() {
        let library = FakeLibrary {
            scenes: vec![FakeLibrary::scene("1", &["/media/Some Show/ep1.mp4"])],
            ..Default::default()
        };
        let debrid = FakeDebrid::with_torrent("RD1", "Completely Unrelated", &[]);
        let config = test_config();
        let reconciler = Reconciler::new(&library, &debrid, &config);

        let err = reconciler.check("1").await.unwrap_err();
        assert_matches!(err, SweepError::TorrentNotFound(_));
    }

    #[tokio::test]
    async fn test_delete_rejects_sentinel_torrent_id() {
        let library = FakeLibrary::default();
        let debrid = FakeDebrid::default();
        let config = test_config();
        let reconciler = Reconciler::new(&library, &debrid, &config);

        for bad in ["", "  ", "undefined", "NULL"] {
            let err = reconciler
                .delete(bad, &["1".to_string()])
                .await
                .unwrap_err();
            assert_matches!(err, SweepError::InvalidTorrentId(_));
        }
        assert_eq!(debrid.deletes.load(Ordering::SeqCst), 0);
        assert!(library.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_aborts_before_local_deletes() {
        let library = FakeLibrary {
            scenes: vec![FakeLibrary::scene("1", &["/media/Show/ep1.mp4"])],
            ..Default::default()
        };
        let debrid = FakeDebrid {
            fail_delete: true,
            ..Default::default()
        };
        let config = test_config();
        let reconciler = Reconciler::new(&library, &debrid, &config);

        let err = reconciler
            .delete("RD1", &["1".to_string()])
            .await
            .unwrap_err();
        assert_matches!(err, SweepError::RemoteDeleteFailed { status: 403, .. });
        assert!(library.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_local_failure_is_not_fatal() {
        let library = FakeLibrary {
            failing_deletes: HashSet::from(["2".to_string()]),
            ..Default::default()
        };
        let debrid = FakeDebrid::default();
        let config = test_config();
        let reconciler = Reconciler::new(&library, &debrid, &config);

        let ids: Vec<String> = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
        let report = reconciler.delete("RD1", &ids).await.unwrap();

        assert_eq!(report.deleted_scenes, 2);
        assert_eq!(report.scenes.len(), 3);
        assert!(!report.scenes[1].deleted);
        assert!(report.scenes[1].error.is_some());
        // The failure did not stop the remaining delete from being attempted
        assert_eq!(*library.deleted.lock().unwrap(), vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_handle_folds_errors_into_payload() {
        let library = FakeLibrary::default();
        let debrid = FakeDebrid::default();
        let config = test_config();
        let reconciler = Reconciler::new(&library, &debrid, &config);

        let response = reconciler
            .handle(SweepRequest::Check {
                scene_id: "missing".to_string(),
                correlation: Some("session-1".to_string()),
            })
            .await;
        assert_matches!(response, SweepResponse::Error { .. });
    }
}
