//! Error taxonomy for the reconciliation engine.
//!
//! Every failure is reported inside the JSON response payload; nothing
//! propagates past the single request boundary. Local per-scene delete
//! failures are not errors at all - they are recorded in the delete report.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    /// A required credential could not be resolved from the environment,
    /// config file, or plugin settings.
    #[error("missing credential: {0}")]
    CredentialMissing(&'static str),

    /// The scene does not exist or has no file records to match against.
    #[error("scene {0} has no files linked")]
    NoFilesLinked(String),

    /// No torrent in the remote listing satisfied the match heuristic.
    #[error("no matching torrent found for '{0}'")]
    TorrentNotFound(String),

    /// The caller supplied an empty or sentinel torrent id.
    #[error("invalid torrent id '{0}'")]
    InvalidTorrentId(String),

    /// The remote service rejected the torrent delete. No local scenes are
    /// touched when this happens.
    #[error("remote delete failed with HTTP {status}: {body}")]
    RemoteDeleteFailed { status: u16, body: String },

    /// Any network or parse failure from either collaborator.
    #[error("upstream service error: {0}")]
    Upstream(anyhow::Error),
}

impl SweepError {
    pub fn upstream(err: anyhow::Error) -> Self {
        SweepError::Upstream(err)
    }
}
