//! Single-video vs multi-video pack classification.

use serde::Serialize;

use crate::services::file_utils::has_extension;

/// Classification of a torrent's member-file manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackVerdict {
    pub video_count: usize,
    pub is_pack: bool,
}

/// Count the video-typed members of a manifest. A torrent is a pack iff it
/// holds more than one video; empty and single-video manifests are not
/// packs.
pub fn classify(manifest: &[String], video_extensions: &[String]) -> PackVerdict {
    let video_count = manifest
        .iter()
        .filter(|path| has_extension(path, video_extensions))
        .count();

    PackVerdict {
        video_count,
        is_pack: video_count > 1,
    }
}
