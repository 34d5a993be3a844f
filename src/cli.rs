//! Minimal CLI parsing for the check/delete modes.

use std::env;

use anyhow::{bail, Context, Result};

use crate::services::reconciler::SweepRequest;

const USAGE: &str = "usage:\n  debrid-sweep check --scene <scene-id> [--token <correlation>]\n  debrid-sweep delete --torrent <torrent-id> --scenes '[\"<scene-id>\", ...]' [--token <correlation>]";

#[derive(Debug, Default)]
pub struct CliOptions {
    pub mode: Option<String>,
    pub scene: Option<String>,
    pub torrent: Option<String>,
    pub scenes: Option<String>,
    pub token: Option<String>,
}

impl CliOptions {
    pub fn from_args() -> Self {
        Self::parse(env::args().skip(1))
    }

    fn parse(mut args: impl Iterator<Item = String>) -> Self {
        let mut options = CliOptions::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "check" | "delete" if options.mode.is_none() => options.mode = Some(arg),
                "--scene" => options.scene = args.next(),
                "--torrent" => options.torrent = args.next(),
                "--scenes" => options.scenes = args.next(),
                "--token" => options.token = args.next(),
                _ => {}
            }
        }
        options
    }

    /// Turn parsed flags into an engine request, validating mode-specific
    /// parameters. The scene list is a JSON-encoded list of ids.
    pub fn into_request(self) -> Result<SweepRequest> {
        match self.mode.as_deref() {
            Some("check") => {
                let scene_id = match self.scene {
                    Some(id) => id,
                    None => bail!("check mode requires --scene\n{USAGE}"),
                };
                Ok(SweepRequest::Check {
                    scene_id,
                    correlation: self.token,
                })
            }
            Some("delete") => {
                let torrent_id = match self.torrent {
                    Some(id) => id,
                    None => bail!("delete mode requires --torrent\n{USAGE}"),
                };
                let scenes = match self.scenes {
                    Some(raw) => raw,
                    None => bail!("delete mode requires --scenes\n{USAGE}"),
                };
                let scene_ids: Vec<String> = serde_json::from_str(&scenes)
                    .context("--scenes must be a JSON list of scene ids")?;
                Ok(SweepRequest::Delete {
                    torrent_id,
                    scene_ids,
                    correlation: self.token,
                })
            }
            _ => bail!("{USAGE}"),
        }
    }
}
