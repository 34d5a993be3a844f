//! debrid-sweep - Stash / Real-Debrid reconciliation tool
//!
//! Given a library scene, locates the corresponding torrent on Real-Debrid,
//! reports whether it is a multi-video pack shared by sibling scenes, and on
//! confirmation deletes the remote torrent together with the chosen scenes.
//! One invocation handles exactly one check or delete request and emits a
//! single JSON object on stdout.

mod cli;
mod config;
mod error;
mod services;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::reconciler::SweepResponse;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debrid_sweep=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let request = cli::CliOptions::from_args().into_request()?;
    let config = Config::from_env()?;

    let response = services::run(request, &config).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if matches!(response, SweepResponse::Error { .. }) {
        std::process::exit(1);
    }
    Ok(())
}
