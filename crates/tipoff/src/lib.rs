//! 🏀 tipoff - relays a filtered tweet stream into Kinesis.
//!
//! The whole show, in order:
//! 1. 📜 register the topic rule (fatal if it fails)
//! 2. 📡 open the filtered stream (fatal if it fails)
//! 3. 🚰 build whichever sinks are configured
//! 4. 🔄 relay until Ctrl+C, SIGTERM, or the provider hangs up
//!
//! 🦆

pub mod app_config;
pub mod common;
pub mod credentials;
mod backends;
mod relay;

use std::future::Future;

use anyhow::{Context, Result};
use tracing::info;

use crate::app_config::AppConfig;
use crate::backends::StreamBackend;
use crate::backends::twitter::{self, NBA_RULE, NBA_STREAM_OPTIONS, TwitterClient};
use crate::relay::Relay;

pub use crate::relay::{RelayExit, shutdown_signal};

/// 🚀 SEND IT. Runs until an OS signal or an upstream disconnect.
pub async fn run(app_config: AppConfig) -> Result<RelayExit> {
    run_until(app_config, shutdown_signal()).await
}

/// 🚀 Same as [`run`], with the caller choosing what "stop" means.
pub async fn run_until<F>(app_config: AppConfig, shutdown: F) -> Result<RelayExit>
where
    F: Future<Output = ()>,
{
    let client = TwitterClient::new(&app_config.twitter)?;

    twitter::register_rule(&client, &NBA_RULE)
        .await
        .context("💀 Couldn't register the stream rule. Without a rule the stream has nothing to say, so we're not starting.")?;

    let stream = twitter::open_stream(
        &client,
        &NBA_STREAM_OPTIONS,
        app_config.twitter.channel_capacity,
    )
    .await
    .context("💀 Couldn't open the filtered stream. No stream, no relay.")?;

    let sinks = backends::build_sinks(&app_config.credentials, &app_config.sinks).await;

    let exit = Relay::new(sinks)
        .run(StreamBackend::Twitter(stream), shutdown)
        .await;

    info!("🏁 Relay stopped: {:?}", exit);
    Ok(exit)
}
