//! 🔧 App Configuration - the sacred env-to-struct pipeline.
//!
//! 📡 "TWITTER_TOKEN not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." - every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment, because calling `std::env::var` in six different places
//! is how you end up with six different opinions about what the config is.
//! Everything is read ONCE, here, and handed out as one immutable [`AppConfig`].

use std::path::Path;

use anyhow::{Context, bail};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::credentials::CredentialStrategy;

/// 📡 Where the tweets come from.
pub const DEFAULT_TWITTER_HOST: &str = "https://api.twitter.com";
/// 🌍 Where the tweets go. Ireland. The tweets go to Ireland.
pub const DEFAULT_AWS_REGION: &str = "eu-west-1";
/// 🪣 One key to rule them all. Every record lands on the same shard.
/// Known scaling limit. The shard is aware. The shard is coping.
pub const DEFAULT_PARTITION_KEY: &str = "partitionkey";

// 🗝️ The environment variables we actually read. Anything else in the environment is
// none of our business. Like a good neighbor.
const RAW_ENV_KEYS: &[&str] = &[
    "TWITTER_TOKEN",
    "ENV",
    "AWS_PROFILE",
    "AWS_ASSUME_ROLE",
    "KINESIS_FIREHOSE_NAME",
    "KINESIS_DATA_STREAM_NAME",
];

/// 📦 Flat shape of everything figment can find. Not handed out. Gets assembled into
/// [`AppConfig`] so nobody downstream has to know `ENV=LOCAL` is a thing.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default)]
    twitter_token: String,
    #[serde(default)]
    env: Option<String>,
    #[serde(default)]
    aws_profile: Option<String>,
    #[serde(default)]
    aws_assume_role: Option<String>,
    #[serde(default)]
    kinesis_firehose_name: Option<String>,
    #[serde(default)]
    kinesis_data_stream_name: Option<String>,
    #[serde(default = "default_twitter_host")]
    twitter_host: String,
    #[serde(default = "default_aws_region")]
    aws_region: String,
    #[serde(default = "default_partition_key")]
    partition_key: String,
    #[serde(default = "default_channel_capacity")]
    channel_capacity: usize,
}

fn default_twitter_host() -> String {
    DEFAULT_TWITTER_HOST.to_string()
}

fn default_aws_region() -> String {
    DEFAULT_AWS_REGION.to_string()
}

fn default_partition_key() -> String {
    DEFAULT_PARTITION_KEY.to_string()
}

// 📬 16 tweets of slack between the reader and the relay. Lightly buffered, as promised.
fn default_channel_capacity() -> usize {
    16
}

/// 🐦 Upstream knobs.
#[derive(Debug, Clone)]
pub struct TwitterConfig {
    /// 🔒 Bearer token. Empty means "unauthenticated", which means "rejected". Your call.
    pub token: String,
    pub host: String,
    /// 📬 How many decoded messages may queue between the reader task and the relay.
    pub channel_capacity: usize,
}

/// 🚰 Downstream knobs. A `None` destination means that sink sits this one out.
#[derive(Debug, Clone)]
pub struct SinkSettings {
    pub region: String,
    pub firehose_name: Option<String>,
    pub data_stream_name: Option<String>,
    pub partition_key: String,
}

/// 📦 The AppConfig: one struct to rule them all, assembled once, never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub twitter: TwitterConfig,
    pub credentials: CredentialStrategy,
    pub sinks: SinkSettings,
}

impl TryFrom<RawSettings> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(raw: RawSettings) -> anyhow::Result<Self> {
        // 🎭 `ENV=LOCAL` is the only magic string. Exactly "LOCAL". Not "local". Not "Local".
        let credentials = match raw.env.as_deref() {
            Some("LOCAL") => {
                let Some(role_arn) = raw.aws_assume_role else {
                    bail!(
                        "💀 ENV=LOCAL asks us to assume a role, but AWS_ASSUME_ROLE is not set. \
                         We can't become someone if you don't tell us who."
                    );
                };
                CredentialStrategy::AssumedRole {
                    profile: raw.aws_profile.unwrap_or_else(|| "default".to_string()),
                    role_arn,
                }
            }
            _ => CredentialStrategy::Ambient,
        };

        if raw.channel_capacity == 0 {
            bail!("💀 channel_capacity must be at least 1. A zero-slot mailbox is just a wall.");
        }

        Ok(AppConfig {
            twitter: TwitterConfig {
                token: raw.twitter_token,
                host: raw.twitter_host,
                channel_capacity: raw.channel_capacity,
            },
            credentials,
            sinks: SinkSettings {
                region: raw.aws_region,
                firehose_name: raw.kinesis_firehose_name,
                data_stream_name: raw.kinesis_data_stream_name,
                partition_key: raw.partition_key,
            },
        })
    }
}

/// 🚀 Load the config - from the environment, and optionally from a TOML file.
///
/// 📐 Layering (later wins):
///   1. The plain env vars: `TWITTER_TOKEN`, `ENV`, `AWS_PROFILE`, `AWS_ASSUME_ROLE`,
///      `KINESIS_FIREHOSE_NAME`, `KINESIS_DATA_STREAM_NAME`.
///   2. `TIPOFF_*` env vars for the extra knobs (`TIPOFF_TWITTER_HOST`, `TIPOFF_AWS_REGION`, ...).
///   3. The TOML file, if one was given. Keys are the lowercase names of the above.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new()
        .merge(Env::raw().only(RAW_ENV_KEYS))
        .merge(Env::prefixed("TIPOFF_"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and the environment. \
             The file exists in our hearts, but apparently not in a shape serde likes.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from the environment. \
                 No file was provided, so this one's all on the env vars. Classic."
            .to_string(),
    };

    let raw: RawSettings = config.extract().context(context_msg)?;
    AppConfig::try_from(raw)
}
