//! # 🐦 THE TWITTER BACKEND
//!
//! *Previously, on Tipoff...*
//!
//! 🎬 COLD OPEN - INT. NEWSROOM - TRADE DEADLINE, 2:58 PM
//!
//! Two minutes to the deadline. Every insider on earth has their thumb hovering
//! over "Post". The filtered stream is open. The rule says `nba`. The rule is
//! not subtle. The rule catches everything.
//!
//! This module is the upstream half of the relay: an HTTP client that knows the
//! provider's host, wears the bearer token on every request, registers the
//! topic rule once, and then holds the stream open for as long as the provider
//! will let it.
//!
//! 🦆 (mandatory duck, no context provided, none shall be requested)

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, Url};

use crate::app_config::TwitterConfig;

pub(crate) mod auth;
pub(crate) mod rules;
pub(crate) mod stream;

pub(crate) use auth::BearerAuth;
pub(crate) use rules::{NBA_RULE, register_rule};
pub(crate) use stream::{NBA_STREAM_OPTIONS, TweetStream, open_stream};

/// 📡 The upstream HTTP client: host + bearer token + a reusable `reqwest::Client`.
#[derive(Debug, Clone)]
pub(crate) struct TwitterClient {
    http: reqwest::Client,
    host: String,
    auth: BearerAuth,
}

impl TwitterClient {
    /// 🚀 Builds the client. Connect timeout only: the stream is meant to stay open
    /// for hours, so a total request timeout would hang up on it mid-sentence.
    pub(crate) fn new(config: &TwitterConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("💀 The HTTP client refused to be born. The TLS stack wept. Probably a cursed system cert store.")?;

        Ok(Self {
            http,
            host: config.host.clone(),
            auth: BearerAuth::new(config.token.clone()),
        })
    }

    // 📐 trim_end_matches('/') - one slash of difference, infinite suffering of difference.
    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let base = format!("{}{}", self.host.trim_end_matches('/'), path);
        Url::parse_with_params(&base, query)
            .with_context(|| format!("💀 '{}' is not a URL. The host config took a wrong turn.", base))
    }

    pub(crate) fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RequestBuilder> {
        Ok(self.auth.authorize(self.http.get(self.url(path, query)?)))
    }

    pub(crate) fn post(&self, path: &str, query: &[(&str, String)]) -> Result<RequestBuilder> {
        Ok(self.auth.authorize(self.http.post(self.url(path, query)?)))
    }
}
