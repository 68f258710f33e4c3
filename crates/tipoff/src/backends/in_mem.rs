//! # Previously, on Tipoff...
//!
//! 🎬 The tweets were trapped. Someone had to relay them. But first, someone had
//! to prove the relay works without paying AWS a single cent. That someone was
//! this module.
//!
//! `in_mem` provides an in-memory [`MessageStream`] and [`Sink`] for tests.
//! [`InMemoryStream`] replays a scripted list of messages and can hang up when it
//! runs dry. [`InMemorySink`] records every append attempt behind an
//! `Arc<Mutex<...>>` so tests can inspect what arrived, and can be told to fail
//! specific attempts on purpose. Great for assertions. Great for trust issues.
//!
//! [`sdk_config_for`] goes the other way: real AWS clients, fake AWS. It points
//! every client at a mock server so tests can read the exact `PutRecord` bodies.
//!
//! ⚠️ This is NOT for production. It's compiled for tests only. 🦆

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_firehose::config::Credentials;

use crate::backends::{MessageStream, Sink};
use crate::common::{SinkRecord, StreamMessage};

/// 📼 A stream that plays back a tape.
#[derive(Debug, Clone)]
pub(crate) struct InMemoryStream {
    messages: VecDeque<StreamMessage>,
    /// `true` → `is_connected()` goes false as soon as the tape is empty.
    hang_up_when_drained: bool,
    /// 🔢 How many times `close()` was called. Should be one. Always one.
    pub(crate) close_calls: Arc<AtomicUsize>,
}

impl InMemoryStream {
    pub(crate) fn new(messages: Vec<StreamMessage>, hang_up_when_drained: bool) -> Self {
        Self {
            messages: messages.into(),
            hang_up_when_drained,
            close_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl MessageStream for InMemoryStream {
    fn try_next(&mut self) -> Option<StreamMessage> {
        self.messages.pop_front()
    }

    fn is_connected(&self) -> bool {
        !(self.hang_up_when_drained && self.messages.is_empty())
    }

    async fn close(&mut self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// 📦 A sink that never forgets, and sometimes refuses on cue.
#[derive(Debug, Clone)]
pub(crate) struct InMemorySink {
    name: &'static str,
    destination: String,
    partition_key: Option<String>,
    relays_related_posts: bool,
    /// 💥 Zero-based attempt numbers that should fail.
    fail_on_attempts: HashSet<usize>,
    /// 🔒 Every attempt, failed or not, in order.
    pub(crate) attempted: Arc<tokio::sync::Mutex<Vec<SinkRecord>>>,
}

impl InMemorySink {
    /// 🚒 Behaves like the Firehose sink: no partition key, related tweets welcome.
    pub(crate) fn firehose_like(destination: &str) -> Self {
        Self {
            name: "in-memory firehose",
            destination: destination.to_string(),
            partition_key: None,
            relays_related_posts: true,
            fail_on_attempts: HashSet::new(),
            attempted: Arc::new(tokio::sync::Mutex::new(Vec::new())),
        }
    }

    /// 🌊 Behaves like the data stream sink: partition key, primary tweet only.
    pub(crate) fn data_stream_like(destination: &str, partition_key: &str) -> Self {
        Self {
            name: "in-memory data stream",
            destination: destination.to_string(),
            partition_key: Some(partition_key.to_string()),
            relays_related_posts: false,
            fail_on_attempts: HashSet::new(),
            attempted: Arc::new(tokio::sync::Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn failing_on(mut self, attempts: &[usize]) -> Self {
        self.fail_on_attempts = attempts.iter().copied().collect();
        self
    }
}

#[async_trait]
impl Sink for InMemorySink {
    fn name(&self) -> &str {
        self.name
    }

    fn relays_related_posts(&self) -> bool {
        self.relays_related_posts
    }

    async fn append(&mut self, data: Vec<u8>) -> Result<()> {
        let mut attempted = self.attempted.lock().await;
        let attempt = attempted.len();
        attempted.push(SinkRecord {
            destination: self.destination.clone(),
            data,
            partition_key: self.partition_key.clone(),
        });

        if self.fail_on_attempts.contains(&attempt) {
            bail!("💥 attempt {} failed on purpose. It was in the script.", attempt);
        }
        Ok(())
    }
}

/// 🧪 An `SdkConfig` aimed at `endpoint` with throwaway static credentials and no retries.
pub(crate) async fn sdk_config_for(endpoint: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new("eu-west-1"))
        .credentials_provider(Credentials::new(
            "AKIDTIPOFFTEST",
            "not-a-real-secret",
            None,
            None,
            "tipoff-tests",
        ))
        .endpoint_url(endpoint)
        .retry_config(RetryConfig::disabled())
        .load()
        .await
}
