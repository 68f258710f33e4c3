//! 📡 The filtered stream - one long-lived GET, an endless body, one tweet per line.
//!
//! 🧠 Knowledge graph:
//! - `open_stream` sends the GET with the fixed field expansions, checks the status,
//!   and spawns a reader task. The caller gets a [`TweetStream`] back immediately.
//! - The reader task pulls body chunks, frames them into CRLF-delimited lines
//!   ([`LineFramer`]), decodes each line into a [`StreamMessage`], and pushes it into
//!   a small bounded channel.
//! - Blank lines are keep-alives. The provider sends them so we know it still loves us.
//! - When the body ends or errors, the reader flips `connected` to false and leaves.
//!   The relay notices on its next liveness check.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use async_channel::{Receiver, Sender};
use async_trait::async_trait;
use reqwest::Response;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::TwitterClient;
use crate::backends::MessageStream;
use crate::common::StreamMessage;

const STREAM_PATH: &str = "/2/tweets/search/stream";

/// 🔧 Which extra fields the provider should expand on each tweet.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StreamOptions {
    pub expansions: &'static [&'static str],
    pub tweet_fields: &'static [&'static str],
    pub user_fields: &'static [&'static str],
    pub place_fields: &'static [&'static str],
}

/// 🏀 Authors, places, mentions, and whatever got quoted or replied to. The works.
pub(crate) const NBA_STREAM_OPTIONS: StreamOptions = StreamOptions {
    expansions: &[
        "entities.mentions.username",
        "author_id",
        "geo.place_id",
        "in_reply_to_user_id",
        "referenced_tweets.id",
        "referenced_tweets.id.author_id",
    ],
    tweet_fields: &[
        "context_annotations",
        "author_id",
        "conversation_id",
        "created_at",
        "entities",
        "geo",
        "in_reply_to_user_id",
        "lang",
        "possibly_sensitive",
        "referenced_tweets",
        "source",
    ],
    user_fields: &["name", "location", "description", "entities", "id", "username"],
    place_fields: &[
        "country",
        "country_code",
        "full_name",
        "geo",
        "name",
        "id",
        "place_type",
    ],
};

impl StreamOptions {
    fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("expansions", self.expansions.join(",")),
            ("tweet.fields", self.tweet_fields.join(",")),
            ("user.fields", self.user_fields.join(",")),
            ("place.fields", self.place_fields.join(",")),
        ]
    }
}

/// 📡 Handle to an open stream: a channel of decoded tweets plus a liveness flag.
#[derive(Debug)]
pub(crate) struct TweetStream {
    rx: Receiver<StreamMessage>,
    connected: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

/// 🚀 Open the filtered stream. Non-2xx or a transport failure is an `Err` (fatal upstream).
pub(crate) async fn open_stream(
    client: &TwitterClient,
    options: &StreamOptions,
    channel_capacity: usize,
) -> Result<TweetStream> {
    info!("📡 Opening the filtered stream");

    let response = client
        .get(STREAM_PATH, &options.query())?
        .send()
        .await
        .context("💀 Couldn't open the filtered stream. The provider didn't pick up.")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!(
            "💀 The provider refused to open the stream with '{}'. It said: '{}'. \
             A 429 here usually means another connection is still hogging the stream.",
            status,
            body
        );
    }

    let (tx, rx) = async_channel::bounded(channel_capacity);
    let connected = Arc::new(AtomicBool::new(true));
    let reader = tokio::spawn(read_stream(response, tx, Arc::clone(&connected)));

    Ok(TweetStream {
        rx,
        connected,
        reader: Some(reader),
    })
}

// 🧵 The reader task. Lives until the body ends, the body errors, or nobody's listening.
async fn read_stream(mut response: Response, tx: Sender<StreamMessage>, connected: Arc<AtomicBool>) {
    let mut framer = LineFramer::default();

    'body: loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                for line in framer.push(&chunk) {
                    let Some(message) = decode_line(&line) else {
                        continue;
                    };
                    if tx.send(message).await.is_err() {
                        debug!("🔇 Nobody is listening to the stream anymore. Reader stepping out.");
                        break 'body;
                    }
                }
            }
            Ok(None) => {
                info!("🏁 The provider ended the stream body");
                break;
            }
            Err(err) => {
                error!("💀 Reading the stream body failed: {:#}", err);
                break;
            }
        }
    }

    connected.store(false, Ordering::Release);
}

fn decode_line(line: &[u8]) -> Option<StreamMessage> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text,
        Err(err) => {
            warn!("⚠️ Skipping a stream line that isn't UTF-8: {}", err);
            return None;
        }
    };

    match StreamMessage::from_line(text) {
        Ok(message) => message,
        Err(err) => {
            warn!("⚠️ Skipping an undecodable stream line: {:#}", err);
            None
        }
    }
}

#[async_trait]
impl MessageStream for TweetStream {
    fn try_next(&mut self) -> Option<StreamMessage> {
        self.rx.try_recv().ok()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.rx.close();
        self.connected.store(false, Ordering::Release);
        debug!("🗑️ Stream connection closed");
    }
}

/// 📏 Longest partial line we'll hold while waiting for its newline. Tweets with every
/// expansion turned on run to tens of KiB, so anything past this is not a tweet.
const MAX_PENDING_LINE_BYTES: usize = 4 * 1024 * 1024;

/// ✂️ Splits a chunked body into lines. Chunks don't respect line boundaries,
/// so the tail of one chunk waits in `pending` for the head of the next.
#[derive(Debug, Default)]
struct LineFramer {
    pending: Vec<u8>,
    /// `true` while skipping the rest of an oversized line, up to its newline.
    discarding: bool,
}

impl LineFramer {
    /// Returns complete, non-blank lines with `\r\n` (or `\n`) stripped.
    fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        for newline_at in memchr::memchr_iter(b'\n', &self.pending) {
            if self.discarding {
                self.discarding = false;
                start = newline_at + 1;
                continue;
            }
            let line = &self.pending[start..newline_at];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.iter().all(u8::is_ascii_whitespace) {
                trace!("💓 keep-alive");
            } else {
                lines.push(line.to_vec());
            }
            start = newline_at + 1;
        }
        self.pending.drain(..start);

        if self.pending.len() > MAX_PENDING_LINE_BYTES {
            warn!(
                "⚠️ {} bytes and still no newline. Dropping the partial line and skipping to the next one.",
                self.pending.len()
            );
            self.pending.clear();
            self.discarding = true;
        }
        lines
    }
}
