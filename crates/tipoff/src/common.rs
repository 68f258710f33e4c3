//! 📦 Common data structures - the building blocks of tipoff
//!
//! ---
//!
//! 🎬 COLD OPEN - INT. ARENA PRESS ROW - 11:52 PM
//!
//! 🌩️  The buzzer sounds. Somewhere, a reporter hits "Tweet". Somewhere else,
//! a rumor about a max contract escapes into the wild. Forty thousand people
//! quote it. Our stream sees all of it. Our stream judges none of it.
//!
//! ✅ And then - a `StreamMessage` arrives. It carries the tweet. It carries the
//! tweets that tweet was quoting. It carries them in order, like a responsible
//! adult carrying groceries in one trip (ALL of them, no second trips).
//!
//! 🦆
//!
//! This module defines the humble yet load-bearing structs that ferry posts
//! from the upstream firehose (the Twitter kind) to the downstream Firehose
//! (the AWS kind). Two firehoses. One crate. Zero hoses were harmed.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::value::RawValue;

/// 📡 One decoded message off the filtered stream.
///
/// `payload` is the whole raw message, byte for byte, as the provider sent it.
/// We don't re-shape it. We don't re-order keys. We don't "helpfully" pretty-print it.
/// `RawValue` keeps the bytes verbatim, so what the lake receives is what Twitter said.
///
/// `related_posts` are the `includes.tweets` entries, in the order the provider
/// returned them: quoted tweets, replied-to tweets, the whole family tree.
#[derive(Debug, Clone)]
pub struct StreamMessage {
    payload: Box<RawValue>,
    related_posts: Vec<Box<RawValue>>,
}

/// 🔍 Just enough structure to find the bits we care about. Everything else stays raw.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Box<RawValue>>,
    #[serde(default)]
    includes: Includes,
    #[serde(default)]
    errors: Option<Box<RawValue>>,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    tweets: Vec<Box<RawValue>>,
}

impl StreamMessage {
    /// 🏗️ Builds a message from an already-decoded payload and its related posts.
    pub fn new(payload: Box<RawValue>, related_posts: Vec<Box<RawValue>>) -> Self {
        Self {
            payload,
            related_posts,
        }
    }

    /// 🔬 Decode one line of the stream body.
    ///
    /// - `Ok(Some(msg))` - a real tweet, ready to relay.
    /// - `Ok(None)` - a system message (no `data`), e.g. an operational error the provider
    ///   slipped into the stream. Logged, not relayed. Nobody wants `{"errors":[...]}` in the lake.
    /// - `Err(..)` - the line was not JSON. The provider had a moment. We move on.
    pub fn from_line(line: &str) -> Result<Option<Self>> {
        let envelope: Envelope = serde_json::from_str(line).context(
            "💀 A line arrived from the stream that wasn't the JSON it promised to be. \
             It came dressed as a tweet. It was not a tweet.",
        )?;

        if envelope.data.is_none() {
            if let Some(errors) = envelope.errors {
                tracing::warn!("⚠️ Stream sent a system message instead of a tweet: {}", errors.get());
            }
            return Ok(None);
        }

        let payload = RawValue::from_string(line.to_owned())
            .context("💀 The line parsed once and then refused to parse again. Schrodinger's JSON.")?;

        Ok(Some(Self {
            payload,
            related_posts: envelope.includes.tweets,
        }))
    }

    pub fn payload(&self) -> &RawValue {
        &self.payload
    }

    /// 📎 The bundled `includes.tweets`, provider order preserved.
    pub fn related_posts(&self) -> &[Box<RawValue>] {
        &self.related_posts
    }
}

/// 📦 Serialize one payload into the bytes a sink will carry.
///
/// For a `RawValue` this is the original text, untouched. It can still fail in theory,
/// and the relay treats a failure here as "skip this one, keep going".
pub fn encode(value: &RawValue) -> Result<Vec<u8>> {
    serde_json::to_vec(value).context("💀 Couldn't turn a tweet back into bytes. The bytes were right there.")
}

/// 🎯 One record on its way to a sink - born per send attempt, gone right after.
///
/// `partition_key` is only set for partition-keyed sinks (Kinesis Data Streams).
/// Firehose doesn't care about partitions. Firehose buffers. Firehose is chill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRecord {
    pub destination: String,
    pub data: Vec<u8>,
    pub partition_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_a_tweet_brings_its_quoted_friends() {
        let line = r#"{"data":{"id":"10","text":"woj bomb"},"includes":{"tweets":[{"id":"7"},{"id":"3"}]},"matching_rules":[{"id":"1","tag":"nba tweets"}]}"#;

        let msg = StreamMessage::from_line(line)
            .expect("💀 Valid JSON should decode. The parser woke up on the wrong side of the bed.")
            .expect("💀 A line with data is a tweet, not a system message.");

        assert_eq!(msg.payload().get(), line);
        let related: Vec<&str> = msg.related_posts().iter().map(|r| r.get()).collect();
        assert_eq!(related, vec![r#"{"id":"7"}"#, r#"{"id":"3"}"#]);
    }

    #[test]
    fn the_one_where_nobody_was_quoted() {
        let msg = StreamMessage::from_line(r#"{"data":{"id":"11"}}"#)
            .expect("💀 should decode")
            .expect("💀 should be a tweet");
        assert!(msg.related_posts().is_empty());
    }

    #[test]
    fn the_one_where_the_provider_sends_a_memo_instead_of_a_tweet() {
        let decoded = StreamMessage::from_line(
            r#"{"errors":[{"title":"operational-disconnect","detail":"This stream has been disconnected"}]}"#,
        )
        .expect("💀 System messages are still JSON");
        assert!(decoded.is_none());
    }

    #[test]
    fn the_one_where_the_line_is_not_json_at_all() {
        assert!(StreamMessage::from_line("<html>rate limited lol</html>").is_err());
    }

    #[test]
    fn the_one_where_encoding_keeps_every_byte_where_it_was() {
        let raw = RawValue::from_string(r#"{"id":"1"}"#.to_string()).expect("💀 literal JSON");
        let bytes = encode(&raw).expect("💀 RawValue encodes");
        assert_eq!(bytes, br#"{"id":"1"}"#.to_vec());
    }
}
