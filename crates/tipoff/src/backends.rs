//! 🔌 Backends - where the real I/O happens.
//!
//! 🚰 The stream backend pours tweets in, the sink backends slurp them up.
//! And in between, we panic! (kidding, we log and keep going)
//!
//! 🎭 This module is the casting agency. Need tweets from the filtered stream?
//! Need to push bytes into a Firehose? Into a Kinesis Data Stream? Into a Vec,
//! because it's a test and nobody wants an AWS bill for a unit test?
//! We've got a backend for that.
//!
//! 🦆 The duck is here because every file must have one. This is law. Do not question the duck.

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::app_config::SinkSettings;
use crate::common::StreamMessage;
use crate::credentials::CredentialStrategy;

pub(crate) mod data_stream;
pub(crate) mod firehose;
#[cfg(test)]
pub(crate) mod in_mem;
pub(crate) mod twitter;

// ===== Stream Trait and Backend Enum =====

/// 🚰 A push-based stream of decoded messages, polled without blocking.
///
/// # Contract 📜
/// - `try_next` hands back a message if one is ready, `None` if not. Never waits.
/// - `is_connected` reports whether the transport is still up. Once it says `false`,
///   it means it. There is no comeback tour.
/// - `close` releases the transport. The relay calls it exactly once on the way out.
#[async_trait]
pub(crate) trait MessageStream: std::fmt::Debug {
    fn try_next(&mut self) -> Option<StreamMessage>;
    fn is_connected(&self) -> bool;
    async fn close(&mut self);
}

/// 🎭 The many faces of a stream. Mostly one face. The other face is for tests.
#[derive(Debug)]
pub(crate) enum StreamBackend {
    Twitter(twitter::TweetStream),
    #[cfg(test)]
    InMemory(in_mem::InMemoryStream),
}

#[async_trait]
impl MessageStream for StreamBackend {
    fn try_next(&mut self) -> Option<StreamMessage> {
        match self {
            StreamBackend::Twitter(stream) => stream.try_next(),
            #[cfg(test)]
            StreamBackend::InMemory(stream) => stream.try_next(),
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            StreamBackend::Twitter(stream) => stream.is_connected(),
            #[cfg(test)]
            StreamBackend::InMemory(stream) => stream.is_connected(),
        }
    }

    async fn close(&mut self) {
        match self {
            StreamBackend::Twitter(stream) => stream.close().await,
            #[cfg(test)]
            StreamBackend::InMemory(stream) => stream.close().await,
        }
    }
}

// ===== Sink Trait and Backend Enum =====

/// 🕳️ A sink that appends one record at a time - pure I/O, zero logic.
///
/// # Contract 📜
/// - `append` wraps the bytes into a [`SinkRecord`](crate::common::SinkRecord) for this
///   sink's destination and sends it. One call, one record. No retries. No buffering here
///   (Firehose does its own buffering on the AWS side, bless it).
/// - `relays_related_posts` says whether the relay should also send the bundled
///   `includes.tweets` to this sink, one record each.
/// - `name` is for log lines. Humans like names.
#[async_trait]
pub(crate) trait Sink: std::fmt::Debug {
    fn name(&self) -> &str;
    fn relays_related_posts(&self) -> bool;
    async fn append(&mut self, data: Vec<u8>) -> Result<()>;
}

/// 🎭 The many faces of a Sink - a polymorphic casting call for data destinations.
///
/// The enum dispatches to the inner concrete type, keeping the relay blissfully
/// ignorant of where data actually lands. Ignorance is a feature. It's called "abstraction."
#[derive(Debug)]
pub(crate) enum SinkBackend {
    Firehose(firehose::FirehoseSink),
    DataStream(data_stream::DataStreamSink),
    #[cfg(test)]
    InMemory(in_mem::InMemorySink),
}

#[async_trait]
impl Sink for SinkBackend {
    fn name(&self) -> &str {
        match self {
            SinkBackend::Firehose(sink) => sink.name(),
            SinkBackend::DataStream(sink) => sink.name(),
            #[cfg(test)]
            SinkBackend::InMemory(sink) => sink.name(),
        }
    }

    fn relays_related_posts(&self) -> bool {
        match self {
            SinkBackend::Firehose(sink) => sink.relays_related_posts(),
            SinkBackend::DataStream(sink) => sink.relays_related_posts(),
            #[cfg(test)]
            SinkBackend::InMemory(sink) => sink.relays_related_posts(),
        }
    }

    async fn append(&mut self, data: Vec<u8>) -> Result<()> {
        match self {
            SinkBackend::Firehose(sink) => sink.append(data).await,
            SinkBackend::DataStream(sink) => sink.append(data).await,
            #[cfg(test)]
            SinkBackend::InMemory(sink) => sink.append(data).await,
        }
    }
}

/// 🏗️ Build every sink whose destination is configured, Firehose first, then the data stream.
///
/// No destinations? No AWS config gets loaded, no clients get built, and the relay
/// will happily consume tweets into the void. Zen. 🧘
pub(crate) async fn build_sinks(
    credentials: &CredentialStrategy,
    settings: &SinkSettings,
) -> Vec<SinkBackend> {
    if settings.firehose_name.is_none() && settings.data_stream_name.is_none() {
        warn!(
            "⚠️ Neither KINESIS_FIREHOSE_NAME nor KINESIS_DATA_STREAM_NAME is set. \
             Tweets will be read and dropped on the floor."
        );
        return Vec::new();
    }

    let the_sdk_config = credentials.load_sdk_config(&settings.region).await;
    let mut sinks = Vec::with_capacity(2);

    if let Some(delivery_stream_name) = &settings.firehose_name {
        sinks.push(SinkBackend::Firehose(firehose::FirehoseSink::new(
            &the_sdk_config,
            delivery_stream_name.clone(),
        )));
    }

    if let Some(stream_name) = &settings.data_stream_name {
        sinks.push(SinkBackend::DataStream(data_stream::DataStreamSink::new(
            &the_sdk_config,
            stream_name.clone(),
            settings.partition_key.clone(),
        )));
    }

    sinks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(firehose_name: Option<&str>, data_stream_name: Option<&str>) -> SinkSettings {
        SinkSettings {
            region: "eu-west-1".to_string(),
            firehose_name: firehose_name.map(str::to_string),
            data_stream_name: data_stream_name.map(str::to_string),
            partition_key: "partitionkey".to_string(),
        }
    }

    fn lineup(sinks: &[SinkBackend]) -> Vec<(&str, bool)> {
        sinks
            .iter()
            .map(|sink| (sink.name(), sink.relays_related_posts()))
            .collect()
    }

    #[tokio::test]
    async fn the_one_where_only_the_firehose_shows_up() {
        let sinks = build_sinks(&CredentialStrategy::Ambient, &settings(Some("nba-firehose"), None)).await;

        assert_eq!(lineup(&sinks), vec![("firehose", true)]);
        assert!(matches!(sinks[0], SinkBackend::Firehose(_)));
    }

    #[tokio::test]
    async fn the_one_where_only_the_data_stream_shows_up() {
        let sinks = build_sinks(&CredentialStrategy::Ambient, &settings(None, Some("nba-stream"))).await;

        assert_eq!(lineup(&sinks), vec![("data stream", false)]);
        assert!(matches!(sinks[0], SinkBackend::DataStream(_)));
    }

    #[tokio::test]
    async fn the_one_where_both_show_up_and_firehose_goes_first() {
        let sinks = build_sinks(
            &CredentialStrategy::Ambient,
            &settings(Some("nba-firehose"), Some("nba-stream")),
        )
        .await;

        assert_eq!(lineup(&sinks), vec![("firehose", true), ("data stream", false)]);
    }

    #[tokio::test]
    async fn the_one_where_nobody_shows_up() {
        let sinks = build_sinks(&CredentialStrategy::Ambient, &settings(None, None)).await;

        assert!(sinks.is_empty());
    }
}
