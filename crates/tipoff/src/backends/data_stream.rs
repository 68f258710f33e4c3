//! 🌊 Kinesis Data Streams sink - the partition-keyed one.
//!
//! Every record needs a partition key. Every record gets the SAME partition key.
//! So every record lands on the same shard. Is that a scaling problem? Yes.
//! Is it our scaling problem today? Also yes, but quietly.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_kinesis::primitives::Blob;
use tracing::trace;

use crate::backends::Sink;
use crate::common::SinkRecord;

/// 🌊 Appends the primary tweet only. Related tweets stay home.
#[derive(Debug)]
pub(crate) struct DataStreamSink {
    client: aws_sdk_kinesis::Client,
    stream_name: String,
    partition_key: String,
}

impl DataStreamSink {
    pub(crate) fn new(sdk_config: &SdkConfig, stream_name: String, partition_key: String) -> Self {
        Self {
            client: aws_sdk_kinesis::Client::new(sdk_config),
            stream_name,
            partition_key,
        }
    }

    fn record(&self, data: Vec<u8>) -> SinkRecord {
        SinkRecord {
            destination: self.stream_name.clone(),
            data,
            partition_key: Some(self.partition_key.clone()),
        }
    }
}

#[async_trait]
impl Sink for DataStreamSink {
    fn name(&self) -> &str {
        "data stream"
    }

    fn relays_related_posts(&self) -> bool {
        false
    }

    async fn append(&mut self, data: Vec<u8>) -> Result<()> {
        let the_record = self.record(data);
        let byte_count = the_record.data.len();

        self.client
            .put_record()
            .stream_name(&the_record.destination)
            .data(Blob::new(the_record.data))
            .set_partition_key(the_record.partition_key)
            .send()
            .await
            .with_context(|| {
                format!(
                    "💀 PutRecord to data stream '{}' bounced. The shard said no. \
                     It might be throttled, missing, or just having a day.",
                    the_record.destination
                )
            })?;

        trace!(
            "🌊 {} bytes streamed into '{}'",
            byte_count, the_record.destination
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::in_mem::sdk_config_for;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PUT_RECORD_TARGET: &str = "Kinesis_20131202.PutRecord";

    #[tokio::test]
    async fn the_one_where_every_record_carries_the_same_partition_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", PUT_RECORD_TARGET))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"ShardId":"shardId-000000000000","SequenceNumber":"49590338271490256608559692538361571095921575989136588898"}"#,
                "application/x-amz-json-1.1",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let mut sink = DataStreamSink::new(
            &sdk_config_for(&server.uri()).await,
            "nba-stream".to_string(),
            "partitionkey".to_string(),
        );
        sink.append(br#"{"id":"2"}"#.to_vec())
            .await
            .expect("💀 A 200 from Kinesis should be a success");

        let requests = server
            .received_requests()
            .await
            .expect("💀 Request recording should be on by default");
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value =
            serde_json::from_slice(&requests[0].body).expect("💀 PutRecord body should be JSON");
        assert_eq!(body["StreamName"], "nba-stream");
        assert_eq!(body["PartitionKey"], "partitionkey");
        // base64 of {"id":"2"}
        assert_eq!(body["Data"], "eyJpZCI6IjIifQ==");
    }

    #[tokio::test]
    async fn the_one_where_the_shard_says_no() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", PUT_RECORD_TARGET))
            .respond_with(ResponseTemplate::new(500).set_body_raw(
                r#"{"__type":"InternalFailureException","message":"not today"}"#,
                "application/x-amz-json-1.1",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let mut sink = DataStreamSink::new(
            &sdk_config_for(&server.uri()).await,
            "nba-stream".to_string(),
            "partitionkey".to_string(),
        );
        let result = sink.append(br#"{"id":"2"}"#.to_vec()).await;

        let err = result.expect_err("💀 A 500 should come back as an error, not a shrug");
        assert!(format!("{:#}", err).contains("nba-stream"));
    }
}
