//! 🚒 Firehose sink - the buffered one.
//!
//! Kinesis Firehose collects records, sits on them for a bit like a hen on eggs,
//! and then drops them into S3 in batches. We just hand it one record at a time
//! and let it worry about the rest. Delegation. Management would be proud.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_firehose::primitives::Blob;
use aws_sdk_firehose::types::Record;
use tracing::trace;

use crate::backends::Sink;
use crate::common::SinkRecord;

/// 🚒 Appends records to a Firehose delivery stream. Related tweets welcome.
#[derive(Debug)]
pub(crate) struct FirehoseSink {
    client: aws_sdk_firehose::Client,
    delivery_stream_name: String,
}

impl FirehoseSink {
    pub(crate) fn new(sdk_config: &SdkConfig, delivery_stream_name: String) -> Self {
        Self {
            client: aws_sdk_firehose::Client::new(sdk_config),
            delivery_stream_name,
        }
    }

    fn record(&self, data: Vec<u8>) -> SinkRecord {
        SinkRecord {
            destination: self.delivery_stream_name.clone(),
            data,
            partition_key: None,
        }
    }
}

#[async_trait]
impl Sink for FirehoseSink {
    fn name(&self) -> &str {
        "firehose"
    }

    fn relays_related_posts(&self) -> bool {
        true
    }

    /// 📡 One `PutRecord`. No retry. If AWS says no, the relay logs it and moves on.
    async fn append(&mut self, data: Vec<u8>) -> Result<()> {
        let the_record = self.record(data);
        let byte_count = the_record.data.len();

        let firehose_record = Record::builder()
            .data(Blob::new(the_record.data))
            .build()
            .context("💀 Couldn't even build a Firehose record. The builder has standards.")?;

        self.client
            .put_record()
            .delivery_stream_name(&the_record.destination)
            .record(firehose_record)
            .send()
            .await
            .with_context(|| {
                format!(
                    "💀 PutRecord to Firehose '{}' bounced. Check the stream name, the region, \
                     and whether your credentials are who they say they are.",
                    the_record.destination
                )
            })?;

        trace!(
            "🚒 {} bytes hosed into '{}'",
            byte_count, the_record.destination
        );
        Ok(())
    }
}
