use bytes::{BufMut, BytesMut};
use tracing::trace;

use super::varint::PutVarint;
use crate::adapters::protocol::constants::TAG_BUFFER;
use crate::adapters::protocol::dto::{
    ApiVersion, DescribeTopicPartitionsResponse, KafkaResponse, PartitionResponse,
    ResponsePayload, TopicResponse,
};

#[derive(Debug, Clone, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, response: &KafkaResponse) -> Vec<u8> {
        match &response.payload {
            ResponsePayload::ApiVersions(api_versions) => self.encode_api_versions_response(
                response.correlation_id,
                api_versions.error_code,
                &api_versions.api_versions,
            ),
            ResponsePayload::DescribeTopicPartitions(describe) => {
                self.encode_describe_topic_partitions_response(response.correlation_id, describe)
            }
        }
    }

    pub fn encode_api_versions_response(
        &self,
        correlation_id: i32,
        error_code: i16,
        supported_apis: &[ApiVersion],
    ) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_i32(0); // size, patched below
        buf.put_i32(correlation_id);
        buf.put_i16(error_code);

        buf.put_compact_len(supported_apis.len());
        for api in supported_apis {
            buf.put_i16(api.api_key);
            buf.put_i16(api.min_version);
            buf.put_i16(api.max_version);
            buf.put_u8(TAG_BUFFER);
        }

        buf.put_i32(0); // throttle time ms
        buf.put_u8(TAG_BUFFER);

        finish(buf)
    }

    pub fn encode_describe_topic_partitions_response(
        &self,
        correlation_id: i32,
        response: &DescribeTopicPartitionsResponse,
    ) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_i32(0); // size, patched below
        buf.put_i32(correlation_id);
        buf.put_u8(TAG_BUFFER);

        buf.put_i32(response.throttle_time_ms);
        buf.put_compact_len(response.topics.len());
        for topic in &response.topics {
            self.encode_topic(topic, &mut buf);
        }

        buf.put_u8(response.next_cursor);
        buf.put_u8(TAG_BUFFER);

        finish(buf)
    }

    fn encode_topic(&self, topic: &TopicResponse, buf: &mut BytesMut) {
        buf.put_i16(topic.error_code);
        buf.put_compact_len(topic.topic_name.len());
        buf.put_slice(topic.topic_name.as_bytes());
        buf.put_u8(TAG_BUFFER);
        buf.put_slice(topic.topic_id.as_bytes());
        buf.put_u8(topic.is_internal as u8);

        buf.put_compact_len(topic.partitions.len());
        for partition in &topic.partitions {
            self.encode_partition(partition, buf);
        }

        buf.put_i32(topic.topic_authorized_operations);
        buf.put_u8(TAG_BUFFER);
    }

    fn encode_partition(&self, partition: &PartitionResponse, buf: &mut BytesMut) {
        buf.put_i16(partition.error_code);
        buf.put_i32(partition.partition_index);
        buf.put_i32(partition.leader_id);
        buf.put_i32(partition.leader_epoch);
        for nodes in [
            &partition.replica_nodes,
            &partition.isr_nodes,
            &partition.eligible_leader_replicas,
            &partition.last_known_elr,
            &partition.offline_replicas,
        ] {
            buf.put_compact_len(nodes.len());
            nodes.iter().for_each(|node| buf.put_i32(*node));
        }
        buf.put_u8(TAG_BUFFER);
    }
}

/// Writes the body length into the 4-byte size slot.
fn finish(mut buf: BytesMut) -> Vec<u8> {
    let size = (buf.len() - 4) as i32;
    buf[..4].copy_from_slice(&size.to_be_bytes());
    trace!(bytes = %hex::encode(&buf), "encoded response frame");
    buf.to_vec()
}
