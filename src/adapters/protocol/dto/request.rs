use crate::adapters::protocol::constants::{
    API_VERSIONS_KEY, API_VERSIONS_MAX_VERSION, API_VERSIONS_MIN_VERSION,
    DESCRIBE_TOPIC_PARTITIONS_KEY, DESCRIBE_TOPIC_PARTITIONS_MAX_VERSION,
    DESCRIBE_TOPIC_PARTITIONS_MIN_VERSION,
};

/// The fixed prefix every request frame starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub message_size: i32,
    pub api_key: i16,
    pub api_version: i16,
    pub correlation_id: i32,
}

impl RequestHeader {
    pub fn is_supported_version(&self) -> bool {
        match self.api_key {
            API_VERSIONS_KEY => {
                (API_VERSIONS_MIN_VERSION..=API_VERSIONS_MAX_VERSION).contains(&self.api_version)
            }
            DESCRIBE_TOPIC_PARTITIONS_KEY => (DESCRIBE_TOPIC_PARTITIONS_MIN_VERSION
                ..=DESCRIBE_TOPIC_PARTITIONS_MAX_VERSION)
                .contains(&self.api_version),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRequest {
    pub topic_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeTopicPartitionsRequest {
    pub client_id: Option<String>,
    pub topics: Vec<TopicRequest>,
    pub response_partition_limit: i32,
    pub cursor: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPayload {
    ApiVersions,
    DescribeTopicPartitions(DescribeTopicPartitionsRequest),
    /// A key we have no handler for; only the header was decoded.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaRequest {
    pub header: RequestHeader,
    pub payload: RequestPayload,
}

impl KafkaRequest {
    pub fn new(header: RequestHeader, payload: RequestPayload) -> Self {
        Self { header, payload }
    }
}
