use uuid::Uuid;

use crate::adapters::protocol::constants::{
    API_VERSIONS_KEY, API_VERSIONS_MAX_VERSION, API_VERSIONS_MIN_VERSION,
    DESCRIBE_TOPIC_PARTITIONS_KEY, DESCRIBE_TOPIC_PARTITIONS_MAX_VERSION,
    DESCRIBE_TOPIC_PARTITIONS_MIN_VERSION, NO_CURSOR,
};
use crate::adapters::protocol::dto::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersion {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
}

/// The fixed capability table advertised in every ApiVersions response.
pub const SUPPORTED_APIS: [ApiVersion; 2] = [
    ApiVersion {
        api_key: API_VERSIONS_KEY,
        min_version: API_VERSIONS_MIN_VERSION,
        max_version: API_VERSIONS_MAX_VERSION,
    },
    ApiVersion {
        api_key: DESCRIBE_TOPIC_PARTITIONS_KEY,
        min_version: DESCRIBE_TOPIC_PARTITIONS_MIN_VERSION,
        max_version: DESCRIBE_TOPIC_PARTITIONS_MAX_VERSION,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersionsResponse {
    pub error_code: i16,
    pub api_versions: Vec<ApiVersion>,
    pub throttle_time_ms: i32,
}

impl ApiVersionsResponse {
    pub fn new(error_code: i16, api_versions: Vec<ApiVersion>) -> Self {
        Self {
            error_code,
            api_versions,
            throttle_time_ms: 0,
        }
    }

    pub fn supported(error_code: ErrorCode) -> Self {
        Self::new(error_code.into(), SUPPORTED_APIS.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionResponse {
    pub error_code: i16,
    pub partition_index: i32,
    pub leader_id: i32,
    pub leader_epoch: i32,
    pub replica_nodes: Vec<i32>,
    pub isr_nodes: Vec<i32>,
    pub eligible_leader_replicas: Vec<i32>,
    pub last_known_elr: Vec<i32>,
    pub offline_replicas: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicResponse {
    pub error_code: i16,
    pub topic_name: String,
    pub topic_id: Uuid,
    pub is_internal: bool,
    pub partitions: Vec<PartitionResponse>,
    pub topic_authorized_operations: i32,
}

impl TopicResponse {
    /// Entry for a topic the metadata log does not know about.
    pub fn unknown(topic_name: impl Into<String>) -> Self {
        Self {
            error_code: ErrorCode::UnknownTopicOrPartition.into(),
            topic_name: topic_name.into(),
            topic_id: Uuid::nil(),
            is_internal: false,
            partitions: Vec::new(),
            topic_authorized_operations: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeTopicPartitionsResponse {
    pub throttle_time_ms: i32,
    pub topics: Vec<TopicResponse>,
    pub next_cursor: u8,
}

impl DescribeTopicPartitionsResponse {
    pub fn new(topics: Vec<TopicResponse>) -> Self {
        Self {
            throttle_time_ms: 0,
            topics,
            next_cursor: NO_CURSOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    ApiVersions(ApiVersionsResponse),
    DescribeTopicPartitions(DescribeTopicPartitionsResponse),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaResponse {
    pub correlation_id: i32,
    pub payload: ResponsePayload,
}

impl KafkaResponse {
    pub fn new(correlation_id: i32, payload: ResponsePayload) -> Self {
        Self {
            correlation_id,
            payload,
        }
    }
}
