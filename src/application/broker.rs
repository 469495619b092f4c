use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::adapters::protocol::constants::TOPIC_AUTHORIZED_OPERATIONS;
use crate::adapters::protocol::dto::{
    ApiVersionsResponse, DescribeTopicPartitionsRequest, DescribeTopicPartitionsResponse,
    ErrorCode, KafkaRequest, KafkaResponse, PartitionResponse, RequestPayload, ResponsePayload,
    TopicResponse,
};
use crate::domain::error::DomainError;
use crate::domain::metadata::{PartitionValue, TopicValue};
use crate::ports::incoming::message_handler::MessageHandler;
use crate::ports::outgoing::metadata_store::MetadataStore;
use crate::Result;

/// How the topics of a DescribeTopicPartitions request are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TopicLookup {
    /// Only the first requested topic found in the store is answered as
    /// known; every other topic is reported unknown.
    #[default]
    FirstMatchOnly,
    /// Every requested topic is looked up on its own, partitions included.
    PerTopic,
}

impl FromStr for TopicLookup {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "first-match" => Ok(Self::FirstMatchOnly),
            "per-topic" => Ok(Self::PerTopic),
            other => Err(format!(
                "unknown topic lookup '{}', expected first-match or per-topic",
                other
            )),
        }
    }
}

pub struct KafkaBroker {
    metadata_store: Arc<dyn MetadataStore>,
    topic_lookup: TopicLookup,
}

impl KafkaBroker {
    pub fn new(metadata_store: Arc<dyn MetadataStore>) -> Self {
        Self::with_topic_lookup(metadata_store, TopicLookup::default())
    }

    pub fn with_topic_lookup(metadata_store: Arc<dyn MetadataStore>, topic_lookup: TopicLookup) -> Self {
        Self {
            metadata_store,
            topic_lookup,
        }
    }

    fn handle_api_versions(&self, request: &KafkaRequest) -> KafkaResponse {
        let error_code = if request.header.is_supported_version() {
            ErrorCode::None
        } else {
            info!(
                api_version = request.header.api_version,
                correlation_id = request.header.correlation_id,
                "unsupported ApiVersions version"
            );
            ErrorCode::UnsupportedVersion
        };

        KafkaResponse::new(
            request.header.correlation_id,
            ResponsePayload::ApiVersions(ApiVersionsResponse::supported(error_code)),
        )
    }

    fn handle_describe_topic_partitions(
        &self,
        request: &KafkaRequest,
        describe_request: &DescribeTopicPartitionsRequest,
    ) -> KafkaResponse {
        let topics = match self.topic_lookup {
            TopicLookup::FirstMatchOnly => self.describe_first_match(describe_request),
            TopicLookup::PerTopic => self.describe_each_topic(describe_request),
        };

        debug!(
            correlation_id = request.header.correlation_id,
            requested = describe_request.topics.len(),
            found = topics.iter().filter(|t| t.error_code == 0).count(),
            "described topics"
        );

        KafkaResponse::new(
            request.header.correlation_id,
            ResponsePayload::DescribeTopicPartitions(DescribeTopicPartitionsResponse::new(topics)),
        )
    }

    fn describe_first_match(&self, request: &DescribeTopicPartitionsRequest) -> Vec<TopicResponse> {
        let mut matched = false;
        request
            .topics
            .iter()
            .map(|topic| {
                let found = if matched {
                    None
                } else {
                    self.metadata_store.find_topic_by_name(&topic.topic_name)
                };
                match found {
                    Some(value) => {
                        matched = true;
                        known_topic(value, Vec::new())
                    }
                    None => TopicResponse::unknown(topic.topic_name.as_str()),
                }
            })
            .collect()
    }

    fn describe_each_topic(&self, request: &DescribeTopicPartitionsRequest) -> Vec<TopicResponse> {
        let limit = usize::try_from(request.response_partition_limit)
            .ok()
            .filter(|limit| *limit > 0)
            .unwrap_or(usize::MAX);

        request
            .topics
            .iter()
            .map(|topic| match self.metadata_store.find_topic_by_name(&topic.topic_name) {
                Some(value) => {
                    let partitions = self
                        .metadata_store
                        .partitions_for_topic(&value.topic_id)
                        .into_iter()
                        .take(limit)
                        .map(partition_response)
                        .collect();
                    known_topic(value, partitions)
                }
                None => TopicResponse::unknown(topic.topic_name.as_str()),
            })
            .collect()
    }
}

fn known_topic(value: &TopicValue, partitions: Vec<PartitionResponse>) -> TopicResponse {
    TopicResponse {
        error_code: ErrorCode::None.into(),
        topic_name: value.topic_name.clone(),
        topic_id: value.topic_id,
        is_internal: false,
        partitions,
        topic_authorized_operations: TOPIC_AUTHORIZED_OPERATIONS,
    }
}

fn partition_response(partition: &PartitionValue) -> PartitionResponse {
    PartitionResponse {
        error_code: ErrorCode::None.into(),
        partition_index: partition.partition_id,
        leader_id: partition.leader_id,
        leader_epoch: partition.leader_epoch,
        replica_nodes: partition.replicas.clone(),
        isr_nodes: partition.in_sync_replicas.clone(),
        eligible_leader_replicas: Vec::new(),
        last_known_elr: Vec::new(),
        offline_replicas: Vec::new(),
    }
}

#[async_trait]
impl MessageHandler for KafkaBroker {
    async fn handle_request(&self, request: KafkaRequest) -> Result<KafkaResponse> {
        match &request.payload {
            RequestPayload::ApiVersions => Ok(self.handle_api_versions(&request)),
            RequestPayload::DescribeTopicPartitions(describe_request) => {
                Ok(self.handle_describe_topic_partitions(&request, describe_request))
            }
            RequestPayload::Unsupported => {
                Err(DomainError::UnsupportedApiKey(request.header.api_key).into())
            }
        }
    }
}
